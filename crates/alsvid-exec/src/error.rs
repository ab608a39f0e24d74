//! Error types for the executor crate.

use thiserror::Error;

/// Errors surfaced to the optimization loop.
///
/// Transient service failures are handled inside the retry loop and never
/// appear here; the caller only ever sees the two fatal conditions.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The initial estimator session could not be opened.
    #[error("estimator session could not be opened: {0}")]
    Session(String),

    /// Every allowed attempt failed.
    ///
    /// The caller must not receive partial or stale results; the only safe
    /// reaction is to abort the run (the checkpoint log stays resumable).
    #[error("estimation failed after {attempts} attempts; last failure: {last}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Classified description of the last failure.
        last: String,
    },
}

/// Result type for executor operations.
pub type ExecResult<T> = Result<T, ExecError>;
