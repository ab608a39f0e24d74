//! Error types for the optimization engine.

use thiserror::Error;

use alsvid_exec::ExecError;

/// Errors that can occur in the optimization engine.
#[derive(Debug, Error)]
pub enum VqeError {
    /// Invalid run configuration. Detected eagerly, never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// The checkpoint log could not be parsed back into a run state.
    #[error("malformed checkpoint log: {0}")]
    Checkpoint(String),

    /// Checkpoint file I/O failed.
    #[error("checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote executor gave up. Fatal; the run terminates with the
    /// last good checkpoint intact.
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Result type for engine operations.
pub type VqeResult<T> = Result<T, VqeError>;
