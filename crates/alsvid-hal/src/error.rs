//! Error types for the HAL crate.

use thiserror::Error;

/// Errors that can occur in estimator-service operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Session could not be opened or closed.
    #[error("Session failed: {0}")]
    SessionFailed(String),

    /// Job creation failed.
    #[error("Job creation failed: {0}")]
    SubmissionFailed(String),

    /// Job execution failed on the service side.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Job was cancelled.
    #[error("Job cancelled")]
    JobCancelled,

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Result requested before the job reached `Done`.
    #[error("Result not available for job {0}")]
    ResultUnavailable(String),

    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout waiting for job.
    #[error("Timeout waiting for job {0}")]
    Timeout(String),

    /// Generic service error.
    #[error("Service error: {0}")]
    Service(String),
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;
