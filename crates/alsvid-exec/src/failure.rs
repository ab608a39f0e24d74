//! Per-attempt failure classification.
//!
//! Retry decisions dispatch on an enumerated failure kind, not on error
//! type introspection. Every failed attempt is folded into one
//! [`AttemptFailure`] carrying the kind, the job handle (when a job was
//! created before things went wrong) and a human-readable message.

use alsvid_hal::JobId;

/// What went wrong during one submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The job could not be created (connection loss between the service
    /// and the execution backend, rejected request, failed session open).
    Creation,
    /// The job was created but execution failed, was cancelled externally,
    /// or produced an unusable result (wrong length, non-finite values).
    Execution,
    /// The job left the queue but no result arrived before the wall-clock
    /// deadline.
    Timeout,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Creation => write!(f, "creation-failure"),
            FailureKind::Execution => write!(f, "execution-error"),
            FailureKind::Timeout => write!(f, "timeout"),
        }
    }
}

/// One classified attempt failure.
#[derive(Debug, Clone)]
pub struct AttemptFailure {
    /// Failure class driving the retry handling.
    pub kind: FailureKind,
    /// The job created during this attempt, if one exists. Used for
    /// best-effort cancellation of non-terminal jobs.
    pub job: Option<JobId>,
    /// Human-readable detail.
    pub message: String,
}

impl AttemptFailure {
    /// A job-creation failure (no job handle exists).
    pub fn creation(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Creation,
            job: None,
            message: message.into(),
        }
    }

    /// An execution failure.
    pub fn execution(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Execution,
            job: None,
            message: message.into(),
        }
    }

    /// A deadline expiry.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Timeout,
            job: None,
            message: message.into(),
        }
    }

    /// Attach the job handle created during the attempt.
    pub fn with_job(mut self, job: JobId) -> Self {
        self.job = Some(job);
        self
    }
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.job {
            Some(job) => write!(f, "{} (job {}): {}", self.kind, job, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}
