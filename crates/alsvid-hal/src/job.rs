//! Job lifecycle types.
//!
//! The job state machine:
//!
//! ```text
//!   create_job() ──→ Initializing ──→ Queued ──→ Validating ──→ Running ──→ Done
//!                         │              │            │            │
//!                         │              │            │            ├──→ Error(reason)
//!                         │              │            │            │
//!                         └──────────────┴────────────┴────────────┴──→ Cancelled
//! ```
//!
//! **Invariants:**
//! - Transitions are monotonic — a job never moves backward.
//! - Terminal states (`Done`, `Error`, `Cancelled`) are permanent.
//! - `result()` is only valid when status is `Done`.

use serde::{Deserialize, Serialize};

/// Unique identifier for a batch-evaluation job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new job ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Status of a batch-evaluation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Job record is being created on the service side.
    Initializing,
    /// Job is waiting in queue.
    Queued,
    /// Inputs are being validated.
    Validating,
    /// Job is currently running.
    Running,
    /// Job completed successfully; results are available.
    Done,
    /// Job failed with an error message.
    Error(String),
    /// Job was cancelled.
    Cancelled,
}

impl JobStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Done | JobStatus::Error(_) | JobStatus::Cancelled
        )
    }

    /// Check if the job has not started executing yet.
    ///
    /// These are the states polled on a fixed interval before the
    /// wall-clock deadline is armed.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            JobStatus::Initializing | JobStatus::Queued | JobStatus::Validating
        )
    }

    /// Check if the job completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Done)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Initializing => write!(f, "Initializing"),
            JobStatus::Queued => write!(f, "Queued"),
            JobStatus::Validating => write!(f, "Validating"),
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Done => write!(f, "Done"),
            JobStatus::Error(msg) => write!(f, "Error: {msg}"),
            JobStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}
