//! Estimator-service traits.
//!
//! The [`EstimatorService`] / [`EstimatorSession`] pair defines the
//! lifecycle for interacting with a remote batch-evaluation service:
//!
//! ```text
//!   open_session() ──→ create_job() ──→ status() ──→ result()
//!      (async)            (async)        (async)      (async)
//! ```
//!
//! ## Design principles
//!
//! - **Async-native**: all I/O methods are async.
//! - **Thread-safe**: `Send + Sync` bounds enable shared ownership.
//! - **Sessions are disposable**: after a connection loss, the executor
//!   closes the session and opens a fresh one; no two sessions are in
//!   flight at once.
//! - **Minimal**: only the methods needed for the job lifecycle.
//!
//! ## Method table
//!
//! | Method | On | Returns |
//! |--------|----|---------|
//! | `open_session()` | service | `HalResult<Box<dyn EstimatorSession>>` |
//! | `id()` | session | `&str` |
//! | `create_job()` | session | `HalResult<JobId>` |
//! | `status()` | session | `HalResult<JobStatus>` |
//! | `result()` | session | `HalResult<Vec<f64>>` |
//! | `cancel()` | session | `HalResult<()>` |
//! | `close()` | session | `HalResult<()>` (provided, no-op) |

use async_trait::async_trait;

use crate::batch::EvaluationBatch;
use crate::error::HalResult;
use crate::job::{JobId, JobStatus};

/// One open connection context to the evaluation service.
///
/// # Contract
///
/// - `create_job()` MUST return a job whose initial status is pending
///   (`Initializing`, `Queued` or `Validating`).
/// - `result()` MUST only be called when `status()` has returned `Done`,
///   and MUST return exactly one scalar per batch entry, in entry order.
/// - `cancel()` on a job already in a terminal state is a no-op.
/// - After `close()` the session MUST not be used again.
#[async_trait]
pub trait EstimatorSession: Send + Sync {
    /// Identifier of this session, for logging.
    fn id(&self) -> &str;

    /// Submit a batch for execution.
    async fn create_job(&self, batch: &EvaluationBatch) -> HalResult<JobId>;

    /// Get the status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Get the results of a completed job.
    async fn result(&self, job_id: &JobId) -> HalResult<Vec<f64>>;

    /// Cancel a job that has not reached a terminal state.
    async fn cancel(&self, job_id: &JobId) -> HalResult<()>;

    /// Release the session on the service side.
    async fn close(&self) -> HalResult<()> {
        Ok(())
    }
}

/// Factory for sessions against one concrete evaluation service.
#[async_trait]
pub trait EstimatorService: Send + Sync {
    /// Open a fresh session.
    ///
    /// Called once at startup and again after every failed attempt, so
    /// implementations MUST hand out a context that does not share
    /// connection state with previously opened sessions.
    async fn open_session(&self) -> HalResult<Box<dyn EstimatorSession>>;
}
