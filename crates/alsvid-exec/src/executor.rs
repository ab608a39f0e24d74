//! Retry-resilient batch execution.
//!
//! [`RetryExecutor`] wraps an [`EstimatorService`] and makes one guarantee
//! to the optimization loop: `run()` either returns one finite scalar per
//! batch entry, in entry order, or fails fatally after a bounded number of
//! attempts. Everything in between — job-creation failures, execution
//! errors, stalled jobs, lost connections — is absorbed here.
//!
//! The attempt lifecycle:
//!
//! ```text
//!   create_job ──→ poll while pending ──→ arm deadline ──→ result
//!       │                 │                    │
//!       │ creation        │ execution          │ timeout
//!       ▼                 ▼                    ▼
//!   cancel job if non-terminal, open a fresh session, try again
//! ```
//!
//! The deadline is a `tokio::time::timeout` owned by this instance — not
//! process-wide signal state — so multiple executors can coexist and the
//! deadline can fire at any point of the blocking result wait.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use alsvid_hal::{EstimatorService, EstimatorSession, EvaluationBatch, JobId, JobStatus};

use crate::error::{ExecError, ExecResult};
use crate::failure::AttemptFailure;

/// Default wall-clock deadline for the result wait.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Default number of consecutive attempts before giving up.
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default sleep between status polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Executor tuning knobs.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Wall-clock deadline armed once a job leaves the pending states.
    pub timeout: Duration,
    /// Maximum number of consecutive submission attempts.
    pub max_retries: u32,
    /// Sleep between status polls.
    pub poll_interval: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ExecutorConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the result-wait deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of attempts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Retry-hardened client for a remote batch-evaluation service.
pub struct RetryExecutor {
    service: Arc<dyn EstimatorService>,
    session: Box<dyn EstimatorSession>,
    config: ExecutorConfig,
}

impl RetryExecutor {
    /// Open the initial session and build the executor.
    pub async fn connect(
        service: Arc<dyn EstimatorService>,
        config: ExecutorConfig,
    ) -> ExecResult<Self> {
        let session = service
            .open_session()
            .await
            .map_err(|e| ExecError::Session(e.to_string()))?;
        info!(session = session.id(), "opened estimator session");

        Ok(Self {
            service,
            session,
            config,
        })
    }

    /// Get the executor configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run one batch to completion.
    ///
    /// Returns the ordered scalar results, one per batch entry. Retries up
    /// to `max_retries` consecutive attempts, opening a fresh session
    /// before each retry; exhausting them is fatal and yields
    /// [`ExecError::RetriesExhausted`].
    pub async fn run(&mut self, batch: &EvaluationBatch) -> ExecResult<Vec<f64>> {
        let max_retries = self.config.max_retries;
        let mut last: Option<AttemptFailure> = None;

        for attempt in 1..=max_retries {
            if attempt > 1 {
                // A fresh session is required in particular after a
                // connection loss that prevented job creation; the old one
                // is closed best-effort and fully replaced.
                if let Err(e) = self.session.close().await {
                    debug!(error = %e, "closing previous session failed");
                }
                match self.service.open_session().await {
                    Ok(session) => {
                        info!(session = session.id(), attempt, "opened new estimator session");
                        self.session = session;
                    }
                    Err(e) => {
                        warn!(attempt, max_retries, error = %e, "failed to open new session");
                        last = Some(AttemptFailure::creation(format!("session open: {e}")));
                        continue;
                    }
                }
            }

            match self.attempt(batch, attempt).await {
                Ok(values) => return Ok(values),
                Err(failure) => {
                    warn!(attempt, max_retries, kind = %failure.kind, "attempt failed: {failure}");
                    self.reap(&failure).await;
                    last = Some(failure);
                }
            }
        }

        Err(ExecError::RetriesExhausted {
            attempts: max_retries,
            last: last.map_or_else(|| "no attempts were made".to_string(), |f| f.to_string()),
        })
    }

    /// One full submission attempt: create, poll, wait under deadline,
    /// validate.
    async fn attempt(
        &self,
        batch: &EvaluationBatch,
        attempt: u32,
    ) -> Result<Vec<f64>, AttemptFailure> {
        let job_id = self
            .session
            .create_job(batch)
            .await
            .map_err(|e| AttemptFailure::creation(e.to_string()))?;

        // Poll on a fixed interval while the job has not started executing.
        // No deadline is armed yet; queue time is not bounded.
        loop {
            let status = self
                .session
                .status(&job_id)
                .await
                .map_err(|e| AttemptFailure::execution(e.to_string()).with_job(job_id.clone()))?;
            if !status.is_pending() {
                break;
            }
            debug!(
                attempt,
                max_retries = self.config.max_retries,
                job = %job_id,
                status = %status,
                "waiting for job to start",
            );
            sleep(self.config.poll_interval).await;
        }

        // The job is running (or already terminal): arm the deadline.
        let values = match timeout(self.config.timeout, self.wait_values(&job_id)).await {
            Ok(Ok(values)) => values,
            Ok(Err(failure)) => return Err(failure),
            Err(_) => {
                return Err(AttemptFailure::timeout(format!(
                    "no result within {:?}",
                    self.config.timeout
                ))
                .with_job(job_id));
            }
        };

        if values.len() != batch.len() {
            return Err(AttemptFailure::execution(format!(
                "expected {} result values, got {}",
                batch.len(),
                values.len()
            ))
            .with_job(job_id));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(
                AttemptFailure::execution(format!("non-finite result value {bad}"))
                    .with_job(job_id),
            );
        }

        Ok(values)
    }

    /// Wait for a terminal status and fetch the values. The caller arms
    /// the deadline around this future.
    async fn wait_values(&self, job_id: &JobId) -> Result<Vec<f64>, AttemptFailure> {
        loop {
            let status = self
                .session
                .status(job_id)
                .await
                .map_err(|e| AttemptFailure::execution(e.to_string()).with_job(job_id.clone()))?;

            match status {
                JobStatus::Done => {
                    return self.session.result(job_id).await.map_err(|e| {
                        AttemptFailure::execution(e.to_string()).with_job(job_id.clone())
                    });
                }
                JobStatus::Error(msg) => {
                    return Err(AttemptFailure::execution(msg).with_job(job_id.clone()));
                }
                JobStatus::Cancelled => {
                    return Err(AttemptFailure::execution("job was cancelled externally")
                        .with_job(job_id.clone()));
                }
                _ => sleep(self.config.poll_interval).await,
            }
        }
    }

    /// Best-effort cancellation of a failed attempt's job, if it is still
    /// in a non-terminal state. Never affects the retry outcome.
    async fn reap(&self, failure: &AttemptFailure) {
        let Some(job_id) = &failure.job else {
            return;
        };
        match self.session.status(job_id).await {
            Ok(status) if !status.is_terminal() => match self.session.cancel(job_id).await {
                Ok(()) => info!(job = %job_id, "cancelled job after failed attempt"),
                Err(e) => warn!(job = %job_id, error = %e, "failed to cancel job"),
            },
            Ok(status) => debug!(job = %job_id, status = %status, "job already terminal"),
            Err(e) => debug!(job = %job_id, error = %e, "could not query job for cleanup"),
        }
    }
}
