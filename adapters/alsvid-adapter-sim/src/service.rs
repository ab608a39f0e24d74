//! In-process estimator service.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use alsvid_hal::{
    EstimatorService, EstimatorSession, EvalUnit, EvaluationBatch, HalError, HalResult, JobId,
    JobStatus,
};

/// Scalar model evaluated for each (unit, parameter-vector) pair.
pub type Model = Arc<dyn Fn(&EvalUnit, &[f64]) -> f64 + Send + Sync>;

/// Deterministic fault injection, applied in job-creation order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultPlan {
    /// The first `failing_creations` job creations fail before a job
    /// record exists.
    pub failing_creations: u32,
    /// The next `failing_executions` jobs reach `Error` instead of `Done`.
    pub failing_executions: u32,
    /// Every job answers this many status polls with `Queued` before it
    /// progresses.
    pub queued_polls: u32,
}

/// In-process [`EstimatorService`] backed by a caller-supplied model.
///
/// Values are computed synchronously at job creation; the job lifecycle
/// (queue polls, failures) is scripted through a [`FaultPlan`]. The
/// service is a cheap handle — clones share job state and the session and
/// creation counters, which makes retry behavior observable in tests.
#[derive(Clone)]
pub struct SimEstimatorService {
    inner: Arc<Inner>,
}

struct Inner {
    model: Model,
    faults: FaultPlan,
    jobs: Mutex<HashMap<String, SimJob>>,
    creations: AtomicU32,
    sessions: AtomicU32,
}

struct SimJob {
    values: Vec<f64>,
    status: JobStatus,
    queued_polls_left: u32,
    failing: bool,
}

impl SimEstimatorService {
    /// Create a fault-free service over `model`.
    pub fn new(model: impl Fn(&EvalUnit, &[f64]) -> f64 + Send + Sync + 'static) -> Self {
        Self::faulty(model, FaultPlan::default())
    }

    /// Create a service with scripted fault injection.
    pub fn faulty(
        model: impl Fn(&EvalUnit, &[f64]) -> f64 + Send + Sync + 'static,
        faults: FaultPlan,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                model: Arc::new(model),
                faults,
                jobs: Mutex::new(HashMap::new()),
                creations: AtomicU32::new(0),
                sessions: AtomicU32::new(0),
            }),
        }
    }

    /// Number of sessions opened so far.
    pub fn sessions_opened(&self) -> u32 {
        self.inner.sessions.load(Ordering::SeqCst)
    }

    /// Number of job creations attempted so far.
    pub fn jobs_created(&self) -> u32 {
        self.inner.creations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EstimatorService for SimEstimatorService {
    async fn open_session(&self) -> HalResult<Box<dyn EstimatorSession>> {
        let n = self.inner.sessions.fetch_add(1, Ordering::SeqCst);
        debug!(session = n, "opened simulator session");
        Ok(Box::new(SimSession {
            id: format!("sim-session-{n}"),
            inner: self.inner.clone(),
        }))
    }
}

struct SimSession {
    id: String,
    inner: Arc<Inner>,
}

#[async_trait]
impl EstimatorSession for SimSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn create_job(&self, batch: &EvaluationBatch) -> HalResult<JobId> {
        let inner = &self.inner;
        let n = inner.creations.fetch_add(1, Ordering::SeqCst);
        let faults = inner.faults;

        if n < faults.failing_creations {
            return Err(HalError::SubmissionFailed(
                "simulated connection loss".into(),
            ));
        }
        let failing = n < faults.failing_creations + faults.failing_executions;

        let values = batch
            .entries
            .iter()
            .map(|entry| (inner.model)(&entry.unit, &entry.parameters))
            .collect();

        let job_id = Uuid::new_v4().to_string();
        inner.jobs.lock().unwrap().insert(
            job_id.clone(),
            SimJob {
                values,
                status: JobStatus::Initializing,
                queued_polls_left: faults.queued_polls,
                failing,
            },
        );
        debug!(job = %job_id, entries = batch.len(), failing, "created simulator job");
        Ok(JobId::new(job_id))
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let mut jobs = self.inner.jobs.lock().unwrap();
        let job = jobs
            .get_mut(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;

        if job.status.is_terminal() {
            return Ok(job.status.clone());
        }
        if job.queued_polls_left > 0 {
            job.queued_polls_left -= 1;
            job.status = JobStatus::Queued;
        } else if job.failing {
            job.status = JobStatus::Error("simulated execution fault".into());
        } else {
            job.status = JobStatus::Done;
        }
        Ok(job.status.clone())
    }

    async fn result(&self, job_id: &JobId) -> HalResult<Vec<f64>> {
        let jobs = self.inner.jobs.lock().unwrap();
        let job = jobs
            .get(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        if !job.status.is_success() {
            return Err(HalError::ResultUnavailable(job_id.0.clone()));
        }
        Ok(job.values.clone())
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = self.inner.jobs.lock().unwrap();
        let job = jobs
            .get_mut(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        if !job.status.is_terminal() {
            job.status = JobStatus::Cancelled;
        }
        Ok(())
    }
}
