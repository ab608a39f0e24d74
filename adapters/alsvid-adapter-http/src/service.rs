//! [`EstimatorService`] implementation over the REST client.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use alsvid_hal::{
    EstimatorService, EstimatorSession, EvaluationBatch, HalError, HalResult, JobId, JobStatus,
};

use crate::api::EstimClient;
use crate::error::{HttpError, HttpResult};

/// HTTP-backed estimator service.
///
/// Every [`open_session`](EstimatorService::open_session) call creates a
/// fresh session on the service side; the executor relies on this to
/// recover from connection losses.
pub struct HttpEstimatorService {
    client: Arc<EstimClient>,
}

impl HttpEstimatorService {
    /// Build a service from an endpoint and bearer token.
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> HttpResult<Self> {
        Ok(Self {
            client: Arc::new(EstimClient::new(endpoint, token)?),
        })
    }

    /// Build a service reading the token from `ALSVID_TOKEN`.
    pub fn from_env(endpoint: impl Into<String>) -> HttpResult<Self> {
        let token = std::env::var("ALSVID_TOKEN").map_err(|_| HttpError::MissingToken)?;
        Self::new(endpoint, token)
    }
}

#[async_trait]
impl EstimatorService for HttpEstimatorService {
    async fn open_session(&self) -> HalResult<Box<dyn EstimatorSession>> {
        let session = self
            .client
            .create_session()
            .await
            .map_err(|e| HalError::SessionFailed(e.to_string()))?;
        info!(session = %session.id, endpoint = self.client.endpoint(), "opened estimation session");

        Ok(Box::new(HttpSession {
            id: session.id,
            client: self.client.clone(),
        }))
    }
}

/// One open session on the estimation service.
struct HttpSession {
    id: String,
    client: Arc<EstimClient>,
}

#[async_trait]
impl EstimatorSession for HttpSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn create_job(&self, batch: &EvaluationBatch) -> HalResult<JobId> {
        let response = self
            .client
            .submit_job(&self.id, batch)
            .await
            .map_err(|e| HalError::SubmissionFailed(e.to_string()))?;
        Ok(JobId(response.id))
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let response = self
            .client
            .job_status(&job_id.0)
            .await
            .map_err(|e| match e {
                HttpError::JobNotFound(id) => HalError::JobNotFound(id),
                other => HalError::Service(other.to_string()),
            })?;

        let status = match response.normalized_status().as_str() {
            "INITIALIZING" => JobStatus::Initializing,
            "QUEUED" => JobStatus::Queued,
            "VALIDATING" => JobStatus::Validating,
            "RUNNING" => JobStatus::Running,
            "DONE" | "COMPLETED" => JobStatus::Done,
            "ERROR" | "FAILED" => JobStatus::Error(
                response
                    .reason
                    .unwrap_or_else(|| "unknown error".to_string()),
            ),
            "CANCELLED" => JobStatus::Cancelled,
            // Unknown states count as running: the deadline still bounds
            // the wait.
            _ => JobStatus::Running,
        };

        Ok(status)
    }

    async fn result(&self, job_id: &JobId) -> HalResult<Vec<f64>> {
        let response = self
            .client
            .job_results(&job_id.0)
            .await
            .map_err(|e| match e {
                HttpError::JobNotFound(id) => HalError::JobNotFound(id),
                other => HalError::Service(other.to_string()),
            })?;
        Ok(response.values)
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        self.client
            .cancel_job(&job_id.0)
            .await
            .map_err(|e| HalError::Service(e.to_string()))
    }

    async fn close(&self) -> HalResult<()> {
        self.client
            .close_session(&self.id)
            .await
            .map_err(|e| HalError::SessionFailed(e.to_string()))
    }
}
