//! REST client for the batch-estimation service.
//!
//! The service exposes a session-scoped job API:
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | POST | `/v1/sessions` | open a session |
//! | DELETE | `/v1/sessions/{id}` | close a session |
//! | POST | `/v1/jobs` | submit a batch |
//! | GET | `/v1/jobs/{id}` | poll status |
//! | GET | `/v1/jobs/{id}/results` | fetch scalar results |
//! | POST | `/v1/jobs/{id}/cancel` | cancel a job |

use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use std::fmt;

use alsvid_hal::{BatchEntry, EvaluationBatch, Observable};

use crate::error::{HttpError, HttpResult};

/// User-Agent sent with requests.
const USER_AGENT: &str = "alsvid/0.4.1 (vqe-engine; +https://github.com/hiq-lab/alsvid)";

/// Estimation service REST client.
pub struct EstimClient {
    /// HTTP client with bearer auth baked into the default headers.
    client: Client,
    /// Service endpoint URL.
    endpoint: String,
}

impl fmt::Debug for EstimClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EstimClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl EstimClient {
    /// Create a client for `endpoint`, authenticating with a bearer token.
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> HttpResult<Self> {
        let token = token.into();

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| HttpError::InvalidToken)?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(60))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Service endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Open a new session.
    pub async fn create_session(&self) -> HttpResult<SessionResponse> {
        let url = format!("{}/v1/sessions", self.endpoint);

        let response = self.client.post(&url).send().await?;

        if !response.status().is_success() {
            return Err(api_error(response, "session creation failed").await);
        }

        Ok(response.json().await?)
    }

    /// Close a session. Idempotent on the service side.
    pub async fn close_session(&self, session_id: &str) -> HttpResult<()> {
        let url = format!("{}/v1/sessions/{}", self.endpoint, session_id);

        let response = self.client.delete(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(HttpError::SessionNotFound(session_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(api_error(response, "session close failed").await);
        }

        Ok(())
    }

    /// Submit a batch job under a session.
    pub async fn submit_job(
        &self,
        session_id: &str,
        batch: &EvaluationBatch,
    ) -> HttpResult<SubmitResponse> {
        let url = format!("{}/v1/jobs", self.endpoint);

        let body = JobRequest {
            session_id: session_id.to_string(),
            observable: batch.observable.clone(),
            entries: batch.entries.clone(),
        };

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(api_error(response, "job submission failed").await);
        }

        Ok(response.json().await?)
    }

    /// Get job status.
    pub async fn job_status(&self, job_id: &str) -> HttpResult<JobStatusResponse> {
        let url = format!("{}/v1/jobs/{}", self.endpoint, job_id);

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(HttpError::JobNotFound(job_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(api_error(response, "status query failed").await);
        }

        Ok(response.json().await?)
    }

    /// Get job results.
    pub async fn job_results(&self, job_id: &str) -> HttpResult<JobResultsResponse> {
        let url = format!("{}/v1/jobs/{}/results", self.endpoint, job_id);

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(HttpError::JobNotFound(job_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(api_error(response, "results query failed").await);
        }

        Ok(response.json().await?)
    }

    /// Cancel a job.
    pub async fn cancel_job(&self, job_id: &str) -> HttpResult<()> {
        let url = format!("{}/v1/jobs/{}/cancel", self.endpoint, job_id);

        let response = self.client.post(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(HttpError::JobNotFound(job_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(api_error(response, "cancel failed").await);
        }

        Ok(())
    }
}

/// Fold a non-success response into an API error, keeping the body text.
async fn api_error(response: reqwest::Response, context: &str) -> HttpError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "no body".to_string());
    match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(error) => HttpError::Api {
            code: error.code,
            message: format!("{context}: {}", error.message),
        },
        Err(_) => HttpError::Api {
            code: None,
            message: format!("{context}: {status}: {body}"),
        },
    }
}

// ============================================================================
// Request types
// ============================================================================

/// Batch job submission request.
#[derive(Debug, Serialize)]
struct JobRequest {
    /// Session the job runs under.
    session_id: String,
    /// The objective operator, shared by every entry.
    observable: Observable,
    /// (unit, parameter-vector) pairs in evaluation order.
    entries: Vec<BatchEntry>,
}

// ============================================================================
// Response types
// ============================================================================

/// API error response body.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    /// Error code.
    #[serde(default)]
    code: Option<String>,
    /// Error message.
    #[serde(default)]
    message: String,
}

/// Session creation response.
#[derive(Debug, Deserialize)]
pub struct SessionResponse {
    /// Session ID.
    pub id: String,
}

/// Job submission response.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Job ID.
    pub id: String,
    /// Initial job status.
    #[serde(default)]
    pub status: String,
}

/// Job status response.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    /// Job ID.
    pub id: String,
    /// Job status string; compared case-insensitively.
    pub status: String,
    /// Failure reason, present when status is an error state.
    #[serde(default)]
    pub reason: Option<String>,
}

impl JobStatusResponse {
    /// Normalized uppercase status for comparison.
    pub fn normalized_status(&self) -> String {
        self.status.to_uppercase()
    }
}

/// Job results response.
#[derive(Debug, Deserialize)]
pub struct JobResultsResponse {
    /// One scalar per batch entry, in entry order.
    pub values: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvid_hal::EvalUnit;

    #[test]
    fn test_client_redacts_token_in_debug() {
        let client = EstimClient::new("https://estim.example.com", "secret").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_job_request_serialization() {
        let mut batch = EvaluationBatch::new(Observable::new("heisenberg"));
        batch.push(
            EvalUnit::new("rot0-m1").with_payload(serde_json::json!({"fold": 0})),
            vec![0.5, 1.0],
        );

        let request = JobRequest {
            session_id: "s-1".into(),
            observable: batch.observable.clone(),
            entries: batch.entries.clone(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["session_id"], "s-1");
        assert_eq!(json["observable"]["id"], "heisenberg");
        assert_eq!(json["entries"][0]["unit"]["id"], "rot0-m1");
        assert_eq!(json["entries"][0]["parameters"][1], 1.0);
    }

    #[test]
    fn test_session_response_deserialization() {
        let resp: SessionResponse = serde_json::from_str(r#"{"id": "s-42"}"#).unwrap();
        assert_eq!(resp.id, "s-42");
    }

    #[test]
    fn test_status_response_deserialization() {
        let json = r#"{"id": "j-1", "status": "Running"}"#;
        let resp: JobStatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.normalized_status(), "RUNNING");
        assert!(resp.reason.is_none());

        let json = r#"{"id": "j-1", "status": "ERROR", "reason": "device fault"}"#;
        let resp: JobStatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.normalized_status(), "ERROR");
        assert_eq!(resp.reason.as_deref(), Some("device fault"));
    }

    #[test]
    fn test_results_response_deserialization() {
        let json = r#"{"values": [-13.25, -13.5, 0.0]}"#;
        let resp: JobResultsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.values, vec![-13.25, -13.5, 0.0]);
    }

    #[test]
    fn test_error_response_deserialization() {
        let json = r#"{"code": "ERR_429", "message": "too many jobs"}"#;
        let resp: ApiErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.code.as_deref(), Some("ERR_429"));
        assert_eq!(resp.message, "too many jobs");
    }
}
