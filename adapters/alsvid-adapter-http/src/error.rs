//! Error types for the HTTP estimator adapter.

use thiserror::Error;

/// Result type for HTTP adapter operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Errors that can occur when talking to the estimation service.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Missing API token.
    #[error("estimation service token not found. Set the ALSVID_TOKEN environment variable.")]
    MissingToken,

    /// Token could not be encoded into a header.
    #[error("Invalid estimation service token")]
    InvalidToken,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned an error body.
    #[error("estimation service error: {message}")]
    Api {
        /// Error code from the service, if any.
        code: Option<String>,
        /// Error message.
        message: String,
    },

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Session not found.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<HttpError> for alsvid_hal::HalError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::MissingToken | HttpError::InvalidToken => {
                alsvid_hal::HalError::AuthenticationFailed(e.to_string())
            }
            HttpError::JobNotFound(id) => alsvid_hal::HalError::JobNotFound(id),
            HttpError::SessionNotFound(id) => {
                alsvid_hal::HalError::SessionFailed(format!("session not found: {id}"))
            }
            HttpError::Http(e) => alsvid_hal::HalError::Network(e),
            HttpError::Json(e) => alsvid_hal::HalError::Serialization(e),
            HttpError::Api { .. } => alsvid_hal::HalError::Service(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvid_hal::HalError;

    #[test]
    fn test_missing_token_display() {
        assert!(HttpError::MissingToken.to_string().contains("ALSVID_TOKEN"));
    }

    #[test]
    fn test_api_error_display() {
        let err = HttpError::Api {
            code: Some("ERR_503".into()),
            message: "backend offline".into(),
        };
        assert!(err.to_string().contains("backend offline"));
    }

    #[test]
    fn test_missing_token_maps_to_auth_failed() {
        let hal: HalError = HttpError::MissingToken.into();
        assert!(matches!(hal, HalError::AuthenticationFailed(_)));
    }

    #[test]
    fn test_job_not_found_maps_through() {
        let hal: HalError = HttpError::JobNotFound("j1".into()).into();
        assert!(matches!(hal, HalError::JobNotFound(id) if id == "j1"));
    }

    #[test]
    fn test_session_not_found_maps_to_session_failed() {
        let hal: HalError = HttpError::SessionNotFound("s1".into()).into();
        assert!(matches!(hal, HalError::SessionFailed(_)));
    }

    #[test]
    fn test_api_error_maps_to_service() {
        let hal: HalError = HttpError::Api {
            code: None,
            message: "boom".into(),
        }
        .into();
        assert!(matches!(hal, HalError::Service(_)));
    }
}
