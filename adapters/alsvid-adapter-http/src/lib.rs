//! Alsvid HTTP estimator adapter
//!
//! Implements `alsvid-hal`'s [`EstimatorService`](alsvid_hal::EstimatorService)
//! against a REST batch-estimation API: sessions, batch job submission,
//! status polling, result retrieval and cancellation, authenticated with a
//! bearer token.
//!
//! # Configuration
//!
//! | Variable | Purpose |
//! |----------|---------|
//! | `ALSVID_TOKEN` | Bearer token for the service |
//!
//! # Example
//!
//! ```ignore
//! use alsvid_adapter_http::HttpEstimatorService;
//! use alsvid_hal::EstimatorService;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let service = HttpEstimatorService::from_env("https://estim.example.com")?;
//! let session = service.open_session().await?;
//! # let _ = session;
//! # Ok(())
//! # }
//! ```

mod api;
mod error;
mod service;

pub use api::{EstimClient, JobResultsResponse, JobStatusResponse, SessionResponse, SubmitResponse};
pub use error::{HttpError, HttpResult};
pub use service::HttpEstimatorService;
