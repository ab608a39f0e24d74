//! Alsvid estimator-service abstraction layer
//!
//! This crate provides a unified interface for the remote batch-evaluation
//! services that Alsvid's optimization loop drives, so that the engine works
//! unchanged against an HTTP estimation service or an in-process stand-in.
//!
//! # Overview
//!
//! - Opaque [`EvalUnit`] / [`Observable`] tokens — the engine never inspects
//!   the ansatz or the objective, it only forwards them.
//! - [`EvaluationBatch`] — an ordered sequence of (unit, parameter-vector)
//!   pairs answered by a parallel sequence of scalars.
//! - [`EstimatorService`] / [`EstimatorSession`] — the session-scoped job
//!   lifecycle (create, poll, fetch, cancel).
//! - [`JobId`] / [`JobStatus`] — job handles and the seven-state lifecycle.
//!
//! # Example: submitting a batch
//!
//! ```ignore
//! use alsvid_hal::{EstimatorService, EvaluationBatch, EvalUnit, Observable};
//!
//! # async fn run(service: &dyn EstimatorService) -> alsvid_hal::HalResult<()> {
//! let mut batch = EvaluationBatch::new(Observable::new("heisenberg"));
//! batch.push(EvalUnit::new("rot0-m1"), vec![0.25; 54]);
//!
//! let session = service.open_session().await?;
//! let job_id = session.create_job(&batch).await?;
//! let status = session.status(&job_id).await?;
//! println!("job {job_id} is {status}");
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod error;
pub mod estimator;
pub mod job;

pub use batch::{BatchEntry, EvalUnit, EvaluationBatch, Observable};
pub use error::{HalError, HalResult};
pub use estimator::{EstimatorService, EstimatorSession};
pub use job::{JobId, JobStatus};
