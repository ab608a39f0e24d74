//! Retry-resilient executor for remote batch estimation
//!
//! The remote evaluation service is inherently unreliable: jobs fail to be
//! created when the connection to the execution backend drops, they error
//! out mid-run, and they occasionally stall without ever producing a
//! result. This crate absorbs all of that behind a single call:
//!
//! ```ignore
//! use std::sync::Arc;
//! use alsvid_exec::{ExecutorConfig, RetryExecutor};
//!
//! # async fn run(service: Arc<dyn alsvid_hal::EstimatorService>,
//! #              batch: alsvid_hal::EvaluationBatch) -> anyhow::Result<()> {
//! let mut executor = RetryExecutor::connect(service, ExecutorConfig::new()).await?;
//! let values = executor.run(&batch).await?;
//! assert_eq!(values.len(), batch.len());
//! # Ok(())
//! # }
//! ```
//!
//! Failures are classified into an explicit [`FailureKind`]
//! (creation-failure, execution-error, timeout) and retried up to a bounded
//! attempt count, with the estimator session fully replaced before each
//! retry. Only [`ExecError::RetriesExhausted`] escapes to the caller —
//! never a partial result.

pub mod error;
pub mod executor;
pub mod failure;

pub use error::{ExecError, ExecResult};
pub use executor::{ExecutorConfig, RetryExecutor};
pub use failure::{AttemptFailure, FailureKind};
