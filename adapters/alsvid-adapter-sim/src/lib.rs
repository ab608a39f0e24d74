//! Alsvid in-process estimator service
//!
//! This crate provides a local stand-in for the remote batch-evaluation
//! service: batches are answered by a caller-supplied scalar model instead
//! of circuit execution. It exists for two consumers:
//!
//! - the `alsvid` CLI's local mode, which runs the full optimization loop
//!   against a synthetic cost surface without any network access;
//! - integration tests, which script failures through [`FaultPlan`]
//!   (failing job creations, failing executions, artificial queue polls)
//!   to exercise the executor's retry machinery deterministically.
//!
//! # Example
//!
//! ```ignore
//! use alsvid_adapter_sim::SimEstimatorService;
//! use alsvid_hal::EstimatorService;
//!
//! // Cost model: sum of parameters, ignoring the unit.
//! let service = SimEstimatorService::new(|_unit, theta| theta.iter().sum());
//! # let _ = service;
//! ```

mod service;

pub use service::{FaultPlan, Model, SimEstimatorService};
