//! Rotosolve optimization engine with error mitigation
//!
//! This crate is the classical core of Alsvid: a sequential
//! coordinate-descent loop that minimizes an energy expectation value
//! evaluated by a remote batch-estimation service.
//!
//! - [`CostEvaluator`] turns one (or two) parameter vectors into a single
//!   batched service round-trip, averages the raw results over rotation
//!   variants and extrapolates across CNOT multipliers to the zero-noise
//!   limit.
//! - [`Rotosolve`] walks the fixed [`schedule`] over parameter indices and
//!   jumps each coordinate to its closed-form minimizer, one remote
//!   round-trip per step.
//! - [`checkpoint`] persists every completed step to an append-only log
//!   that doubles as the resume mechanism: replaying it reconstructs the
//!   optimizer state exactly.
//!
//! The engine never inspects the ansatz or the objective; both are opaque
//! tokens routed through `alsvid-hal` (see that crate's docs).

pub mod checkpoint;
pub mod cost;
pub mod error;
pub mod params;
pub mod rotosolve;
pub mod schedule;
pub mod variant;

pub use checkpoint::{
    CheckpointSink, CheckpointWriter, ResumeState, RunConfig, StepRecord, StoppingCriteria,
    parse_log, read_log,
};
pub use cost::{CostEvaluator, CostFunction, extrapolate_to_zero};
pub use error::{VqeError, VqeResult};
pub use params::initial_parameters;
pub use rotosolve::{OptimizeOutcome, ResumePoint, Rotosolve, Termination, rotosolve_update};
pub use schedule::{IndexSchedule, LAYER_SCHEDULE};
pub use variant::{
    AnsatzSet, COMPONENTS_PER_EDGE, EDGES_PER_LAYER, FULL_FOLDS, FULL_ROTATIONS, PARAMS_PER_LAYER,
    RING_SITES, Variant, VariantSet, cnot_multiplier,
};
