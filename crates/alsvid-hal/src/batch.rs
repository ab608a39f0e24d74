//! Evaluation batches and the opaque tokens they carry.
//!
//! The engine never looks inside an evaluation unit or the objective
//! operator — both are built by an external collaborator and passed
//! through to the estimator service unchanged. A batch pairs each unit
//! with one concrete parameter vector; the service answers with one
//! scalar per entry, in entry order.

use serde::{Deserialize, Serialize};

/// Opaque handle to one ready-to-evaluate ansatz variant.
///
/// `id` identifies the unit to the service; `payload` is free-form
/// service data (circuit reference, variant metadata) forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalUnit {
    /// Service-facing identifier.
    pub id: String,
    /// Free-form payload forwarded to the service unchanged.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl EvalUnit {
    /// Create a unit with an empty payload.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: serde_json::Value::Null,
        }
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Opaque handle to the objective operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observable {
    /// Service-facing identifier.
    pub id: String,
    /// Free-form payload forwarded to the service unchanged.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl Observable {
    /// Create an observable with an empty payload.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: serde_json::Value::Null,
        }
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// One batch entry: an evaluation unit bound to a parameter vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// The unit to evaluate.
    pub unit: EvalUnit,
    /// Parameter values bound for this evaluation.
    pub parameters: Vec<f64>,
}

/// Ordered sequence of evaluations submitted to the service as one job.
///
/// Order is significant: the service returns a parallel sequence of
/// scalars, one per entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationBatch {
    /// Entries in submission order.
    pub entries: Vec<BatchEntry>,
    /// The objective operator, shared by every entry.
    pub observable: Observable,
}

impl EvaluationBatch {
    /// Create an empty batch for the given observable.
    pub fn new(observable: Observable) -> Self {
        Self {
            entries: Vec::new(),
            observable,
        }
    }

    /// Append one (unit, parameter-vector) pair.
    pub fn push(&mut self, unit: EvalUnit, parameters: Vec<f64>) {
        self.entries.push(BatchEntry { unit, parameters });
    }

    /// Number of entries, which is also the expected result length.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
