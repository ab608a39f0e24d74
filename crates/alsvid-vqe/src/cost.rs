//! Error-mitigated cost evaluation.
//!
//! The cost of a parameter vector is the objective expectation value,
//! averaged over the rotation variants and — when the fold set has three
//! levels — extrapolated to the zero-resource limit within each rotation.
//!
//! Every call produces exactly one remote round-trip: when the optimizer
//! needs two trial vectors, both blocks go into a single batch so that
//! both evaluations observe the same service state.

use async_trait::async_trait;

use alsvid_exec::RetryExecutor;
use alsvid_hal::{EvaluationBatch, Observable};

use crate::error::{VqeError, VqeResult};
use crate::variant::{AnsatzSet, VariantSet};

/// Value at x = 0 of the quadratic through (1, y₁), (3, y₃), (5, y₅).
pub fn extrapolate_to_zero(y1: f64, y3: f64, y5: f64) -> f64 {
    (15.0 * y1 - 10.0 * y3 + 3.0 * y5) / 8.0
}

/// Reduce one theta's raw result block to a single cost value.
///
/// `values` holds one scalar per variant in canonical order (rotation-major,
/// folds ascending). With three folds each rotation is extrapolated to
/// x = 0; with one fold the value is taken directly. The rotation results
/// are averaged arithmetically.
pub(crate) fn reduce_block(set: &VariantSet, values: &[f64]) -> f64 {
    let n_folds = set.folds().len();
    let n_rotations = set.rotations().len();
    debug_assert_eq!(values.len(), set.len());

    let mut acc = 0.0;
    for r in 0..n_rotations {
        let block = &values[r * n_folds..(r + 1) * n_folds];
        acc += if n_folds == 3 {
            extrapolate_to_zero(block[0], block[1], block[2])
        } else {
            block[0]
        };
    }
    acc / n_rotations as f64
}

/// The cost-function seam between the optimizer and the evaluation stack.
///
/// `cost_pair` exists so a single optimizer step can evaluate both shifted
/// trial vectors in one remote round-trip.
#[async_trait]
pub trait CostFunction: Send {
    /// Evaluate the cost at one parameter vector.
    async fn cost(&mut self, theta: &[f64]) -> VqeResult<f64>;

    /// Evaluate the cost at two parameter vectors, preserving call order.
    async fn cost_pair(&mut self, first: &[f64], second: &[f64]) -> VqeResult<(f64, f64)>;
}

/// Error-mitigated cost evaluator over a retry-hardened executor.
pub struct CostEvaluator {
    ansatz: AnsatzSet,
    observable: Observable,
    executor: RetryExecutor,
}

impl std::fmt::Debug for CostEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostEvaluator")
            .field("ansatz", &self.ansatz)
            .field("observable", &self.observable)
            .finish_non_exhaustive()
    }
}

impl CostEvaluator {
    /// Build an evaluator.
    ///
    /// Fold-set cardinality is validated here, before any remote call:
    /// one level means no extrapolation, three levels mean quadratic
    /// extrapolation; anything else is a configuration error.
    pub fn new(
        ansatz: AnsatzSet,
        observable: Observable,
        executor: RetryExecutor,
    ) -> VqeResult<Self> {
        match ansatz.variants().folds().len() {
            1 | 3 => {}
            n => {
                return Err(VqeError::Config(format!(
                    "zero-noise extrapolation supports fold sets of size 1 or 3 \
                     (multipliers 1 or 1,3,5), got {n}"
                )));
            }
        }
        if ansatz.variants().rotations().is_empty() {
            return Err(VqeError::Config("rotation set must not be empty".into()));
        }
        Ok(Self {
            ansatz,
            observable,
            executor,
        })
    }

    /// Evaluate the cost at one parameter vector.
    pub async fn evaluate(&mut self, theta: &[f64]) -> VqeResult<f64> {
        let costs = self.run(&[theta]).await?;
        Ok(costs[0])
    }

    /// Evaluate both trial vectors with a single submission.
    pub async fn evaluate_pair(&mut self, first: &[f64], second: &[f64]) -> VqeResult<(f64, f64)> {
        let costs = self.run(&[first, second]).await?;
        Ok((costs[0], costs[1]))
    }

    /// Build one batch covering every variant for every theta (theta blocks
    /// concatenated in call order), run it, and reduce per block.
    async fn run(&mut self, thetas: &[&[f64]]) -> VqeResult<Vec<f64>> {
        let mut batch = EvaluationBatch::new(self.observable.clone());
        for theta in thetas {
            for unit in self.ansatz.units() {
                batch.push(unit.clone(), theta.to_vec());
            }
        }

        let raw = self.executor.run(&batch).await?;

        let n = self.ansatz.variants().len();
        Ok((0..thetas.len())
            .map(|block| reduce_block(self.ansatz.variants(), &raw[block * n..(block + 1) * n]))
            .collect())
    }
}

#[async_trait]
impl CostFunction for CostEvaluator {
    async fn cost(&mut self, theta: &[f64]) -> VqeResult<f64> {
        self.evaluate(theta).await
    }

    async fn cost_pair(&mut self, first: &[f64], second: &[f64]) -> VqeResult<(f64, f64)> {
        self.evaluate_pair(first, second).await
    }
}
