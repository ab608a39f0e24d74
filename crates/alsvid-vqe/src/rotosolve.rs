//! Rotosolve coordinate descent.
//!
//! The cost is sinusoidal with period 2π in each single parameter (by
//! construction of the gate parameterization), so one coordinate can be
//! jumped straight to its exact minimizer from three evaluations: the
//! current cost and the costs at ±π/2 shifts. The loop walks the fixed
//! index schedule, updates one parameter per step, appends one checkpoint
//! record per step, and stops once a full cycle passes without a
//! significant change.

use std::f64::consts::{FRAC_PI_2, PI};

use tracing::info;

use crate::checkpoint::{CheckpointSink, StepRecord};
use crate::cost::CostFunction;
use crate::error::{VqeError, VqeResult};
use crate::schedule::IndexSchedule;
use crate::variant::PARAMS_PER_LAYER;

/// Closed-form single-coordinate update.
///
/// Given the current cost `c0` and the costs `c_minus`/`c_plus` at ∓π/2
/// shifts of parameter `theta_i`, returns the new parameter value (wrapped
/// into [0, 2π)) and the exact new cost — the minimum of the sinusoid
/// through the three points.
pub fn rotosolve_update(theta_i: f64, c0: f64, c_minus: f64, c_plus: f64) -> (f64, f64) {
    let d_plus = c0 - c_plus;
    let d_minus = c0 - c_minus;
    let value = (theta_i + (c_plus - c_minus).atan2(d_plus + d_minus) + PI).rem_euclid(2.0 * PI);
    let cost = (c_plus + c_minus) / 2.0 - ((d_plus * d_plus + d_minus * d_minus) / 2.0).sqrt();
    (value, cost)
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A full cycle elapsed without a significant change.
    Converged,
    /// The step budget ran out first. Not an error.
    MaxStepsReached,
}

/// Result of an optimization run.
#[derive(Debug, Clone)]
pub struct OptimizeOutcome {
    /// Completed steps (including those replayed from a checkpoint).
    pub steps: usize,
    /// Cost after the last completed step.
    pub final_cost: f64,
    /// Terminal state reached.
    pub termination: Termination,
}

impl OptimizeOutcome {
    /// Whether the run converged.
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

/// State carried over from a checkpointed run.
#[derive(Debug, Clone)]
pub struct ResumePoint {
    /// Steps already completed; the run continues at this step number.
    pub step: usize,
    /// Cost after the last completed step.
    pub cost: f64,
    /// Last step whose change reached the stopping delta, if any.
    pub last_significant_change: Option<usize>,
}

/// Rotosolve optimizer configuration.
#[derive(Debug, Clone)]
pub struct Rotosolve {
    /// Hard step budget.
    pub max_steps: usize,
    /// Convergence threshold on the per-step cost change.
    pub stopping_delta: f64,
}

impl Rotosolve {
    /// Create an optimizer.
    pub fn new(max_steps: usize, stopping_delta: f64) -> Self {
        Self {
            max_steps,
            stopping_delta,
        }
    }

    /// Run the optimization until convergence or the step budget.
    ///
    /// `theta` is updated in place, one entry per step. Every completed
    /// step appends one record to `sink` BEFORE the stopping check, so an
    /// abort at any point leaves the log one-to-one with the work done; a
    /// step that fails remotely appends nothing.
    pub async fn optimize<C, S>(
        &self,
        cost_fn: &mut C,
        theta: &mut [f64],
        sink: &mut S,
        resume: Option<ResumePoint>,
    ) -> VqeResult<OptimizeOutcome>
    where
        C: CostFunction,
        S: CheckpointSink + Send,
    {
        let n_params = theta.len();
        if n_params == 0 || n_params % PARAMS_PER_LAYER != 0 {
            return Err(VqeError::Config(format!(
                "parameter vector length {n_params} is not a positive multiple of {PARAMS_PER_LAYER}"
            )));
        }
        let mut schedule = IndexSchedule::new(n_params / PARAMS_PER_LAYER);

        let (mut step, start_cost, mut last_change) = match resume {
            Some(r) => {
                // The schedule is pure by position: replay exactly as many
                // draws as steps already completed.
                schedule.advance_by(r.step);
                (r.step, Some(r.cost), r.last_significant_change)
            }
            None => (0, None, None),
        };

        let mut cost = match start_cost {
            Some(cost) => cost,
            None => {
                info!("calculating initial cost");
                let cost = cost_fn.cost(theta).await?;
                info!(cost, "initial cost");
                cost
            }
        };

        while step < self.max_steps {
            let index = schedule.next_index();

            let mut lower = theta.to_vec();
            lower[index] -= FRAC_PI_2;
            let mut upper = theta.to_vec();
            upper[index] += FRAC_PI_2;
            let (c_minus, c_plus) = cost_fn.cost_pair(&lower, &upper).await?;

            let (value, new_cost) = rotosolve_update(theta[index], cost, c_minus, c_plus);
            theta[index] = value;
            let change = cost - new_cost;
            cost = new_cost;

            sink.append(&StepRecord {
                step,
                index,
                cost,
                change,
                theta: theta.to_vec(),
            })?;
            info!(step, index, cost, change, "saved iteration");

            if change < self.stopping_delta {
                // A whole cycle over all parameters must elapse without a
                // significant change before declaring convergence.
                let threshold =
                    last_change.map_or(n_params - 1, |s| (n_params - 1).max(s + n_params));
                if step >= threshold {
                    return Ok(OptimizeOutcome {
                        steps: step + 1,
                        final_cost: cost,
                        termination: Termination::Converged,
                    });
                }
            } else {
                last_change = Some(step);
            }
            step += 1;
        }

        Ok(OptimizeOutcome {
            steps: step,
            final_cost: cost,
            termination: Termination::MaxStepsReached,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use async_trait::async_trait;

    /// Separable sinusoidal surface: offset + Σᵢ ampᵢ·sin(θᵢ + phaseᵢ).
    /// Exactly the landscape Rotosolve assumes, with global minimum
    /// offset − Σᵢ |ampᵢ|.
    struct ModelCost {
        offset: f64,
        amps: Vec<f64>,
        phases: Vec<f64>,
        evaluations: usize,
        fail_at_evaluation: Option<usize>,
    }

    impl ModelCost {
        fn new(n_params: usize) -> Self {
            Self {
                offset: -2.0,
                amps: (0..n_params).map(|i| 0.5 + 0.01 * i as f64).collect(),
                phases: (0..n_params).map(|i| 0.1 * i as f64).collect(),
                evaluations: 0,
                fail_at_evaluation: None,
            }
        }

        fn value(&self, theta: &[f64]) -> f64 {
            self.offset
                + theta
                    .iter()
                    .zip(self.amps.iter().zip(&self.phases))
                    .map(|(&t, (&a, &p))| a * (t + p).sin())
                    .sum::<f64>()
        }

        fn minimum(&self) -> f64 {
            self.offset - self.amps.iter().map(|a| a.abs()).sum::<f64>()
        }

        /// Parameter vector sitting at the global minimum.
        fn argmin(&self) -> Vec<f64> {
            self.phases
                .iter()
                .map(|&p| (1.5 * PI - p).rem_euclid(2.0 * PI))
                .collect()
        }

        fn bump(&mut self) -> VqeResult<()> {
            self.evaluations += 1;
            if self.fail_at_evaluation == Some(self.evaluations) {
                return Err(VqeError::Config("scripted failure".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CostFunction for ModelCost {
        async fn cost(&mut self, theta: &[f64]) -> VqeResult<f64> {
            self.bump()?;
            Ok(self.value(theta))
        }

        async fn cost_pair(&mut self, first: &[f64], second: &[f64]) -> VqeResult<(f64, f64)> {
            self.bump()?;
            Ok((self.value(first), self.value(second)))
        }
    }

    #[test]
    fn test_update_finds_exact_sinusoid_minimum() {
        for (a, b, phi, start) in [
            (0.0, 1.0, 0.0, 0.3),
            (-13.0, 2.5, 1.2, 4.0),
            (5.0, -0.7, -2.0, 0.0),
            (1.0, 0.001, 3.0, 2.0),
        ] {
            let c = |t: f64| a + b * (t + phi).sin();
            let (value, cost) =
                rotosolve_update(start, c(start), c(start - FRAC_PI_2), c(start + FRAC_PI_2));

            assert_abs_diff_eq!(cost, a - b.abs(), epsilon = 1e-10);
            assert_abs_diff_eq!(c(value), a - b.abs(), epsilon = 1e-10);
            assert!((0.0..2.0 * PI).contains(&value));
        }
    }

    #[test]
    fn test_update_on_flat_landscape_is_a_fixed_point() {
        let (value, cost) = rotosolve_update(1.0, 3.0, 3.0, 3.0);
        assert_abs_diff_eq!(cost, 3.0, epsilon = 1e-12);
        // atan2(0, 0) = 0, so the parameter wraps by exactly π.
        assert_abs_diff_eq!(value, 1.0 + PI, epsilon = 1e-12);
    }

    #[tokio::test]
    async fn test_optimize_converges_to_separable_minimum() {
        let mut model = ModelCost::new(PARAMS_PER_LAYER);
        let mut theta = vec![0.3; PARAMS_PER_LAYER];
        let initial = model.value(&theta);
        let mut sink: Vec<StepRecord> = Vec::new();

        let outcome = Rotosolve::new(300, 1e-6)
            .optimize(&mut model, &mut theta, &mut sink, None)
            .await
            .unwrap();

        assert!(outcome.converged());
        assert!(outcome.final_cost <= initial);
        assert_abs_diff_eq!(outcome.final_cost, model.minimum(), epsilon = 1e-6);
        assert_eq!(sink.len(), outcome.steps);
    }

    #[tokio::test]
    async fn test_quiescent_run_converges_at_first_full_cycle() {
        // Start at the exact minimum with max_steps = n_params: every
        // change is ~0, so convergence lands exactly on step n_params − 1.
        let mut model = ModelCost::new(PARAMS_PER_LAYER);
        let mut theta = model.argmin();
        let initial = model.value(&theta);
        let mut sink: Vec<StepRecord> = Vec::new();

        let outcome = Rotosolve::new(PARAMS_PER_LAYER, 1e-6)
            .optimize(&mut model, &mut theta, &mut sink, None)
            .await
            .unwrap();

        assert_eq!(outcome.termination, Termination::Converged);
        assert_eq!(outcome.steps, PARAMS_PER_LAYER);
        assert!(outcome.final_cost <= initial + 1e-12);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_is_not_convergence() {
        let mut model = ModelCost::new(PARAMS_PER_LAYER);
        let mut theta = vec![0.3; PARAMS_PER_LAYER];
        let mut sink: Vec<StepRecord> = Vec::new();

        let outcome = Rotosolve::new(10, 1e-6)
            .optimize(&mut model, &mut theta, &mut sink, None)
            .await
            .unwrap();

        assert_eq!(outcome.termination, Termination::MaxStepsReached);
        assert_eq!(outcome.steps, 10);
        assert_eq!(sink.len(), 10);
    }

    #[tokio::test]
    async fn test_failed_step_appends_no_record() {
        let mut model = ModelCost::new(PARAMS_PER_LAYER);
        // Evaluation 1 is the initial cost; pair evaluations follow, so
        // failing evaluation 4 kills step 2 (0-based).
        model.fail_at_evaluation = Some(4);
        let mut theta = vec![0.3; PARAMS_PER_LAYER];
        let mut sink: Vec<StepRecord> = Vec::new();

        let err = Rotosolve::new(100, 1e-6)
            .optimize(&mut model, &mut theta, &mut sink, None)
            .await
            .unwrap_err();

        assert!(matches!(err, VqeError::Config(_)));
        assert_eq!(sink.len(), 2, "steps 0 and 1 completed, step 2 failed");
    }

    #[tokio::test]
    async fn test_bad_parameter_length_is_a_config_error() {
        let mut model = ModelCost::new(10);
        let mut theta = vec![0.0; 10];
        let mut sink: Vec<StepRecord> = Vec::new();

        let err = Rotosolve::new(10, 1e-6)
            .optimize(&mut model, &mut theta, &mut sink, None)
            .await
            .unwrap_err();
        assert!(matches!(err, VqeError::Config(_)));
    }
}
