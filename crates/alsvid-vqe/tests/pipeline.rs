//! End-to-end runs through the full stack: Rotosolve over a
//! `CostEvaluator` over a `RetryExecutor` over the in-process simulator.

use std::f64::consts::{FRAC_PI_2, PI};
use std::sync::Arc;
use std::time::Duration;

use approx::assert_abs_diff_eq;

use alsvid_adapter_sim::{FaultPlan, SimEstimatorService};
use alsvid_exec::{ExecutorConfig, RetryExecutor};
use alsvid_hal::{EvalUnit, Observable};
use alsvid_vqe::{
    AnsatzSet, CostEvaluator, PARAMS_PER_LAYER, Rotosolve, StepRecord, Termination, VariantSet,
    VqeError,
};

const AMP_BASE: f64 = 0.4;
const AMP_STEP: f64 = 0.002;
const PHASE_STEP: f64 = 0.05;
const OFFSET: f64 = -1.0;

/// Noise-free part of the synthetic surface: a separable sinusoid.
fn base_energy(theta: &[f64]) -> f64 {
    OFFSET
        + theta
            .iter()
            .enumerate()
            .map(|(i, &t)| (AMP_BASE + AMP_STEP * i as f64) * (t + PHASE_STEP * i as f64).sin())
            .sum::<f64>()
}

/// Synthetic per-variant surface.
///
/// The fold bias is quadratic in the CNOT multiplier (recovered exactly by
/// the extrapolation to multiplier 0) and the rotation offset has zero
/// mean over the rotation set {0,3,6,9} (removed exactly by averaging),
/// so the reduced cost equals `base_energy`.
fn surface(unit: &EvalUnit, theta: &[f64]) -> f64 {
    let fold = unit.payload["fold"].as_u64().unwrap_or(0) as f64;
    let rotation = unit.payload["rotation"].as_u64().unwrap_or(0) as f64;
    let multiplier = 2.0 * fold + 1.0;
    let bias = 0.3 * multiplier + 0.05 * multiplier * multiplier;
    let wobble = 0.05 * (FRAC_PI_2 * rotation).cos();
    base_energy(theta) + bias + wobble
}

fn global_minimum() -> f64 {
    OFFSET
        - (0..PARAMS_PER_LAYER)
            .map(|i| AMP_BASE + AMP_STEP * i as f64)
            .sum::<f64>()
}

fn argmin_theta() -> Vec<f64> {
    (0..PARAMS_PER_LAYER)
        .map(|i| (1.5 * PI - PHASE_STEP * i as f64).rem_euclid(2.0 * PI))
        .collect()
}

fn executor_config() -> ExecutorConfig {
    ExecutorConfig::new()
        .with_timeout(Duration::from_secs(30))
        .with_max_retries(5)
        .with_poll_interval(Duration::from_millis(1))
}

async fn evaluator(service: SimEstimatorService) -> CostEvaluator {
    let executor = RetryExecutor::connect(Arc::new(service), executor_config())
        .await
        .unwrap();
    let ansatz = AnsatzSet::labelled(VariantSet::full(), 1);
    CostEvaluator::new(ansatz, Observable::new("kagome-heisenberg"), executor).unwrap()
}

#[tokio::test]
async fn mitigation_reduces_to_the_noise_free_surface() {
    let mut evaluator = evaluator(SimEstimatorService::new(surface)).await;
    let theta = vec![0.7; PARAMS_PER_LAYER];

    let cost = evaluator.evaluate(&theta).await.unwrap();
    assert_abs_diff_eq!(cost, base_energy(&theta), epsilon = 1e-9);
}

#[tokio::test]
async fn constant_raw_values_reduce_to_the_constant() {
    // Multiplier set {1,3,5}, rotation set of size 4, every raw value k.
    let k = 2.625;
    let mut evaluator = evaluator(SimEstimatorService::new(move |_, _| k)).await;

    let cost = evaluator.evaluate(&vec![0.0; PARAMS_PER_LAYER]).await.unwrap();
    assert_abs_diff_eq!(cost, k, epsilon = 1e-12);
}

#[tokio::test]
async fn quiescent_run_converges_within_its_first_cycle() {
    // Single layer (54 parameters), noiseless synthetic cost,
    // max_steps = 54, stopping_delta = 1e-6: the run must end by
    // convergence, not by exhausting the budget.
    let mut evaluator = evaluator(SimEstimatorService::new(surface)).await;
    let mut theta = argmin_theta();
    let initial = base_energy(&theta);
    let mut sink: Vec<StepRecord> = Vec::new();

    let outcome = Rotosolve::new(PARAMS_PER_LAYER, 1e-6)
        .optimize(&mut evaluator, &mut theta, &mut sink, None)
        .await
        .unwrap();

    assert_eq!(outcome.termination, Termination::Converged);
    assert!(outcome.final_cost <= initial + 1e-9);
    assert_eq!(sink.len(), outcome.steps);
}

#[tokio::test]
async fn optimization_rides_through_injected_failures() {
    let service = SimEstimatorService::faulty(
        surface,
        FaultPlan {
            failing_creations: 2,
            failing_executions: 1,
            queued_polls: 1,
        },
    );
    let handle = service.clone();
    let mut evaluator = evaluator(service).await;
    let mut theta: Vec<f64> = (0..PARAMS_PER_LAYER).map(|i| 0.2 + 0.01 * i as f64).collect();
    let initial = base_energy(&theta);
    let mut sink: Vec<StepRecord> = Vec::new();

    let outcome = Rotosolve::new(200, 1e-6)
        .optimize(&mut evaluator, &mut theta, &mut sink, None)
        .await
        .unwrap();

    assert!(outcome.converged());
    assert!(outcome.final_cost < initial);
    assert_abs_diff_eq!(outcome.final_cost, global_minimum(), epsilon = 1e-6);
    // Three scripted failures cost three extra sessions on top of the
    // initial connect.
    assert_eq!(handle.sessions_opened(), 4);
}

#[tokio::test]
async fn bad_fold_set_fails_before_any_remote_call() {
    let service = SimEstimatorService::new(surface);
    let handle = service.clone();
    let executor = RetryExecutor::connect(Arc::new(service), executor_config())
        .await
        .unwrap();

    // Two folds: neither direct evaluation nor quadratic extrapolation.
    let ansatz = AnsatzSet::labelled(VariantSet::new(vec![0, 3, 6, 9], vec![0, 1]), 1);
    let err = CostEvaluator::new(ansatz, Observable::new("kagome-heisenberg"), executor)
        .unwrap_err();

    assert!(matches!(err, VqeError::Config(_)));
    assert_eq!(handle.jobs_created(), 0);
}
