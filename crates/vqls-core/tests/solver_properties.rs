//! End-to-end properties of the cost function and optimizer on the local
//! statevector simulator.

use std::f64::consts::PI;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use vqls_adapter_sim::SimulatorBackend;
use vqls_core::{
    Ansatz, AnsatzVariant, CircuitTag, CostFunction, EstimationMode, FiniteDifference,
    GradientDescent, MeasurementEngine, ParameterShift, PauliOperator, PauliTerm, ProblemConfig,
    Solver, VqlsError, stop_channel,
};
use vqls_hal::{
    Backend, Capabilities, ExecutionResult, HalError, HalResult, JobId, JobStatus,
};
use vqls_ir::Circuit;

fn example_operator() -> PauliOperator {
    PauliOperator::from_labels([(1.0, "IZZI"), (2.0, "ZZZZ"), (-0.5, "IIIZ")]).unwrap()
}

fn exact_engine() -> MeasurementEngine {
    MeasurementEngine::new(Arc::new(SimulatorBackend::new()), 0).unwrap()
}

/// Deterministic pseudo-random angles in [−π, π).
fn angles(len: usize, salt: u64) -> Vec<f64> {
    (0..len as u64)
        .map(|k| {
            let x = (k.wrapping_mul(2_654_435_761).wrapping_add(salt * 97) % 10_000) as f64;
            x / 10_000.0 * 2.0 * PI - PI
        })
        .collect()
}

// ============================================================================
// Identity handling
// ============================================================================

#[test]
fn identity_strings_have_empty_support() {
    for n in 1..6 {
        let term = PauliTerm::new(0.75, &"I".repeat(n)).unwrap();
        assert!(term.is_identity());
        assert!(term.support().is_empty());
    }
}

#[tokio::test]
async fn identity_operator_has_unit_denominator() {
    let op = PauliOperator::identity(3);
    for variant in [
        AnsatzVariant::Rotation,
        AnsatzVariant::Paired,
        AnsatzVariant::RotationXy,
    ] {
        let ansatz = Ansatz::new(3, 4, variant);
        let cost = CostFunction::new(op.clone(), ansatz, EstimationMode::Surrogate, exact_engine())
            .unwrap();
        for salt in 0..4 {
            let theta = angles(ansatz.num_parameters(), salt);
            let denom = cost.denom(&theta).await.unwrap();
            assert!((denom - 1.0).abs() < 1e-12, "denom = {denom}");
        }
    }
}

#[tokio::test]
async fn rotation_xy_denominator_matches_bloch_vector() {
    // ψ = Rx(b)·Ry(a)|0⟩ has ⟨Z⟩ = cos a · cos b, and (I + ½Z)² = 1.25·I + Z.
    let op = PauliOperator::from_labels([(1.0, "I"), (0.5, "Z")]).unwrap();
    let cost = CostFunction::new(
        op,
        Ansatz::new(1, 1, AnsatzVariant::RotationXy),
        EstimationMode::Surrogate,
        exact_engine(),
    )
    .unwrap();
    let (a, b) = (0.7, -1.3);
    let denom = cost.denom(&[a, b]).await.unwrap();
    assert!((denom - (1.25 + a.cos() * b.cos())).abs() < 1e-12, "denom = {denom}");
}

#[tokio::test]
async fn identity_term_contributes_its_coefficient() {
    // Raw A·A for A = 0.5·IIII + ZZZZ: 0.25·IIII + 0.5·ZZZZ + 0.5·ZZZZ + IIII.
    let op = PauliOperator::from_labels([(0.5, "IIII"), (1.0, "ZZZZ")]).unwrap();
    let cost = CostFunction::new(
        op,
        Ansatz::new(4, 2, AnsatzVariant::Rotation),
        EstimationMode::Surrogate,
        exact_engine(),
    )
    .unwrap()
    .with_simplified_product(false)
    .unwrap();
    let est = cost.evaluate(&angles(8, 3)).await.unwrap();
    let hadamard = est
        .measurements
        .iter()
        .filter(|m| matches!(m.tag, CircuitTag::HadamardTest { .. }))
        .count();
    assert_eq!(hadamard, 2);
}

// ============================================================================
// Descent sanity on the reference problem
// ============================================================================

#[tokio::test]
async fn reference_problem_descends() {
    let cost = CostFunction::new(
        example_operator(),
        Ansatz::new(4, 8, AnsatzVariant::Rotation),
        EstimationMode::Surrogate,
        exact_engine(),
    )
    .unwrap();
    let result = GradientDescent::default()
        .minimize(
            &cost,
            &FiniteDifference::default(),
            vec![0.0; 32],
            None,
            |_| {},
        )
        .await
        .unwrap();

    assert_eq!(result.history.len(), 50);
    assert!((result.initial_cost - 6.0).abs() < 1e-9);
    assert!(result.final_cost() <= result.initial_cost + 1e-2);
    assert_eq!(result.theta.len(), 32);
}

#[tokio::test]
async fn solver_from_default_config() {
    let mut config = ProblemConfig::default();
    config.optimizer.iterations = 3;
    let solver = Solver::from_config(&config, Arc::new(SimulatorBackend::new())).unwrap();
    assert_eq!(solver.initial_parameters().len(), 32);

    let report = solver.run(None, |_| {}).await.unwrap();
    assert_eq!(report.result.history.len(), 3);
    assert_eq!(report.gradient, "central_difference");
    assert_eq!(report.estimation, EstimationMode::Surrogate);
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["history"].is_array());
    assert!(json["theta"].is_array());
}

// ============================================================================
// Reduction order
// ============================================================================

#[tokio::test]
async fn denominator_is_independent_of_term_order() {
    let op = PauliOperator::from_labels([
        (1.0, "XZI"),
        (-0.3, "YYZ"),
        (0.8, "IIX"),
        (0.45, "ZXY"),
    ])
    .unwrap();
    let ansatz = Ansatz::new(3, 3, AnsatzVariant::Rotation);
    let theta = angles(ansatz.num_parameters(), 11);

    let reference = CostFunction::new(op.clone(), ansatz, EstimationMode::Surrogate, exact_engine())
        .unwrap()
        .denom(&theta)
        .await
        .unwrap();

    for order in [[3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1]] {
        let permuted = op.permuted(&order).unwrap();
        for simplify in [true, false] {
            let denom = CostFunction::new(
                permuted.clone(),
                ansatz,
                EstimationMode::Surrogate,
                exact_engine(),
            )
            .unwrap()
            .with_simplified_product(simplify)
            .unwrap()
            .denom(&theta)
            .await
            .unwrap();
            assert!((denom - reference).abs() < 1e-9, "{denom} vs {reference}");
        }
    }
}

// ============================================================================
// Input validation
// ============================================================================

#[test]
fn unknown_symbol_is_rejected() {
    let err = PauliOperator::from_labels([(1.0, "IZZI"), (1.0, "ZZWZ")]).unwrap_err();
    assert!(matches!(err, VqlsError::InvalidOperator(_)));
    let err = "1.0 IZZI\n2.0 ZWZZ\n".parse::<PauliOperator>().unwrap_err();
    assert!(matches!(err, VqlsError::InvalidOperator(msg) if msg.starts_with("line 2")));
}

#[tokio::test]
async fn wrong_parameter_count_never_reaches_the_backend() {
    let backend = Arc::new(CountingBackend::new(usize::MAX));
    let engine = MeasurementEngine::new(backend.clone(), 0).unwrap();
    let cost = CostFunction::new(
        example_operator(),
        Ansatz::new(4, 8, AnsatzVariant::Rotation),
        EstimationMode::Surrogate,
        engine,
    )
    .unwrap();
    let err = cost.evaluate(&[0.0; 31]).await.unwrap_err();
    assert!(matches!(err, VqlsError::ParameterCount { expected: 32, got: 31, .. }));
    assert_eq!(backend.submitted.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Surrogate bound
// ============================================================================

#[tokio::test]
async fn surrogate_numerator_is_bounded_by_coefficients() {
    let op = PauliOperator::from_labels([(1.5, "XYZ"), (-0.7, "ZZI"), (0.2, "IXX")]).unwrap();
    let bound = op.coefficient_l1();
    for variant in [AnsatzVariant::Rotation, AnsatzVariant::Paired] {
        let ansatz = Ansatz::new(3, 2, variant);
        let cost = CostFunction::new(op.clone(), ansatz, EstimationMode::Surrogate, exact_engine())
            .unwrap();
        for salt in 0..5 {
            let numer = cost.numer(&angles(ansatz.num_parameters(), salt)).await.unwrap();
            assert!(numer.abs() <= bound + 1e-12, "numer = {numer}, bound = {bound}");
        }
    }
}

#[tokio::test]
async fn swap_test_numerator_is_a_probability_scale() {
    let op = PauliOperator::from_labels([(0.6, "ZI"), (0.4, "XY")]).unwrap();
    let ansatz = Ansatz::new(2, 2, AnsatzVariant::Rotation);
    let cost = CostFunction::new(op.clone(), ansatz, EstimationMode::SwapTest, exact_engine())
        .unwrap();
    for salt in 0..3 {
        let est = cost.evaluate(&angles(4, salt)).await.unwrap();
        assert!(est.numer >= -1e-12);
        assert!(est.numer <= op.coefficient_l1().powi(2) + 1e-12);
        // A·A simplifies to 0.52·II, leaving only the pairs (0,0), (0,1), (1,1)
        assert_eq!(est.measurements.len(), 3);
        assert!(
            est.measurements
                .iter()
                .all(|m| m.p_zero() > -1e-12 && m.p_zero() < 1.0 + 1e-12)
        );
    }
}

#[tokio::test]
async fn shift_rule_matches_central_difference_on_quadratic_paths() {
    let cost = CostFunction::new(
        PauliOperator::from_labels([(1.0, "ZX"), (0.5, "YI")]).unwrap(),
        Ansatz::new(2, 2, AnsatzVariant::Rotation),
        EstimationMode::SwapTest,
        exact_engine(),
    )
    .unwrap();
    let theta = angles(4, 5);
    let gd = GradientDescent::new(1, 0.1).unwrap();
    let by_shift = gd
        .minimize(&cost, &ParameterShift::default(), theta.clone(), None, |_| {})
        .await
        .unwrap();
    let by_difference = gd
        .minimize(&cost, &FiniteDifference::central(1e-5), theta, None, |_| {})
        .await
        .unwrap();
    for (a, b) in by_shift.theta.iter().zip(&by_difference.theta) {
        assert!((a - b).abs() < 1e-6);
    }
}

// ============================================================================
// Sampled readout
// ============================================================================

#[tokio::test]
async fn seeded_sampling_is_reproducible_and_close_to_exact() {
    let ansatz = Ansatz::new(4, 8, AnsatzVariant::Rotation);
    let theta = angles(32, 9);
    let exact = CostFunction::new(example_operator(), ansatz, EstimationMode::Surrogate, exact_engine())
        .unwrap()
        .evaluate(&theta)
        .await
        .unwrap();

    let sampled = |seed| {
        let engine =
            MeasurementEngine::new(Arc::new(SimulatorBackend::new().with_seed(seed)), 20_000)
                .unwrap()
                .with_max_concurrency(4);
        CostFunction::new(example_operator(), ansatz, EstimationMode::Surrogate, engine).unwrap()
    };
    let a = sampled(7).evaluate(&theta).await.unwrap();
    let b = sampled(7).evaluate(&theta).await.unwrap();
    assert_eq!(a.cost, b.cost);
    // 20k shots per circuit, weights up to 2.5: well inside 0.2.
    assert!((a.cost - exact.cost).abs() < 0.2, "{} vs {}", a.cost, exact.cost);
}

// ============================================================================
// Failure propagation and stopping
// ============================================================================

/// Simulator wrapper that fails every submission after `fail_after`.
struct CountingBackend {
    inner: SimulatorBackend,
    submitted: AtomicUsize,
    fail_after: usize,
}

impl CountingBackend {
    fn new(fail_after: usize) -> Self {
        Self {
            inner: SimulatorBackend::new(),
            submitted: AtomicUsize::new(0),
            fail_after,
        }
    }
}

#[async_trait]
impl Backend for CountingBackend {
    fn name(&self) -> &str {
        "counting"
    }

    fn capabilities(&self) -> &Capabilities {
        self.inner.capabilities()
    }

    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
        if self.submitted.fetch_add(1, Ordering::SeqCst) >= self.fail_after {
            return Err(HalError::SubmissionFailed("device offline".into()));
        }
        self.inner.submit(circuit, shots).await
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        self.inner.status(job_id).await
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        self.inner.result(job_id).await
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        self.inner.cancel(job_id).await
    }
}

#[tokio::test]
async fn backend_failure_aborts_with_context() {
    // 6 circuits per evaluation; the first evaluation and part of the first
    // gradient succeed.
    let engine = MeasurementEngine::new(Arc::new(CountingBackend::new(20)), 0)
        .unwrap()
        .with_max_concurrency(1);
    let cost = CostFunction::new(
        example_operator(),
        Ansatz::new(4, 2, AnsatzVariant::Rotation),
        EstimationMode::Surrogate,
        engine,
    )
    .unwrap();
    let err = GradientDescent::default()
        .minimize(&cost, &FiniteDifference::default(), vec![0.0; 8], None, |_| {})
        .await
        .unwrap_err();

    let VqlsError::Aborted {
        iteration,
        ref context,
        ..
    } = err
    else {
        panic!("expected abort, got {err}");
    };
    assert_eq!(iteration, 1);
    assert!(context.contains("IZZI"));
    assert!(matches!(
        err.root(),
        VqlsError::MeasurementFailed {
            source: HalError::SubmissionFailed(_),
            ..
        }
    ));
}

#[tokio::test]
async fn stop_keeps_last_committed_theta() {
    let cost = CostFunction::new(
        example_operator(),
        Ansatz::new(4, 1, AnsatzVariant::Rotation),
        EstimationMode::Surrogate,
        exact_engine(),
    )
    .unwrap();
    let (handle, signal) = stop_channel();
    let mut committed = Vec::new();
    let result = GradientDescent::default()
        .minimize(
            &cost,
            &FiniteDifference::default(),
            vec![0.1; 4],
            Some(signal),
            |report| {
                committed.push(report.cost);
                if report.iteration == 2 {
                    handle.stop();
                }
            },
        )
        .await
        .unwrap();
    assert!(result.stopped);
    assert_eq!(result.history, committed);
    assert_eq!(result.iterations_completed(), 2);

    // The returned θ reproduces the last recorded cost.
    let again = cost.evaluate(&result.theta).await.unwrap().cost;
    assert!((again - result.final_cost()).abs() < 1e-12);
}
