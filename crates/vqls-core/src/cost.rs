//! Cost assembly: C(θ) = denom − 2·numer + 1.
//!
//! `denom` is the Hadamard-test aggregate over the literal product A·A (no
//! conjugate transpose is taken). `numer` comes from the active
//! [`EstimationMode`]:
//!
//! - [`EstimationMode::SwapTest`]: |⟨b|A|ψ⟩|², one circuit per term pair
//!   k ≤ l. Off-diagonal pairs are weighted `2·Re(c_k c̄_l)`, and an
//!   imaginary-quadrature circuit is added only when `Im(c_k c̄_l) ≠ 0`.
//! - [`EstimationMode::Surrogate`]: Re⟨b|A|ψ⟩, one circuit per term, plus an
//!   imaginary-quadrature circuit for terms with a complex coefficient.
//!
//! Per-term readouts are slotted in term order before summation.

use async_trait::async_trait;
use num_complex::Complex64;
use serde::Serialize;
use tracing::debug;

use vqls_ir::Circuit;

use crate::ansatz::Ansatz;
use crate::engine::{MeasurementEngine, MeasurementRecord};
use crate::error::{CircuitTag, Quadrature, VqlsError, VqlsResult};
use crate::gradient::Objective;
use crate::pauli::{COEFF_EPSILON, PauliOperator};
use crate::protocol::{self, EstimationMode};

/// One cost evaluation with its parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    /// ⟨ψ|A·A|ψ⟩.
    pub denom: f64,
    /// Numerator of the active estimation mode.
    pub numer: f64,
    /// denom − 2·numer + 1.
    pub cost: f64,
    /// Circuits sent to the backend.
    pub circuits_executed: usize,
    /// Every readout, denominator first.
    pub measurements: Vec<MeasurementRecord>,
}

/// A weighted sum of ancilla readouts plus a constant.
#[derive(Default)]
struct Plan {
    constant: f64,
    jobs: Vec<(CircuitTag, Circuit)>,
    weights: Vec<f64>,
}

impl Plan {
    fn push(&mut self, tag: CircuitTag, circuit: Circuit, weight: f64) {
        self.jobs.push((tag, circuit));
        self.weights.push(weight);
    }

    async fn run(self, engine: &MeasurementEngine) -> VqlsResult<(f64, Vec<MeasurementRecord>)> {
        let records = engine.run_all(self.jobs).await?;
        let value = self
            .weights
            .iter()
            .zip(&records)
            .fold(self.constant, |acc, (w, r)| acc + w * r.z);
        Ok((value, records))
    }
}

/// VQLS cost function for one operator and ansatz.
#[derive(Debug, Clone)]
pub struct CostFunction {
    operator: PauliOperator,
    product: PauliOperator,
    ansatz: Ansatz,
    mode: EstimationMode,
    engine: MeasurementEngine,
}

impl CostFunction {
    /// Create a cost function. A·A is simplified before measurement.
    pub fn new(
        operator: PauliOperator,
        ansatz: Ansatz,
        mode: EstimationMode,
        engine: MeasurementEngine,
    ) -> VqlsResult<Self> {
        if operator.n_qubits() != ansatz.n_qubits as usize {
            return Err(VqlsError::InvalidOperator(format!(
                "operator acts on {} qubits but the ansatz has {}",
                operator.n_qubits(),
                ansatz.n_qubits
            )));
        }

        let caps = engine.backend().capabilities();
        let needed = mode.required_qubits(operator.n_qubits());
        if needed > caps.num_qubits as usize {
            return Err(VqlsError::Config(format!(
                "{mode} on {} qubits needs {needed} qubits, backend '{}' has {}",
                operator.n_qubits(),
                engine.backend_name(),
                caps.num_qubits
            )));
        }

        let product = operator.compose(&operator)?.simplify();
        Ok(Self {
            operator,
            product,
            ansatz,
            mode,
            engine,
        })
    }

    /// Measure the raw, unsimplified A·A instead (one circuit per term pair).
    pub fn with_simplified_product(mut self, simplify: bool) -> VqlsResult<Self> {
        let raw = self.operator.compose(&self.operator)?;
        self.product = if simplify { raw.simplify() } else { raw };
        Ok(self)
    }

    /// The operator A.
    pub fn operator(&self) -> &PauliOperator {
        &self.operator
    }

    /// The product measured for the denominator.
    pub fn product(&self) -> &PauliOperator {
        &self.product
    }

    /// The ansatz structure.
    pub fn ansatz(&self) -> &Ansatz {
        &self.ansatz
    }

    /// The numerator estimation mode.
    pub fn mode(&self) -> EstimationMode {
        self.mode
    }

    /// The measurement engine.
    pub fn engine(&self) -> &MeasurementEngine {
        &self.engine
    }

    fn denom_plan(&self, psi: &Circuit) -> VqlsResult<Plan> {
        let mut plan = Plan::default();
        for (idx, term) in self.product.terms().iter().enumerate() {
            if term.is_identity() {
                plan.constant += term.coeff.re;
                continue;
            }
            let circuit = protocol::hadamard_test(psi, term)?;
            plan.push(CircuitTag::HadamardTest { term: idx }, circuit, term.coeff.re);
        }
        Ok(plan)
    }

    fn numer_plan(&self, psi: &Circuit) -> VqlsResult<Plan> {
        let mut plan = Plan::default();
        let terms = self.operator.terms();
        match self.mode {
            EstimationMode::SwapTest => {
                for (k, tk) in terms.iter().enumerate() {
                    for (l, tl) in terms.iter().enumerate().skip(k) {
                        let w: Complex64 = tk.coeff * tl.coeff.conj();
                        let scale = if k == l { 1.0 } else { 2.0 };
                        let quadratures = [
                            (Quadrature::Real, scale * w.re),
                            (Quadrature::Imaginary, -scale * w.im),
                        ];
                        for (quadrature, weight) in quadratures {
                            if quadrature == Quadrature::Imaginary && w.im.abs() < COEFF_EPSILON {
                                continue;
                            }
                            let circuit = protocol::swap_test(psi, tk, tl, quadrature)?;
                            plan.push(CircuitTag::SwapTest { k, l, quadrature }, circuit, weight);
                        }
                    }
                }
            }
            EstimationMode::Surrogate => {
                for (term_idx, term) in terms.iter().enumerate() {
                    let circuit = protocol::surrogate(psi, term, Quadrature::Real)?;
                    plan.push(
                        CircuitTag::Surrogate {
                            term: term_idx,
                            quadrature: Quadrature::Real,
                        },
                        circuit,
                        term.coeff.re,
                    );
                    if term.coeff.im.abs() >= COEFF_EPSILON {
                        let quadrature = Quadrature::Imaginary;
                        let circuit = protocol::surrogate(psi, term, quadrature)?;
                        plan.push(
                            CircuitTag::Surrogate {
                                term: term_idx,
                                quadrature,
                            },
                            circuit,
                            -term.coeff.im,
                        );
                    }
                }
            }
        }
        Ok(plan)
    }

    /// ⟨ψ(θ)|A·A|ψ(θ)⟩ from Hadamard tests. Identity terms need no circuit.
    pub async fn denom(&self, theta: &[f64]) -> VqlsResult<f64> {
        let psi = self.ansatz.build(theta)?;
        let (value, _) = self.denom_plan(&psi)?.run(&self.engine).await?;
        Ok(value)
    }

    /// Numerator of the active estimation mode.
    pub async fn numer(&self, theta: &[f64]) -> VqlsResult<f64> {
        let psi = self.ansatz.build(theta)?;
        let (value, _) = self.numer_plan(&psi)?.run(&self.engine).await?;
        Ok(value)
    }

    /// Evaluate C(θ) with its parts.
    ///
    /// Every circuit is built before the first one is submitted, so parameter
    /// and operator errors surface without touching the backend.
    pub async fn evaluate(&self, theta: &[f64]) -> VqlsResult<CostEstimate> {
        let psi = self.ansatz.build(theta)?;
        let denom_plan = self.denom_plan(&psi)?;
        let numer_plan = self.numer_plan(&psi)?;
        let circuits_executed = denom_plan.jobs.len() + numer_plan.jobs.len();

        let (denom, mut measurements) = denom_plan.run(&self.engine).await?;
        let (numer, numer_records) = numer_plan.run(&self.engine).await?;
        measurements.extend(numer_records);

        let cost = denom - 2.0 * numer + 1.0;
        debug!(denom, numer, cost, circuits = circuits_executed, "cost evaluated");
        Ok(CostEstimate {
            denom,
            numer,
            cost,
            circuits_executed,
            measurements,
        })
    }
}

#[async_trait]
impl Objective for CostFunction {
    fn num_parameters(&self) -> usize {
        self.ansatz.num_parameters()
    }

    async fn value(&self, theta: &[f64]) -> VqlsResult<f64> {
        Ok(self.evaluate(theta).await?.cost)
    }

    fn describe(&self) -> String {
        format!("A = {}; {}; numerator {}", self.operator, self.ansatz, self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::ansatz::AnsatzVariant;
    use vqls_adapter_sim::SimulatorBackend;

    fn engine(max_qubits: u32) -> MeasurementEngine {
        let backend = Arc::new(SimulatorBackend::with_max_qubits(max_qubits));
        MeasurementEngine::new(backend, 0).unwrap()
    }

    fn cost(labels: &[(f64, &str)], layers: u32, mode: EstimationMode) -> CostFunction {
        let op = PauliOperator::from_labels(labels.iter().copied()).unwrap();
        let n = u32::try_from(op.n_qubits()).unwrap();
        CostFunction::new(op, Ansatz::new(n, layers, AnsatzVariant::Rotation), mode, engine(20))
            .unwrap()
    }

    #[tokio::test]
    async fn test_identity_operator_costs_nothing_to_measure_for_denom() {
        let f = cost(&[(1.0, "III")], 2, EstimationMode::Surrogate);
        let theta = vec![0.4; 6];
        assert!((f.denom(&theta).await.unwrap() - 1.0).abs() < 1e-12);
        assert!(f.product().terms().iter().all(|t| t.is_identity()));
    }

    #[tokio::test]
    async fn test_uniform_state_solves_identity() {
        // Ry(π/2) on each qubit prepares |b⟩ exactly, so A = I has zero cost.
        let f = cost(&[(1.0, "II")], 1, EstimationMode::SwapTest);
        let theta = [std::f64::consts::FRAC_PI_2; 2];
        let est = f.evaluate(&theta).await.unwrap();
        assert!((est.numer - 1.0).abs() < 1e-10);
        assert!(est.cost.abs() < 1e-10);
        assert_eq!(est.circuits_executed, 1);
    }

    #[tokio::test]
    async fn test_example_initial_cost() {
        let f = cost(
            &[(1.0, "IZZI"), (2.0, "ZZZZ"), (-0.5, "IIIZ")],
            8,
            EstimationMode::Surrogate,
        );
        let est = f.evaluate(&vec![0.0; 32]).await.unwrap();
        // ψ = |0000⟩: every Z string has ⟨Z…⟩ = 1, ⟨b|P|0⟩ = 1/4.
        assert!((est.denom - 6.25).abs() < 1e-10);
        assert!((est.numer - 0.625).abs() < 1e-10);
        assert!((est.cost - 6.0).abs() < 1e-10);
        assert!(est.measurements.iter().all(|m| m.z.abs() <= 1.0 + 1e-12));
    }

    #[tokio::test]
    async fn test_swap_numerator_is_squared_overlap() {
        let f = cost(&[(1.0, "ZI"), (0.5, "XX")], 1, EstimationMode::SwapTest);
        let theta = [0.7, -0.3];
        let numer = f.numer(&theta).await.unwrap();
        let surrogate = cost(&[(1.0, "ZI"), (0.5, "XX")], 1, EstimationMode::Surrogate);
        let overlap = surrogate.numer(&theta).await.unwrap();
        // Real ansatz and real |b⟩: the overlap is real, so |⟨b|A|ψ⟩|² = Re².
        assert!((numer - overlap * overlap).abs() < 1e-10);
    }

    #[tokio::test]
    async fn test_complex_coefficients_use_imaginary_quadrature() {
        let op = PauliOperator::from_labels([
            (Complex64::new(1.0, 0.0), "Z"),
            (Complex64::new(0.0, 0.5), "X"),
        ])
        .unwrap();
        let f = CostFunction::new(
            op,
            Ansatz::new(1, 1, AnsatzVariant::Rotation),
            EstimationMode::SwapTest,
            engine(4),
        )
        .unwrap();
        let est = f.evaluate(&[0.9]).await.unwrap();
        let imaginary = est
            .measurements
            .iter()
            .filter(|m| {
                matches!(
                    m.tag,
                    CircuitTag::SwapTest {
                        quadrature: Quadrature::Imaginary,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(imaginary, 1);

        // ψ = Ry(0.9)|0⟩ = (cos .45, sin .45); b = (1, 1)/√2.
        let (c, s) = (0.45_f64.cos(), 0.45_f64.sin());
        let bz = (c - s) / 2f64.sqrt();
        let bx = (s + c) / 2f64.sqrt();
        let amp = Complex64::new(bz, 0.5 * bx);
        assert!((est.numer - amp.norm_sqr()).abs() < 1e-10);
    }

    #[tokio::test]
    async fn test_surrogate_reads_imaginary_quadrature() {
        let op = PauliOperator::from_labels([
            (Complex64::new(0.0, 0.5), "Y"),
            (Complex64::new(0.3, 0.2), "X"),
        ])
        .unwrap();
        let ansatz = Ansatz::new(1, 1, AnsatzVariant::Rotation);
        let surrogate =
            CostFunction::new(op.clone(), ansatz, EstimationMode::Surrogate, engine(4)).unwrap();
        let est = surrogate.evaluate(&[0.9]).await.unwrap();
        let imaginary: Vec<usize> = est
            .measurements
            .iter()
            .filter_map(|m| match m.tag {
                CircuitTag::Surrogate {
                    term,
                    quadrature: Quadrature::Imaginary,
                } => Some(term),
                _ => None,
            })
            .collect();
        assert_eq!(imaginary, [0, 1]);

        // ⟨b|Y|ψ⟩ = i(c − s)/√2 and ⟨b|X|ψ⟩ = (c + s)/√2 for ψ = Ry(0.9)|0⟩.
        let (c, s) = (0.45_f64.cos(), 0.45_f64.sin());
        let amp = Complex64::new(0.0, 0.5) * Complex64::new(0.0, (c - s) / 2f64.sqrt())
            + Complex64::new(0.3, 0.2) * ((c + s) / 2f64.sqrt());
        assert!((est.numer - amp.re).abs() < 1e-10, "numer = {}", est.numer);
        assert!((est.numer - 0.118_711_212_567_3).abs() < 1e-10);

        let swap = CostFunction::new(op, ansatz, EstimationMode::SwapTest, engine(4)).unwrap();
        let numer = swap.numer(&[0.9]).await.unwrap();
        assert!((numer - amp.norm_sqr()).abs() < 1e-10, "numer = {numer}");
    }

    #[tokio::test]
    async fn test_parameter_count_checked_before_backend() {
        let f = cost(&[(1.0, "ZZ")], 3, EstimationMode::Surrogate);
        let err = f.evaluate(&[0.0; 5]).await.unwrap_err();
        assert!(matches!(err, VqlsError::ParameterCount { expected: 6, got: 5, .. }));
    }

    #[test]
    fn test_swap_test_width_checked_up_front() {
        let op = PauliOperator::from_labels([(1.0, "ZZZ")]).unwrap();
        let err = CostFunction::new(
            op,
            Ansatz::new(3, 1, AnsatzVariant::Rotation),
            EstimationMode::SwapTest,
            engine(6),
        )
        .unwrap_err();
        assert!(matches!(err, VqlsError::Config(_)));
    }

    #[test]
    fn test_ansatz_width_must_match() {
        let op = PauliOperator::from_labels([(1.0, "ZZZ")]).unwrap();
        let err = CostFunction::new(
            op,
            Ansatz::new(2, 1, AnsatzVariant::Rotation),
            EstimationMode::Surrogate,
            engine(6),
        )
        .unwrap_err();
        assert!(matches!(err, VqlsError::InvalidOperator(_)));
    }
}
