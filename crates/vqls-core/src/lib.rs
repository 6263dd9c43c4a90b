//! Variational Quantum Linear Solver
//!
//! Finds parameters θ such that the ansatz state |ψ(θ)⟩ = V(θ)|0⟩ solves
//! A|ψ⟩ ∝ |b⟩ for an operator A given as a weighted sum of Pauli strings and
//! |b⟩ = H^⊗n|0⟩, by minimizing
//!
//!   C(θ) = ⟨ψ|A·A|ψ⟩ − 2·numer(θ) + 1
//!
//! with gradient descent. Every expectation value is read from the ancilla of
//! a measurement circuit executed on a [`vqls_hal::Backend`].
//!
//! # Pipeline
//!
//! ```text
//!   GradientDescent ──θ──→ Ansatz::build ──V(θ)──→ protocol::{hadamard_test, swap_test, surrogate}
//!         ↑                                                       │
//!         └──── C(θ) ←── CostFunction ←── MeasurementEngine ←─────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vqls_adapter_sim::SimulatorBackend;
//! use vqls_core::{
//!     Ansatz, AnsatzVariant, CostFunction, EstimationMode, MeasurementEngine, PauliOperator,
//! };
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let a = PauliOperator::from_labels([(1.0, "II"), (0.5, "ZZ")]).unwrap();
//!     let engine = MeasurementEngine::new(Arc::new(SimulatorBackend::new()), 0).unwrap();
//!     let ansatz = Ansatz::new(2, 1, AnsatzVariant::Rotation);
//!     let cost = CostFunction::new(a, ansatz, EstimationMode::Surrogate, engine).unwrap();
//!
//!     // ψ = |00⟩: ⟨A·A⟩ = 2.25, Re⟨b|A|00⟩ = 1.5 / 2
//!     let est = cost.evaluate(&[0.0, 0.0]).await.unwrap();
//!     assert!((est.cost - (2.25 - 1.5 + 1.0)).abs() < 1e-10);
//! });
//! ```
//!
//! # Modules
//!
//! | Module | Role |
//! |--------|------|
//! | [`pauli`] | Pauli strings, operator products, line format |
//! | [`ansatz`] | Layered Ry/CX ansatz variants |
//! | [`protocol`] | Hadamard-test, swap-test and surrogate circuits |
//! | [`engine`] | Concurrent execution and ⟨Z⟩ readout |
//! | [`cost`] | C(θ) assembly |
//! | [`gradient`] | Finite-difference and parameter-shift gradients |
//! | [`optimizer`] | Fixed-budget gradient descent with stop support |
//! | [`config`] | YAML configuration with `VQLS_` overrides |
//! | [`solver`] | Configuration + backend → optimized θ |

pub mod ansatz;
pub mod config;
pub mod cost;
pub mod engine;
pub mod error;
pub mod gradient;
pub mod optimizer;
pub mod pauli;
pub mod protocol;
pub mod solver;

pub use ansatz::{Ansatz, AnsatzVariant};
pub use config::{ProblemConfig, load_operator_file};
pub use cost::{CostEstimate, CostFunction};
pub use engine::{MeasurementEngine, MeasurementRecord};
pub use error::{CircuitTag, Quadrature, VqlsError, VqlsResult};
pub use gradient::{
    Difference, FiniteDifference, GradientEstimator, GradientMethod, Objective, ParameterShift,
};
pub use optimizer::{
    GradientDescent, IterationReport, OptimizationResult, StopHandle, StopSignal, stop_channel,
};
pub use pauli::{Pauli, PauliOperator, PauliTerm};
pub use protocol::EstimationMode;
pub use solver::{SolveReport, Solver};
