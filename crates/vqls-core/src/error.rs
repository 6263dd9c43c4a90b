//! Error types for the solver crate.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use vqls_hal::HalError;

/// Identity of one measurement circuit, carried in failures and records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "protocol", rename_all = "snake_case")]
pub enum CircuitTag {
    /// Hadamard test of term `term` of the operator product.
    HadamardTest {
        /// Index into the product operator.
        term: usize,
    },
    /// Swap test of the term pair `(k, l)`.
    SwapTest {
        /// Term injected on the ancilla |1⟩ branch.
        k: usize,
        /// Term injected on the ancilla |0⟩ branch.
        l: usize,
        /// Which part of the overlap is read out.
        quadrature: Quadrature,
    },
    /// Surrogate overlap of term `term` against |b⟩.
    Surrogate {
        /// Index into the operator.
        term: usize,
        /// Which part of the overlap is read out.
        quadrature: Quadrature,
    },
}

/// Real or imaginary part of an interference readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrature {
    /// ⟨Z⟩ = Re⟨φ₀|φ₁⟩.
    Real,
    /// ⟨Z⟩ = Im⟨φ₀|φ₁⟩, read with a phase rotation on the ancilla.
    Imaginary,
}

impl fmt::Display for CircuitTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let q = |q: &Quadrature| match q {
            Quadrature::Real => "re",
            Quadrature::Imaginary => "im",
        };
        match self {
            CircuitTag::HadamardTest { term } => write!(f, "hadamard_test[{term}]"),
            CircuitTag::SwapTest { k, l, quadrature } => {
                write!(f, "swap_test[{k},{l}].{}", q(quadrature))
            }
            CircuitTag::Surrogate { term, quadrature } => {
                write!(f, "surrogate[{term}].{}", q(quadrature))
            }
        }
    }
}

/// Errors produced by the solver.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VqlsError {
    /// Operator specification is malformed.
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    /// Parameter vector length does not match the ansatz.
    #[error(
        "Ansatz variant {variant} on {qubits} qubits with {layers} layers needs {expected} parameters, got {got}"
    )]
    ParameterCount {
        /// Ansatz variant name.
        variant: &'static str,
        /// Qubit count of the ansatz.
        qubits: u32,
        /// Layer count of the ansatz.
        layers: u32,
        /// Required parameter count.
        expected: usize,
        /// Supplied parameter count.
        got: usize,
    },

    /// A backend execution failed or returned no usable statistics.
    #[error("Measurement of {circuit} failed: {source}")]
    MeasurementFailed {
        /// The circuit that failed.
        circuit: CircuitTag,
        /// Underlying backend error.
        #[source]
        source: HalError,
    },

    /// An optimizer iteration aborted.
    #[error("Iteration {iteration} aborted ({context}): {source}")]
    Aborted {
        /// Descent step index. The initial evaluation is iteration 0.
        iteration: usize,
        /// Operator and ansatz description.
        context: String,
        /// The failure that stopped the iteration.
        #[source]
        source: Box<VqlsError>,
    },

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// File being parsed.
        path: String,
        /// Parser message.
        message: String,
    },

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Circuit construction failed.
    #[error("Circuit IR error: {0}")]
    Ir(#[from] vqls_ir::IrError),
}

impl VqlsError {
    /// Innermost error, looking through [`VqlsError::Aborted`].
    pub fn root(&self) -> &VqlsError {
        match self {
            VqlsError::Aborted { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type for solver operations.
pub type VqlsResult<T> = Result<T, VqlsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_display() {
        assert_eq!(CircuitTag::HadamardTest { term: 3 }.to_string(), "hadamard_test[3]");
        let swap = CircuitTag::SwapTest {
            k: 0,
            l: 2,
            quadrature: Quadrature::Imaginary,
        };
        assert_eq!(swap.to_string(), "swap_test[0,2].im");
    }

    #[test]
    fn test_root_unwraps_abort() {
        let err = VqlsError::Aborted {
            iteration: 4,
            context: "ctx".into(),
            source: Box::new(VqlsError::MeasurementFailed {
                circuit: CircuitTag::HadamardTest { term: 1 },
                source: HalError::JobCancelled,
            }),
        };
        assert!(err.to_string().starts_with("Iteration 4 aborted (ctx)"));
        assert!(matches!(err.root(), VqlsError::MeasurementFailed { .. }));
    }
}
