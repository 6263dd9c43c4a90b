//! Quantum gate types.
//!
//! Only single-qubit standard gates exist here. Multi-qubit operations are
//! either a [`CustomGate`] carrying an explicit unitary, or a single-qubit
//! gate placed under a control set on an [`Instruction`](crate::Instruction).

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_1_SQRT_2;

use crate::error::{IrError, IrResult};

/// Standard single-qubit gates with known semantics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// Rotation around X axis.
    Rx(f64),
    /// Rotation around Y axis.
    Ry(f64),
    /// Rotation around Z axis.
    Rz(f64),
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
        }
    }

    /// Rotation angle, if the gate has one.
    pub fn angle(&self) -> Option<f64> {
        match self {
            StandardGate::Rx(t) | StandardGate::Ry(t) | StandardGate::Rz(t) => Some(*t),
            _ => None,
        }
    }

    /// Row-major 2×2 unitary.
    pub fn matrix(&self) -> [Complex64; 4] {
        let zero = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);
        let i = Complex64::new(0.0, 1.0);
        match *self {
            StandardGate::I => [one, zero, zero, one],
            StandardGate::X => [zero, one, one, zero],
            StandardGate::Y => [zero, -i, i, zero],
            StandardGate::Z => [one, zero, zero, -one],
            StandardGate::H => {
                let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
                [h, h, h, -h]
            }
            StandardGate::Rx(theta) => {
                let (s, c) = (theta / 2.0).sin_cos();
                [
                    Complex64::new(c, 0.0),
                    Complex64::new(0.0, -s),
                    Complex64::new(0.0, -s),
                    Complex64::new(c, 0.0),
                ]
            }
            StandardGate::Ry(theta) => {
                let (s, c) = (theta / 2.0).sin_cos();
                [
                    Complex64::new(c, 0.0),
                    Complex64::new(-s, 0.0),
                    Complex64::new(s, 0.0),
                    Complex64::new(c, 0.0),
                ]
            }
            StandardGate::Rz(theta) => [
                Complex64::from_polar(1.0, -theta / 2.0),
                zero,
                zero,
                Complex64::from_polar(1.0, theta / 2.0),
            ],
        }
    }
}

/// A named gate with an explicit unitary.
///
/// The matrix is row-major over `2^num_qubits` basis states. Target
/// `qubits[k]` of the owning instruction is bit `k` of the local basis index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomGate {
    /// The name of the gate.
    pub name: String,
    /// The number of qubits it operates on.
    pub num_qubits: u32,
    /// Unitary matrix (row-major, 2^n × 2^n).
    pub matrix: Vec<Complex64>,
}

impl CustomGate {
    /// Create a custom gate, checking the matrix dimension.
    pub fn new(name: impl Into<String>, num_qubits: u32, matrix: Vec<Complex64>) -> IrResult<Self> {
        let name = name.into();
        let dim = 1usize << num_qubits;
        if matrix.len() != dim * dim {
            return Err(IrError::MatrixDimension {
                gate_name: name,
                expected: dim * dim,
                got: matrix.len(),
            });
        }
        Ok(Self {
            name,
            num_qubits,
            matrix,
        })
    }

    /// The fixed two-qubit swap unitary.
    pub fn swap() -> Self {
        let zero = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);
        #[rustfmt::skip]
        let matrix = vec![
            one,  zero, zero, zero,
            zero, zero, one,  zero,
            zero, one,  zero, zero,
            zero, zero, zero, one,
        ];
        Self {
            name: "swap".into(),
            num_qubits: 2,
            matrix,
        }
    }
}

/// The operation carried by a gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateKind {
    /// A standard single-qubit gate.
    Standard(StandardGate),
    /// A gate defined by its unitary.
    Custom(CustomGate),
}

/// A gate with an optional label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// The gate operation.
    pub kind: GateKind,
    /// Optional label, carried through to circuit listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Gate {
    /// Create a standard gate.
    pub fn standard(gate: StandardGate) -> Self {
        Self {
            kind: GateKind::Standard(gate),
            label: None,
        }
    }

    /// Create a custom gate.
    pub fn custom(gate: CustomGate) -> Self {
        Self {
            kind: GateKind::Custom(gate),
            label: None,
        }
    }

    /// Add a label to the gate.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &str {
        match &self.kind {
            GateKind::Standard(g) => g.name(),
            GateKind::Custom(g) => &g.name,
        }
    }

    /// Number of target qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match &self.kind {
            GateKind::Standard(_) => 1,
            GateKind::Custom(g) => g.num_qubits,
        }
    }

    /// Row-major unitary over the target qubits.
    pub fn matrix(&self) -> Vec<Complex64> {
        match &self.kind {
            GateKind::Standard(g) => g.matrix().to_vec(),
            GateKind::Custom(g) => g.matrix.clone(),
        }
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Gate::standard(gate)
    }
}

impl From<CustomGate> for Gate {
    fn from(gate: CustomGate) -> Self {
        Gate::custom(gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn is_unitary(m: &[Complex64], dim: usize) -> bool {
        for r in 0..dim {
            for c in 0..dim {
                let dot: Complex64 = (0..dim).map(|k| m[r * dim + k] * m[c * dim + k].conj()).sum();
                let expected = if r == c { 1.0 } else { 0.0 };
                if (dot - Complex64::new(expected, 0.0)).norm() > 1e-12 {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn test_standard_gates_are_unitary() {
        for gate in [
            StandardGate::I,
            StandardGate::X,
            StandardGate::Y,
            StandardGate::Z,
            StandardGate::H,
            StandardGate::Rx(0.3),
            StandardGate::Ry(-1.1),
            StandardGate::Rz(PI / 3.0),
        ] {
            assert!(is_unitary(&gate.matrix(), 2), "{} is not unitary", gate.name());
        }
    }

    #[test]
    fn test_ry_pi_is_bit_flip_up_to_sign() {
        let m = StandardGate::Ry(PI).matrix();
        assert!(m[0].norm() < 1e-12);
        assert!((m[2] - Complex64::new(1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_custom_gate_dimension_check() {
        assert!(CustomGate::new("bad", 2, vec![Complex64::new(1.0, 0.0); 4]).is_err());
        let swap = CustomGate::swap();
        assert!(is_unitary(&swap.matrix, 4));
        assert_eq!(Gate::custom(swap).num_qubits(), 2);
    }
}
