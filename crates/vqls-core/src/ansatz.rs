//! Hardware-efficient layered ansatz.
//!
//! | Variant | Per layer | Parameters |
//! |---------|-----------|------------|
//! | [`AnsatzVariant::Rotation`] | Ry on every qubit, then CX(j → j+1) where `layer + j` is even | `n · L` |
//! | [`AnsatzVariant::Paired`] | for even j: Ry(j), Ry(j+1), CX(j+1 → j) | `2 · ⌊n/2⌋ · L` |
//! | [`AnsatzVariant::RotationXy`] | for each j: Ry(j), Rx(j), then CX(j+1 → j) if j < n−1 | `2 · n · L` |
//!
//! Entanglers never wrap from the last qubit to the first.

use std::fmt;

use serde::{Deserialize, Serialize};

use vqls_ir::{Circuit, QubitId};

use crate::error::{VqlsError, VqlsResult};

/// Ansatz variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnsatzVariant {
    /// One Ry per qubit per layer, staggered CX entanglers.
    #[default]
    #[serde(alias = "r")]
    Rotation,
    /// Ry pairs on (j, j+1) for even j, each followed by CX(j+1 → j).
    #[serde(alias = "p")]
    Paired,
    /// Ry then Rx on each qubit, each followed by CX(j+1 → j).
    #[serde(alias = "xy")]
    RotationXy,
}

impl AnsatzVariant {
    /// Short name used in errors and reports.
    pub fn name(self) -> &'static str {
        match self {
            AnsatzVariant::Rotation => "rotation",
            AnsatzVariant::Paired => "paired",
            AnsatzVariant::RotationXy => "rotation_xy",
        }
    }
}

impl fmt::Display for AnsatzVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for AnsatzVariant {
    type Err = VqlsError;

    fn from_str(s: &str) -> VqlsResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rotation" | "r" => Ok(AnsatzVariant::Rotation),
            "paired" | "p" => Ok(AnsatzVariant::Paired),
            "rotation_xy" | "rotation-xy" | "xy" => Ok(AnsatzVariant::RotationXy),
            other => Err(VqlsError::Config(format!(
                "unknown ansatz variant '{other}', expected rotation, paired or rotation_xy"
            ))),
        }
    }
}

/// Structure of the ansatz: qubit count, layer count and variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ansatz {
    /// Number of system qubits.
    pub n_qubits: u32,
    /// Number of layers.
    pub layers: u32,
    /// Variant.
    pub variant: AnsatzVariant,
}

impl Ansatz {
    /// Create an ansatz description.
    pub fn new(n_qubits: u32, layers: u32, variant: AnsatzVariant) -> Self {
        Self {
            n_qubits,
            layers,
            variant,
        }
    }

    /// Required length of θ.
    pub fn num_parameters(&self) -> usize {
        let n = self.n_qubits as usize;
        let layers = self.layers as usize;
        match self.variant {
            AnsatzVariant::Rotation => n * layers,
            AnsatzVariant::Paired => 2 * (n / 2) * layers,
            AnsatzVariant::RotationXy => 2 * n * layers,
        }
    }

    /// A zero parameter vector of the required length.
    pub fn zero_parameters(&self) -> Vec<f64> {
        vec![0.0; self.num_parameters()]
    }

    /// Check θ against [`num_parameters`](Self::num_parameters).
    pub fn check_parameters(&self, theta: &[f64]) -> VqlsResult<()> {
        let expected = self.num_parameters();
        if theta.len() != expected {
            return Err(VqlsError::ParameterCount {
                variant: self.variant.name(),
                qubits: self.n_qubits,
                layers: self.layers,
                expected,
                got: theta.len(),
            });
        }
        Ok(())
    }

    /// Build V(θ) on a fresh `n_qubits` circuit.
    ///
    /// The gate list depends only on the inputs.
    pub fn build(&self, theta: &[f64]) -> VqlsResult<Circuit> {
        self.check_parameters(theta)?;
        let n = self.n_qubits;
        let mut circuit = Circuit::with_size(format!("ansatz_{}", self.variant), n, 0);
        let mut params = theta.iter().copied();
        // check_parameters guarantees the iterator never runs dry.
        let mut next = move || params.next().unwrap_or_default();

        for layer in 0..self.layers {
            match self.variant {
                AnsatzVariant::Rotation => {
                    for j in 0..n {
                        circuit.ry(next(), QubitId(j))?;
                    }
                    for j in 0..n.saturating_sub(1) {
                        if (layer + j) % 2 == 0 {
                            circuit.cx(QubitId(j), QubitId(j + 1))?;
                        }
                    }
                }
                AnsatzVariant::Paired => {
                    for j in (0..n.saturating_sub(1)).step_by(2) {
                        circuit.ry(next(), QubitId(j))?;
                        circuit.ry(next(), QubitId(j + 1))?;
                        circuit.cx(QubitId(j + 1), QubitId(j))?;
                    }
                }
                AnsatzVariant::RotationXy => {
                    for j in 0..n {
                        circuit.ry(next(), QubitId(j))?;
                        circuit.rx(next(), QubitId(j))?;
                        if j + 1 < n {
                            circuit.cx(QubitId(j + 1), QubitId(j))?;
                        }
                    }
                }
            }
        }
        Ok(circuit)
    }
}

impl fmt::Display for Ansatz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ansatz, {} qubits × {} layers ({} parameters)",
            self.variant,
            self.n_qubits,
            self.layers,
            self.num_parameters()
        )
    }
}
