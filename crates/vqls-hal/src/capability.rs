//! Backend capability introspection.
//!
//! The measurement engine checks these before building circuits: the swap
//! test needs `2n + 1` qubits, the surrogate needs multi-controlled gates, and
//! an exact-expectation backend allows `shots = 0`.

use serde::{Deserialize, Serialize};

use vqls_ir::{GateKind, Instruction, InstructionKind};

/// Hardware capabilities of a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Number of qubits available.
    pub num_qubits: u32,
    /// Supported gate set.
    pub gate_set: GateSet,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Whether this is a simulator.
    pub is_simulator: bool,
    /// Whether `shots = 0` returns an exact ⟨Z⟩ instead of samples.
    pub exact_expectation: bool,
    /// Additional capability flags such as `"statevector"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Capabilities {
    /// Create capabilities for a statevector simulator.
    pub fn simulator(num_qubits: u32) -> Self {
        Self {
            name: "simulator".into(),
            num_qubits,
            gate_set: GateSet::universal(),
            max_shots: 100_000,
            is_simulator: true,
            exact_expectation: true,
            features: vec!["statevector".into()],
        }
    }

    /// Set the shot limit.
    #[must_use]
    pub fn with_max_shots(mut self, max_shots: u32) -> Self {
        self.max_shots = max_shots;
        self
    }

    /// Check if a capability flag is present.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

/// Gates a backend accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSet {
    /// Single-qubit gate names (`h`, `ry`, ...).
    pub single_qubit: Vec<String>,
    /// Largest control set a gate may carry.
    pub max_controls: u32,
    /// Whether gates given by an explicit unitary are accepted.
    pub custom_unitaries: bool,
}

impl GateSet {
    /// Everything the IR can express.
    pub fn universal() -> Self {
        Self {
            single_qubit: ["id", "x", "y", "z", "h", "rx", "ry", "rz"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_controls: u32::MAX,
            custom_unitaries: true,
        }
    }

    /// Check whether an instruction can run as-is.
    ///
    /// Measurements are always supported.
    pub fn supports(&self, inst: &Instruction) -> bool {
        let InstructionKind::Gate(gate) = &inst.kind else {
            return true;
        };
        let within_limit =
            u32::try_from(inst.controls.len()).is_ok_and(|c| c <= self.max_controls);
        if !within_limit {
            return false;
        }
        match &gate.kind {
            GateKind::Standard(g) => self.single_qubit.iter().any(|n| n == g.name()),
            GateKind::Custom(_) => self.custom_unitaries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vqls_ir::{CustomGate, QubitId, StandardGate};

    #[test]
    fn test_simulator_capabilities() {
        let caps = Capabilities::simulator(12);
        assert_eq!(caps.num_qubits, 12);
        assert!(caps.is_simulator);
        assert!(caps.exact_expectation);
        assert!(caps.has_feature("statevector"));
    }

    #[test]
    fn test_gate_set_limits_controls() {
        let restricted = GateSet {
            single_qubit: vec!["x".into(), "ry".into()],
            max_controls: 1,
            custom_unitaries: false,
        };
        let cx = Instruction::controlled(StandardGate::X, [QubitId(0)], [QubitId(1)]);
        let ccx = cx.with_extra_control(QubitId(2));
        let cswap = Instruction::controlled(CustomGate::swap(), [QubitId(0)], [QubitId(1), QubitId(2)]);
        let h = Instruction::single_qubit_gate(StandardGate::H, QubitId(0));

        assert!(restricted.supports(&cx));
        assert!(!restricted.supports(&ccx));
        assert!(!restricted.supports(&cswap));
        assert!(!restricted.supports(&h));
        assert!(GateSet::universal().supports(&ccx));
    }
}
