//! Circuit instructions combining gates with operands.

use serde::{Deserialize, Serialize};

use crate::gate::{Gate, StandardGate};
use crate::qubit::{ClbitId, QubitId};

/// The kind of instruction in a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// A quantum gate operation.
    Gate(Gate),
    /// Computational-basis measurement.
    Measure,
}

/// A complete instruction with operands.
///
/// A gate applies to `qubits` only when every qubit in `controls` is |1⟩.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The kind of instruction.
    pub kind: InstructionKind,
    /// Control qubits (empty for an uncontrolled gate).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controls: Vec<QubitId>,
    /// Target qubits this instruction operates on.
    pub qubits: Vec<QubitId>,
    /// Classical bits this instruction operates on (for measure).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clbits: Vec<ClbitId>,
}

impl Instruction {
    /// Create a gate instruction.
    pub fn gate(gate: impl Into<Gate>, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Gate(gate.into()),
            controls: vec![],
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
        }
    }

    /// Create a single-qubit gate instruction.
    pub fn single_qubit_gate(gate: StandardGate, qubit: QubitId) -> Self {
        Self::gate(gate, [qubit])
    }

    /// Create a controlled gate instruction.
    pub fn controlled(
        gate: impl Into<Gate>,
        controls: impl IntoIterator<Item = QubitId>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> Self {
        Self {
            kind: InstructionKind::Gate(gate.into()),
            controls: controls.into_iter().collect(),
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
        }
    }

    /// Create a measurement instruction.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure,
            controls: vec![],
            qubits: vec![qubit],
            clbits: vec![clbit],
        }
    }

    /// Return a copy with `control` prepended to the control set.
    ///
    /// Measurements are returned unchanged.
    #[must_use]
    pub fn with_extra_control(&self, control: QubitId) -> Self {
        let mut inst = self.clone();
        if inst.is_gate() {
            inst.controls.insert(0, control);
        }
        inst
    }

    /// Check if this is a gate instruction.
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate(_))
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure)
    }

    /// Get the gate if this is a gate instruction.
    pub fn as_gate(&self) -> Option<&Gate> {
        match &self.kind {
            InstructionKind::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// Display name, with one `c` prefix per control (`cx`, `ccx`, `cswap`).
    pub fn name(&self) -> String {
        match &self.kind {
            InstructionKind::Gate(g) => format!("{}{}", "c".repeat(self.controls.len()), g.name()),
            InstructionKind::Measure => "measure".into(),
        }
    }

    /// Every qubit touched, controls first.
    pub fn operands(&self) -> impl Iterator<Item = QubitId> + '_ {
        self.controls.iter().chain(self.qubits.iter()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::CustomGate;

    #[test]
    fn test_controlled_names() {
        let cx = Instruction::controlled(StandardGate::X, [QubitId(0)], [QubitId(1)]);
        assert_eq!(cx.name(), "cx");

        let ccx = cx.with_extra_control(QubitId(2));
        assert_eq!(ccx.name(), "ccx");
        assert_eq!(ccx.controls, vec![QubitId(2), QubitId(0)]);

        let cswap = Instruction::controlled(CustomGate::swap(), [QubitId(0)], [QubitId(1), QubitId(2)]);
        assert_eq!(cswap.name(), "cswap");
    }

    #[test]
    fn test_measure_ignores_extra_control() {
        let m = Instruction::measure(QubitId(0), ClbitId(0));
        assert!(m.with_extra_control(QubitId(1)).controls.is_empty());
        assert!(m.is_measure());
    }
}
