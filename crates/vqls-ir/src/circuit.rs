//! High-level circuit builder API.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{IrError, IrResult};
use crate::gate::{CustomGate, Gate, StandardGate};
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{Clbit, ClbitId, Qubit, QubitId};

/// A quantum circuit as an ordered instruction list.
///
/// Every instruction is validated on insertion, so a built circuit only
/// references qubits and classical bits it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Qubits in the circuit.
    qubits: Vec<Qubit>,
    /// Classical bits in the circuit.
    clbits: Vec<Clbit>,
    /// Instructions in application order.
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qubits: vec![],
            clbits: vec![],
            instructions: vec![],
        }
    }

    /// Create a circuit with a given number of qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        for _ in 0..num_qubits {
            circuit.add_qubit();
        }
        for _ in 0..num_clbits {
            circuit.add_clbit();
        }
        circuit
    }

    /// Add a single qubit to the circuit.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_qubit(&mut self) -> QubitId {
        let id = QubitId(self.qubits.len() as u32);
        self.qubits.push(Qubit::new(id));
        id
    }

    /// Add a quantum register with multiple qubits.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_qreg(&mut self, name: impl Into<String>, size: u32) -> Vec<QubitId> {
        let name = name.into();
        (0..size)
            .map(|i| {
                let id = QubitId(self.qubits.len() as u32);
                self.qubits.push(Qubit::with_register(id, &name, i));
                id
            })
            .collect()
    }

    /// Add a single classical bit to the circuit.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_clbit(&mut self) -> ClbitId {
        let id = ClbitId(self.clbits.len() as u32);
        self.clbits.push(Clbit::new(id));
        id
    }

    /// Append an instruction after validating its operands.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        let gate_name = instruction.as_gate().map(|_| instruction.name());

        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits();
            let got = u32::try_from(instruction.qubits.len()).unwrap_or(u32::MAX);
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected,
                    got,
                });
            }
        }

        let mut seen = FxHashSet::default();
        for qubit in instruction.operands() {
            if qubit.index() >= self.qubits.len() {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        for &clbit in &instruction.clbits {
            if clbit.0 as usize >= self.clbits.len() {
                return Err(IrError::ClbitNotFound { clbit });
            }
        }

        self.instructions.push(instruction);
        Ok(self)
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::H, qubit))
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::X, qubit))
    }

    /// Apply Rx rotation gate.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Rx(theta), qubit))
    }

    /// Apply Ry rotation gate.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Ry(theta), qubit))
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Rz(theta), qubit))
    }

    // =========================================================================
    // Controlled gates
    // =========================================================================

    /// Apply a gate under an arbitrary control set.
    pub fn controlled(
        &mut self,
        gate: impl Into<Gate>,
        controls: impl IntoIterator<Item = QubitId>,
        targets: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::controlled(gate, controls, targets))
    }

    /// Apply CNOT (CX) gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.controlled(StandardGate::X, [control], [target])
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.controlled(StandardGate::Z, [control], [target])
    }

    /// Apply controlled-Hadamard gate.
    pub fn ch(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.controlled(StandardGate::H, [control], [target])
    }

    /// Apply controlled-Ry gate.
    pub fn cry(&mut self, theta: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.controlled(StandardGate::Ry(theta), [control], [target])
    }

    /// Apply Toffoli (CCX) gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.controlled(StandardGate::X, [c1, c2], [target])
    }

    /// Apply Fredkin (CSWAP) gate as the swap unitary under one control.
    pub fn cswap(&mut self, control: QubitId, t1: QubitId, t2: QubitId) -> IrResult<&mut Self> {
        self.controlled(CustomGate::swap(), [control], [t1, t2])
    }

    /// Apply an uncontrolled gate to the given targets.
    pub fn gate(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(gate, qubits))
    }

    // =========================================================================
    // Non-unitary operations
    // =========================================================================

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.apply(Instruction::measure(qubit, clbit))
    }

    // =========================================================================
    // Composition
    // =========================================================================

    /// Append the gates of `other`, relabelling its qubit `i` to `mapping[i]`.
    ///
    /// When `control` is given every gate gains it as an extra control, so the
    /// appended block acts only on the |1⟩ branch of that qubit. Measurements
    /// in `other` are skipped.
    pub fn compose(
        &mut self,
        other: &Circuit,
        mapping: &[QubitId],
        control: Option<QubitId>,
    ) -> IrResult<&mut Self> {
        if mapping.len() != other.num_qubits() {
            return Err(IrError::MappingMismatch {
                circuit: other.name.clone(),
                expected: other.num_qubits(),
                got: mapping.len(),
            });
        }
        for inst in other.instructions.iter().filter(|i| i.is_gate()) {
            let mut mapped = Instruction {
                kind: inst.kind.clone(),
                controls: inst.controls.iter().map(|q| mapping[q.index()]).collect(),
                qubits: inst.qubits.iter().map(|q| mapping[q.index()]).collect(),
                clbits: vec![],
            };
            if let Some(c) = control {
                mapped = mapped.with_extra_control(c);
            }
            self.apply(mapped)?;
        }
        Ok(self)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// Get the qubits.
    pub fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    /// Instructions in application order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of gate and measurement instructions.
    pub fn num_ops(&self) -> usize {
        self.instructions.len()
    }

    /// Qubits read out by measurement instructions, in order.
    pub fn measured_qubits(&self) -> Vec<QubitId> {
        self.instructions
            .iter()
            .filter(|i| i.is_measure())
            .flat_map(|i| i.qubits.iter().copied())
            .collect()
    }

    /// Count instructions by display name.
    pub fn count_ops(&self) -> FxHashMap<String, usize> {
        let mut counts = FxHashMap::default();
        for inst in &self.instructions {
            *counts.entry(inst.name()).or_insert(0) += 1;
        }
        counts
    }

    /// Calculate the circuit depth.
    pub fn depth(&self) -> usize {
        let mut levels = vec![0usize; self.qubits.len()];
        for inst in &self.instructions {
            let next = inst.operands().map(|q| levels[q.index()]).max().unwrap_or(0) + 1;
            for q in inst.operands() {
                levels[q.index()] = next;
            }
        }
        levels.into_iter().max().unwrap_or(0)
    }
}
