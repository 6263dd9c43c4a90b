//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors that can occur while building circuits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit not found in circuit.
    #[error("Qubit {qubit} not found in circuit{}", format_gate_context(.gate_name))]
    QubitNotFound {
        /// The qubit that was not found.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Classical bit not found in circuit.
    #[error("Classical bit {clbit} not found in circuit")]
    ClbitNotFound {
        /// The classical bit that was not found.
        clbit: ClbitId,
    },

    /// Gate requires different number of target qubits.
    #[error("Gate '{gate_name}' requires {expected} target qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Duplicate qubit across the controls and targets of one instruction.
    #[error("Duplicate qubit {qubit} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Custom gate matrix has the wrong number of entries.
    #[error("Matrix for '{gate_name}' has {got} entries, expected {expected}")]
    MatrixDimension {
        /// Name of the gate.
        gate_name: String,
        /// Expected `(2^n)^2` entries.
        expected: usize,
        /// Entries supplied.
        got: usize,
    },

    /// Attempted to compose circuits with an incompatible qubit mapping.
    #[error("Qubit mapping has {got} entries, circuit '{circuit}' has {expected} qubits")]
    MappingMismatch {
        /// Name of the circuit being composed.
        circuit: String,
        /// Number of qubits in the source circuit.
        expected: usize,
        /// Entries in the supplied mapping.
        got: usize,
    },
}

#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
