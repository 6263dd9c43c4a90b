//! VQLS circuit intermediate representation
//!
//! Measurement circuits in the solver are short, fixed gate lists built once
//! per evaluation and handed to a backend. This crate provides the data
//! structures for them.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`]
//! - **Gates**: [`StandardGate`] for single-qubit gates and [`CustomGate`] for
//!   operations defined by an explicit unitary
//! - **Instructions**: [`Instruction`] combining a gate with its control set
//!   and targets
//! - **Circuit**: [`Circuit`] builder API
//!
//! # Example: Hadamard test skeleton
//!
//! ```rust
//! use vqls_ir::{Circuit, ClbitId, QubitId};
//!
//! let mut circuit = Circuit::with_size("hadamard_test", 2, 1);
//! let anc = QubitId(1);
//!
//! circuit.h(anc).unwrap();
//! circuit.cz(anc, QubitId(0)).unwrap();
//! circuit.h(anc).unwrap();
//! circuit.measure(anc, ClbitId(0)).unwrap();
//!
//! assert_eq!(circuit.depth(), 4);
//! assert_eq!(circuit.measured_qubits(), vec![anc]);
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Targets | Description |
//! |------|---------|-------------|
//! | `H` | 1 | Hadamard gate |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `Rx`, `Ry`, `Rz` | 1 | Rotation gates |
//! | `swap` (custom) | 2 | Fixed 4×4 swap unitary |
//!
//! Any of them may carry a control set: `cx`, `ccx`, `cry`, `cswap` are
//! instructions, not distinct gates.

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::{CustomGate, Gate, GateKind, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use qubit::{Clbit, ClbitId, Qubit, QubitId};
