//! VQLS Local Statevector Simulator
//!
//! Exact statevector backend for the measurement engine. It runs every gate
//! the engine emits, including multi-controlled gates and the controlled swap
//! unitary, and is limited by memory to roughly 20–25 qubits.
//!
//! # Readout modes
//!
//! | Shots | Result |
//! |-------|--------|
//! | 0 | `expectation` holds the exact ⟨Z⟩ of the first measured qubit |
//! | n > 0 | `counts` holds n samples from the final state |
//!
//! # Example
//!
//! ```ignore
//! use vqls_adapter_sim::SimulatorBackend;
//! use vqls_hal::Backend;
//! use vqls_ir::{Circuit, ClbitId, QubitId};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SimulatorBackend::new().with_seed(7);
//!
//!     let mut circuit = Circuit::with_size("plus", 1, 1);
//!     circuit.h(QubitId(0))?;
//!     circuit.measure(QubitId(0), ClbitId(0))?;
//!
//!     let exact = backend.execute(&circuit, 0).await?;
//!     println!("<Z> = {:?}", exact.expectation);
//!
//!     let sampled = backend.execute(&circuit, 1000).await?;
//!     println!("counts: {:?}", sampled.counts);
//!     Ok(())
//! }
//! ```

mod simulator;
mod statevector;

pub use simulator::SimulatorBackend;
