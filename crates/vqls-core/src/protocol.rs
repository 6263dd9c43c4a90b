//! Measurement circuit construction.
//!
//! Every protocol interferes two branches of an ancilla prepared in |+⟩ and
//! reads ⟨Z⟩ on it after a closing Hadamard:
//!
//!   ⟨Z⟩ = Re⟨φ₀|φ₁⟩
//!
//! where φ₀ and φ₁ are the register states on the |0⟩ and |1⟩ branches. A
//! phase rotation Rz(−π/2) on the ancilla before the closing Hadamard turns
//! this into Im⟨φ₀|φ₁⟩ ([`Quadrature::Imaginary`]).
//!
//! | Protocol | Qubits | φ₀ | φ₁ | ⟨Z⟩ (real quadrature) |
//! |----------|--------|----|----|-----|
//! | Hadamard test | n + 1 | ψ | P ψ | Re⟨ψ\|P\|ψ⟩ |
//! | Swap test | 2n + 1 | P_l ψ ⊗ b | b ⊗ P_k ψ | Re(⟨b\|P_l\|ψ⟩* ⟨b\|P_k\|ψ⟩) |
//! | Surrogate | n + 1 | b | P_k ψ | Re⟨b\|P_k\|ψ⟩ |
//!
//! |b⟩ = H^⊗n |0⟩ throughout. The readout ancilla is always measured into
//! classical bit 0.

use std::f64::consts::FRAC_PI_2;
use std::fmt;

use serde::{Deserialize, Serialize};
use vqls_ir::{Circuit, ClbitId, QubitId, StandardGate};

use crate::error::{Quadrature, VqlsError, VqlsResult};
use crate::pauli::{Pauli, PauliTerm};

/// How the numerator ⟨b|A|ψ⟩ is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMode {
    /// Swap test over every term pair, giving |⟨b|A|ψ⟩|².
    SwapTest,
    /// Direct overlap per term, giving Re⟨b|A|ψ⟩.
    #[default]
    Surrogate,
}

impl EstimationMode {
    /// Qubits needed for an `n`-qubit operator, including the ancilla.
    pub fn required_qubits(self, n: usize) -> usize {
        match self {
            EstimationMode::SwapTest => 2 * n + 1,
            EstimationMode::Surrogate => n + 1,
        }
    }
}

impl fmt::Display for EstimationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EstimationMode::SwapTest => "swap_test",
            EstimationMode::Surrogate => "surrogate",
        })
    }
}

impl std::str::FromStr for EstimationMode {
    type Err = VqlsError;

    fn from_str(s: &str) -> VqlsResult<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "swap_test" | "swap" => Ok(EstimationMode::SwapTest),
            "surrogate" => Ok(EstimationMode::Surrogate),
            other => Err(VqlsError::Config(format!(
                "unknown estimation mode '{other}', expected swap_test or surrogate"
            ))),
        }
    }
}

fn pauli_gate(p: Pauli) -> StandardGate {
    match p {
        Pauli::I => StandardGate::I,
        Pauli::X => StandardGate::X,
        Pauli::Y => StandardGate::Y,
        Pauli::Z => StandardGate::Z,
    }
}

fn check_width(ansatz: &Circuit, term: &PauliTerm) -> VqlsResult<()> {
    if term.n_qubits() != ansatz.num_qubits() {
        return Err(VqlsError::InvalidOperator(format!(
            "term {} spans {} qubits but the ansatz has {}",
            term.label(),
            term.n_qubits(),
            ansatz.num_qubits()
        )));
    }
    Ok(())
}

/// Apply each non-identity Pauli of `term` to `register`, controlled by `control`.
pub fn controlled_pauli(
    circuit: &mut Circuit,
    control: QubitId,
    register: &[QubitId],
    term: &PauliTerm,
) -> VqlsResult<()> {
    for (q, p) in term.support() {
        circuit.controlled(pauli_gate(p), [control], [register[q]])?;
    }
    Ok(())
}

/// Prepare |b⟩ = H^⊗n |0⟩ on `register`.
pub fn prepare_reference(circuit: &mut Circuit, register: &[QubitId]) -> VqlsResult<()> {
    for &q in register {
        circuit.h(q)?;
    }
    Ok(())
}

fn close_and_measure(circuit: &mut Circuit, anc: QubitId, quadrature: Quadrature) -> VqlsResult<()> {
    if quadrature == Quadrature::Imaginary {
        circuit.rz(-FRAC_PI_2, anc)?;
    }
    circuit.h(anc)?;
    circuit.measure(anc, ClbitId(0))?;
    Ok(())
}

/// Hadamard test for Re⟨ψ|P|ψ⟩ on n + 1 qubits, ancilla last.
pub fn hadamard_test(ansatz: &Circuit, term: &PauliTerm) -> VqlsResult<Circuit> {
    check_width(ansatz, term)?;
    let n = u32::try_from(ansatz.num_qubits()).map_err(|_| too_wide(ansatz))?;

    let mut circuit = Circuit::new(format!("hadamard_test_{}", term.label()));
    let sys = circuit.add_qreg("sys", n);
    let anc = circuit.add_qreg("anc", 1)[0];
    circuit.add_clbit();

    circuit.compose(ansatz, &sys, None)?;
    circuit.h(anc)?;
    controlled_pauli(&mut circuit, anc, &sys, term)?;
    close_and_measure(&mut circuit, anc, Quadrature::Real)?;
    Ok(circuit)
}

/// Swap test for the pair `(term_k, term_l)` on 2n + 1 qubits.
///
/// Layout: ansatz register `[0, n)`, reference register `[n, 2n)` holding
/// |b⟩, ancilla `2n`. `term_l` acts on the ancilla |0⟩ branch and `term_k`
/// on the |1⟩ branch before the controlled-swap network.
pub fn swap_test(
    ansatz: &Circuit,
    term_k: &PauliTerm,
    term_l: &PauliTerm,
    quadrature: Quadrature,
) -> VqlsResult<Circuit> {
    check_width(ansatz, term_k)?;
    check_width(ansatz, term_l)?;
    let n = u32::try_from(ansatz.num_qubits()).map_err(|_| too_wide(ansatz))?;

    let mut circuit = Circuit::new(format!("swap_test_{}_{}", term_k.label(), term_l.label()));
    let sys = circuit.add_qreg("sys", n);
    let reference = circuit.add_qreg("ref", n);
    let anc = circuit.add_qreg("anc", 1)[0];
    circuit.add_clbit();

    circuit.compose(ansatz, &sys, None)?;
    prepare_reference(&mut circuit, &reference)?;

    circuit.h(anc)?;
    circuit.x(anc)?;
    controlled_pauli(&mut circuit, anc, &sys, term_l)?;
    circuit.x(anc)?;
    controlled_pauli(&mut circuit, anc, &sys, term_k)?;
    for (&a, &r) in sys.iter().zip(&reference) {
        circuit.cswap(anc, a, r)?;
    }
    close_and_measure(&mut circuit, anc, quadrature)?;
    Ok(circuit)
}

/// Direct overlap Re⟨b|P|ψ⟩ (or Im) on n + 1 qubits, ancilla last.
///
/// The |0⟩ branch prepares |b⟩ with anti-controlled Hadamards; the |1⟩ branch
/// runs the ansatz with the ancilla added to every gate's control set, then
/// the controlled Paulis.
pub fn surrogate(ansatz: &Circuit, term: &PauliTerm, quadrature: Quadrature) -> VqlsResult<Circuit> {
    check_width(ansatz, term)?;
    let n = u32::try_from(ansatz.num_qubits()).map_err(|_| too_wide(ansatz))?;

    let mut circuit = Circuit::new(format!("surrogate_{}", term.label()));
    let sys = circuit.add_qreg("sys", n);
    let anc = circuit.add_qreg("anc", 1)[0];
    circuit.add_clbit();

    circuit.h(anc)?;
    circuit.x(anc)?;
    for &q in &sys {
        circuit.ch(anc, q)?;
    }
    circuit.x(anc)?;
    circuit.compose(ansatz, &sys, Some(anc))?;
    controlled_pauli(&mut circuit, anc, &sys, term)?;
    close_and_measure(&mut circuit, anc, quadrature)?;
    Ok(circuit)
}

fn too_wide(ansatz: &Circuit) -> VqlsError {
    VqlsError::Config(format!("ansatz '{}' is too wide", ansatz.name()))
}
