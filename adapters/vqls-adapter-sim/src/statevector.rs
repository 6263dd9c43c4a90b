//! Statevector simulation engine.
//!
//! Qubit `k` is bit `k` of the basis index.

use num_complex::Complex64;
use rand::Rng;

use vqls_ir::{Circuit, Instruction, InstructionKind};

/// A statevector representing a quantum state.
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Run every gate of `circuit` from |0...0⟩.
    pub fn from_circuit(circuit: &Circuit) -> Self {
        let mut sv = Self::new(circuit.num_qubits());
        for inst in circuit.instructions() {
            sv.apply(inst);
        }
        sv
    }

    /// Apply an instruction to the statevector.
    pub fn apply(&mut self, instruction: &Instruction) {
        let InstructionKind::Gate(gate) = &instruction.kind else {
            // Measurement is deferred to sampling.
            return;
        };
        let control_mask = instruction
            .controls
            .iter()
            .fold(0usize, |m, q| m | (1 << q.index()));
        let targets: Vec<usize> = instruction.qubits.iter().map(|q| q.index()).collect();
        let matrix = gate.matrix();

        if let [target] = targets.as_slice() {
            let m = [matrix[0], matrix[1], matrix[2], matrix[3]];
            self.apply_single(*target, control_mask, m);
        } else {
            self.apply_multi(&targets, control_mask, &matrix);
        }
    }

    // =========================================================================
    // Gate kernels
    // =========================================================================

    /// Apply a 2×2 unitary on `target` wherever all `control_mask` bits are set.
    fn apply_single(&mut self, target: usize, control_mask: usize, m: [Complex64; 4]) {
        let mask = 1 << target;
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 && i & control_mask == control_mask {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = m[0] * a + m[1] * b;
                self.amplitudes[j] = m[2] * a + m[3] * b;
            }
        }
    }

    /// Apply a `2^k × 2^k` unitary on `targets` under `control_mask`.
    ///
    /// `targets[b]` is bit `b` of the local index into `matrix`.
    fn apply_multi(&mut self, targets: &[usize], control_mask: usize, matrix: &[Complex64]) {
        let dim = 1 << targets.len();
        let target_mask = targets.iter().fold(0usize, |m, &t| m | (1 << t));
        let offsets: Vec<usize> = (0..dim)
            .map(|local| {
                targets
                    .iter()
                    .enumerate()
                    .filter(|(b, _)| local & (1 << b) != 0)
                    .fold(0, |acc, (_, &t)| acc | (1 << t))
            })
            .collect();

        let mut block = vec![Complex64::new(0.0, 0.0); dim];
        for base in 0..(1 << self.num_qubits) {
            if base & target_mask != 0 || base & control_mask != control_mask {
                continue;
            }
            for (slot, off) in block.iter_mut().zip(&offsets) {
                *slot = self.amplitudes[base | off];
            }
            for (row, off) in offsets.iter().enumerate() {
                self.amplitudes[base | off] = (0..dim).map(|col| matrix[row * dim + col] * block[col]).sum();
            }
        }
    }

    // =========================================================================
    // Readout
    // =========================================================================

    /// Exact ⟨Z⟩ on `qubit`.
    pub fn z_expectation(&self, qubit: usize) -> f64 {
        let mask = 1 << qubit;
        self.amplitudes
            .iter()
            .enumerate()
            .map(|(i, a)| if i & mask == 0 { a.norm_sqr() } else { -a.norm_sqr() })
            .sum()
    }

    /// Squared norm of the state.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(Complex64::norm_sqr).sum()
    }

    /// Sample `shots` basis-state outcomes.
    pub fn sample_many<R: Rng>(&self, rng: &mut R, shots: u32) -> Vec<usize> {
        let mut cumulative = Vec::with_capacity(self.amplitudes.len());
        let mut total = 0.0;
        for amp in &self.amplitudes {
            total += amp.norm_sqr();
            cumulative.push(total);
        }
        let last = self.amplitudes.len() - 1;
        (0..shots)
            .map(|_| {
                let r: f64 = rng.r#gen::<f64>() * total;
                cumulative.partition_point(|&c| c <= r).min(last)
            })
            .collect()
    }

    /// Amplitudes in basis order.
    #[cfg(test)]
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f64::consts::FRAC_1_SQRT_2;
    use vqls_ir::{Circuit, CustomGate, QubitId, StandardGate};

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert!(approx_eq(sv.amplitudes()[0], c(1.0)));
        assert!(sv.amplitudes()[1..].iter().all(|a| approx_eq(*a, c(0.0))));
        assert!((sv.z_expectation(0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bell_state() {
        let mut circuit = Circuit::with_size("bell", 2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        let sv = Statevector::from_circuit(&circuit);

        assert!(approx_eq(sv.amplitudes()[0], c(FRAC_1_SQRT_2)));
        assert!(approx_eq(sv.amplitudes()[1], c(0.0)));
        assert!(approx_eq(sv.amplitudes()[2], c(0.0)));
        assert!(approx_eq(sv.amplitudes()[3], c(FRAC_1_SQRT_2)));
    }

    #[test]
    fn test_ry_expectation() {
        let theta = 0.7;
        let mut circuit = Circuit::with_size("ry", 1, 0);
        circuit.ry(theta, QubitId(0)).unwrap();
        let sv = Statevector::from_circuit(&circuit);
        assert!((sv.z_expectation(0) - theta.cos()).abs() < 1e-12);
    }

    #[test]
    fn test_control_set_requires_all_ones() {
        let mut circuit = Circuit::with_size("ccx", 3, 0);
        circuit.x(QubitId(0)).unwrap();
        circuit.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();
        assert!((Statevector::from_circuit(&circuit).z_expectation(2) - 1.0).abs() < 1e-12);

        circuit.x(QubitId(1)).unwrap();
        circuit.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();
        assert!((Statevector::from_circuit(&circuit).z_expectation(2) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_controlled_swap_matrix() {
        // |ctrl=1, t1=1, t2=0⟩ -> |ctrl=1, t1=0, t2=1⟩
        let mut circuit = Circuit::with_size("cswap", 3, 0);
        circuit.x(QubitId(0)).unwrap();
        circuit.x(QubitId(1)).unwrap();
        circuit.cswap(QubitId(0), QubitId(1), QubitId(2)).unwrap();
        let sv = Statevector::from_circuit(&circuit);
        assert!(approx_eq(sv.amplitudes()[0b101], c(1.0)));

        // Without the control nothing moves.
        let mut idle = Circuit::with_size("cswap_idle", 3, 0);
        idle.x(QubitId(1)).unwrap();
        idle.cswap(QubitId(0), QubitId(1), QubitId(2)).unwrap();
        assert!(approx_eq(Statevector::from_circuit(&idle).amplitudes()[0b010], c(1.0)));
    }

    #[test]
    fn test_multi_matches_single_kernel() {
        // Uncontrolled swap via custom matrix equals three CX gates.
        let mut a = Circuit::with_size("a", 2, 0);
        a.ry(0.4, QubitId(0)).unwrap();
        a.ry(1.3, QubitId(1)).unwrap();
        let mut b = a.clone();
        a.gate(CustomGate::swap(), [QubitId(0), QubitId(1)]).unwrap();
        b.cx(QubitId(0), QubitId(1)).unwrap();
        b.cx(QubitId(1), QubitId(0)).unwrap();
        b.cx(QubitId(0), QubitId(1)).unwrap();

        let (sa, sb) = (Statevector::from_circuit(&a), Statevector::from_circuit(&b));
        for (x, y) in sa.amplitudes().iter().zip(sb.amplitudes()) {
            assert!(approx_eq(*x, *y));
        }
    }

    #[test]
    fn test_unitary_evolution_preserves_norm() {
        let mut circuit = Circuit::with_size("mix", 3, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.controlled(StandardGate::Y, [QubitId(0)], [QubitId(2)]).unwrap();
        circuit.cry(0.9, QubitId(2), QubitId(1)).unwrap();
        circuit.rz(0.3, QubitId(1)).unwrap();
        assert!((Statevector::from_circuit(&circuit).norm_sqr() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sample_deterministic_state() {
        let mut sv = Statevector::new(1);
        sv.apply(&Instruction::single_qubit_gate(StandardGate::X, QubitId(0)));
        let mut rng = StdRng::seed_from_u64(3);
        assert!(sv.sample_many(&mut rng, 100).iter().all(|&o| o == 1));
    }
}
