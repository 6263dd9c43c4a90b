//! Pauli operator model.
//!
//! A linear operator is a weighted sum of Pauli strings:
//!
//!   A = Σ_k  c_k · P_k,   c_k ∈ ℂ
//!
//! Character `j` of a string acts on qubit `j`, so `"IZZI"` places Z on
//! qubits 1 and 2.
//!
//! # Example
//!
//! ```rust
//! use vqls_core::pauli::PauliOperator;
//!
//! let a = PauliOperator::from_labels([(1.0, "IZZI"), (2.0, "ZZZZ"), (-0.5, "IIIZ")]).unwrap();
//! let aa = a.compose(&a).unwrap();
//! assert_eq!(aa.len(), 9);
//! assert_eq!(aa.simplify().len(), 4);
//! ```

use std::fmt;
use std::str::FromStr;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{VqlsError, VqlsResult};

/// Coefficients below this magnitude are dropped by [`PauliOperator::simplify`].
pub const COEFF_EPSILON: f64 = 1e-12;

/// Single-qubit Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pauli {
    /// Identity; never emitted as a gate.
    I,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
}

impl Pauli {
    /// The symbol used in string labels.
    pub fn symbol(self) -> char {
        match self {
            Pauli::I => 'I',
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }

    /// Product `self · rhs` as `(phase, pauli)`.
    ///
    /// XY = iZ, YZ = iX, ZX = iY, and the reversed orders carry −i.
    pub fn mul(self, rhs: Pauli) -> (Complex64, Pauli) {
        let one = Complex64::new(1.0, 0.0);
        let i = Complex64::new(0.0, 1.0);
        match (self, rhs) {
            (Pauli::I, p) | (p, Pauli::I) => (one, p),
            (Pauli::X, Pauli::X) | (Pauli::Y, Pauli::Y) | (Pauli::Z, Pauli::Z) => (one, Pauli::I),
            (Pauli::X, Pauli::Y) => (i, Pauli::Z),
            (Pauli::Y, Pauli::Z) => (i, Pauli::X),
            (Pauli::Z, Pauli::X) => (i, Pauli::Y),
            (Pauli::Y, Pauli::X) => (-i, Pauli::Z),
            (Pauli::Z, Pauli::Y) => (-i, Pauli::X),
            (Pauli::X, Pauli::Z) => (-i, Pauli::Y),
        }
    }
}

impl TryFrom<char> for Pauli {
    type Error = VqlsError;

    fn try_from(c: char) -> VqlsResult<Self> {
        match c {
            'I' => Ok(Pauli::I),
            'X' => Ok(Pauli::X),
            'Y' => Ok(Pauli::Y),
            'Z' => Ok(Pauli::Z),
            other => Err(VqlsError::InvalidOperator(format!(
                "unknown Pauli symbol '{other}', expected one of I, X, Y, Z"
            ))),
        }
    }
}

/// A weighted Pauli string: `coeff · P`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliTerm {
    /// Complex coefficient.
    pub coeff: Complex64,
    /// One symbol per qubit.
    paulis: Vec<Pauli>,
}

impl PauliTerm {
    /// Parse a term from a label such as `"IZZI"`.
    pub fn new(coeff: impl Into<Complex64>, label: &str) -> VqlsResult<Self> {
        if label.is_empty() {
            return Err(VqlsError::InvalidOperator("empty Pauli string".into()));
        }
        let paulis = label
            .chars()
            .map(Pauli::try_from)
            .collect::<VqlsResult<Vec<_>>>()
            .map_err(|e| match e {
                VqlsError::InvalidOperator(msg) => {
                    VqlsError::InvalidOperator(format!("{msg} in \"{label}\""))
                }
                other => other,
            })?;
        Ok(Self {
            coeff: coeff.into(),
            paulis,
        })
    }

    /// Build a term directly from symbols.
    pub fn from_paulis(coeff: impl Into<Complex64>, paulis: Vec<Pauli>) -> Self {
        Self {
            coeff: coeff.into(),
            paulis,
        }
    }

    /// Number of qubits the string spans.
    pub fn n_qubits(&self) -> usize {
        self.paulis.len()
    }

    /// Symbols in qubit order.
    pub fn paulis(&self) -> &[Pauli] {
        &self.paulis
    }

    /// The string label, e.g. `"IZZI"`.
    pub fn label(&self) -> String {
        self.paulis.iter().map(|p| p.symbol()).collect()
    }

    /// True if every symbol is `I`.
    pub fn is_identity(&self) -> bool {
        self.paulis.iter().all(|p| *p == Pauli::I)
    }

    /// Non-identity `(qubit, symbol)` pairs in qubit order.
    ///
    /// This is the list of controlled gates a measurement circuit needs; an
    /// all-identity string yields an empty list.
    pub fn support(&self) -> Vec<(usize, Pauli)> {
        self.paulis
            .iter()
            .enumerate()
            .filter(|(_, p)| **p != Pauli::I)
            .map(|(q, p)| (q, *p))
            .collect()
    }

    /// Product `self · rhs`, qubit by qubit, with the phase folded into the
    /// coefficient. Both strings must span the same number of qubits.
    pub fn mul(&self, rhs: &PauliTerm) -> PauliTerm {
        let mut coeff = self.coeff * rhs.coeff;
        let paulis = self
            .paulis
            .iter()
            .zip(&rhs.paulis)
            .map(|(a, b)| {
                let (phase, p) = a.mul(*b);
                coeff *= phase;
                p
            })
            .collect();
        PauliTerm { coeff, paulis }
    }
}

impl fmt::Display for PauliTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}·{}", format_coeff(self.coeff), self.label())
    }
}

fn format_coeff(c: Complex64) -> String {
    if c.im.abs() < COEFF_EPSILON {
        format!("{}", c.re)
    } else if c.re.abs() < COEFF_EPSILON {
        format!("{}i", c.im)
    } else {
        format!("({}{:+}i)", c.re, c.im)
    }
}

/// An ordered sum of Pauli terms over one qubit count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliOperator {
    n_qubits: usize,
    terms: Vec<PauliTerm>,
}

impl PauliOperator {
    /// Create an operator, checking that it has terms of one uniform length.
    pub fn new(terms: Vec<PauliTerm>) -> VqlsResult<Self> {
        let Some(first) = terms.first() else {
            return Err(VqlsError::InvalidOperator("operator has no terms".into()));
        };
        let n_qubits = first.n_qubits();
        if let Some((idx, bad)) = terms
            .iter()
            .enumerate()
            .find(|(_, t)| t.n_qubits() != n_qubits)
        {
            return Err(VqlsError::InvalidOperator(format!(
                "term {idx} (\"{}\") spans {} qubits, expected {n_qubits}",
                bad.label(),
                bad.n_qubits()
            )));
        }
        Ok(Self { n_qubits, terms })
    }

    /// Create an operator from `(coefficient, label)` pairs.
    pub fn from_labels<C, S>(pairs: impl IntoIterator<Item = (C, S)>) -> VqlsResult<Self>
    where
        C: Into<Complex64>,
        S: AsRef<str>,
    {
        let terms = pairs
            .into_iter()
            .map(|(c, s)| PauliTerm::new(c, s.as_ref()))
            .collect::<VqlsResult<Vec<_>>>()?;
        Self::new(terms)
    }

    /// The identity on `n_qubits` qubits.
    pub fn identity(n_qubits: usize) -> Self {
        Self {
            n_qubits,
            terms: vec![PauliTerm::from_paulis(1.0, vec![Pauli::I; n_qubits])],
        }
    }

    /// Number of qubits.
    pub fn n_qubits(&self) -> usize {
        self.n_qubits
    }

    /// Terms in order.
    pub fn terms(&self) -> &[PauliTerm] {
        &self.terms
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True for the zero operator left behind by [`simplify`](Self::simplify).
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Σ |c_k|, an upper bound on |⟨u|A|v⟩| for unit vectors.
    pub fn coefficient_l1(&self) -> f64 {
        self.terms.iter().map(|t| t.coeff.norm()).sum()
    }

    /// The product `self · rhs`.
    ///
    /// Every left term is multiplied by every right term, left-major, so
    /// the result has `self.len() * rhs.len()` terms in a fixed order. No
    /// conjugate transpose is taken: `a.compose(&a)` is A·A.
    pub fn compose(&self, rhs: &PauliOperator) -> VqlsResult<PauliOperator> {
        if self.n_qubits != rhs.n_qubits {
            return Err(VqlsError::InvalidOperator(format!(
                "cannot compose a {}-qubit operator with a {}-qubit operator",
                self.n_qubits, rhs.n_qubits
            )));
        }
        let terms = self
            .terms
            .iter()
            .flat_map(|l| rhs.terms.iter().map(move |r| l.mul(r)))
            .collect();
        Ok(PauliOperator {
            n_qubits: self.n_qubits,
            terms,
        })
    }

    /// Merge identical strings and drop near-zero coefficients.
    ///
    /// Terms keep the position of their first occurrence.
    pub fn simplify(&self) -> PauliOperator {
        let mut merged: Vec<PauliTerm> = Vec::with_capacity(self.terms.len());
        for term in &self.terms {
            match merged.iter_mut().find(|m| m.paulis == term.paulis) {
                Some(m) => m.coeff += term.coeff,
                None => merged.push(term.clone()),
            }
        }
        let before = merged.len();
        merged.retain(|t| t.coeff.norm() >= COEFF_EPSILON);
        if merged.len() < before {
            warn!(
                dropped = before - merged.len(),
                "dropped cancelled terms while simplifying operator"
            );
        }
        PauliOperator {
            n_qubits: self.n_qubits,
            terms: merged,
        }
    }

    /// Same terms in the order given by `order`.
    ///
    /// Returns `None` unless `order` is a permutation of `0..len()`.
    pub fn permuted(&self, order: &[usize]) -> Option<PauliOperator> {
        if order.len() != self.terms.len() {
            return None;
        }
        let mut seen = vec![false; order.len()];
        for &i in order {
            if i >= seen.len() || std::mem::replace(&mut seen[i], true) {
                return None;
            }
        }
        Some(PauliOperator {
            n_qubits: self.n_qubits,
            terms: order.iter().map(|&i| self.terms[i].clone()).collect(),
        })
    }
}

impl fmt::Display for PauliOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

/// Line-oriented operator encoding.
///
/// One term per line as `<coefficient> <pauli>`. The coefficient is real
/// (`-0.5`) or complex (`1+0.5i`). Blank lines and text after `#` are ignored.
impl FromStr for PauliOperator {
    type Err = VqlsError;

    fn from_str(s: &str) -> VqlsResult<Self> {
        let mut terms = vec![];
        for (lineno, raw) in s.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(coeff), Some(label), None) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(VqlsError::InvalidOperator(format!(
                    "line {}: expected `<coefficient> <pauli>`, got \"{line}\"",
                    lineno + 1
                )));
            };
            let coeff: Complex64 = coeff.parse().map_err(|_| {
                VqlsError::InvalidOperator(format!(
                    "line {}: invalid coefficient \"{coeff}\"",
                    lineno + 1
                ))
            })?;
            terms.push(PauliTerm::new(coeff, label).map_err(|e| match e {
                VqlsError::InvalidOperator(msg) => {
                    VqlsError::InvalidOperator(format!("line {}: {msg}", lineno + 1))
                }
                other => other,
            })?);
        }
        Self::new(terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn test_multiplication_table() {
        assert_eq!(Pauli::X.mul(Pauli::Y), (c(0.0, 1.0), Pauli::Z));
        assert_eq!(Pauli::Y.mul(Pauli::Z), (c(0.0, 1.0), Pauli::X));
        assert_eq!(Pauli::Z.mul(Pauli::X), (c(0.0, 1.0), Pauli::Y));
        assert_eq!(Pauli::Y.mul(Pauli::X), (c(0.0, -1.0), Pauli::Z));
        assert_eq!(Pauli::Z.mul(Pauli::Y), (c(0.0, -1.0), Pauli::X));
        assert_eq!(Pauli::X.mul(Pauli::Z), (c(0.0, -1.0), Pauli::Y));
        for p in [Pauli::I, Pauli::X, Pauli::Y, Pauli::Z] {
            assert_eq!(p.mul(p), (c(1.0, 0.0), Pauli::I));
            assert_eq!(Pauli::I.mul(p), (c(1.0, 0.0), p));
        }
    }

    #[test]
    fn test_invalid_symbol_is_rejected() {
        let err = PauliTerm::new(1.0, "IWZI").unwrap_err();
        assert!(matches!(err, VqlsError::InvalidOperator(msg) if msg.contains('W')));
        assert!(PauliOperator::from_labels([(1.0, "IZ"), (1.0, "izz")]).is_err());
    }

    #[test]
    fn test_mismatched_lengths_are_rejected() {
        let err = PauliOperator::from_labels([(1.0, "IZ"), (1.0, "ZZZ")]).unwrap_err();
        assert!(matches!(err, VqlsError::InvalidOperator(_)));
    }

    #[test]
    fn test_identity_support_is_empty() {
        let t = PauliTerm::new(0.7, "IIII").unwrap();
        assert!(t.is_identity());
        assert!(t.support().is_empty());

        let t = PauliTerm::new(1.0, "IZXI").unwrap();
        assert_eq!(t.support(), vec![(1, Pauli::Z), (2, Pauli::X)]);
    }

    #[test]
    fn test_compose_tracks_phase() {
        let x = PauliOperator::from_labels([(2.0, "XI")]).unwrap();
        let y = PauliOperator::from_labels([(3.0, "YZ")]).unwrap();
        let xy = x.compose(&y).unwrap();
        assert_eq!(xy.terms()[0].label(), "ZZ");
        assert_eq!(xy.terms()[0].coeff, c(0.0, 6.0));

        let yx = y.compose(&x).unwrap();
        assert_eq!(yx.terms()[0].coeff, c(0.0, -6.0));
    }

    #[test]
    fn test_example_product_simplifies() {
        let a = PauliOperator::from_labels([(1.0, "IZZI"), (2.0, "ZZZZ"), (-0.5, "IIIZ")]).unwrap();
        let aa = a.compose(&a).unwrap();
        assert_eq!(aa.len(), 9);
        assert_eq!(aa.terms()[0].label(), "IIII");
        assert_eq!(aa.terms()[1].label(), "ZIIZ");

        let s = aa.simplify();
        // IIII: 1 + 4 + 0.25
        assert_eq!(s.terms()[0].label(), "IIII");
        assert!((s.terms()[0].coeff - c(5.25, 0.0)).norm() < 1e-12);
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn test_simplify_drops_cancelled_terms() {
        let op = PauliOperator::from_labels([(1.0, "XY"), (-1.0, "XY"), (0.5, "ZZ")]).unwrap();
        let s = op.simplify();
        assert_eq!(s.len(), 1);
        assert_eq!(s.terms()[0].label(), "ZZ");
    }

    #[test]
    fn test_parse_line_format() {
        let text = "
            # example operator
            1.0   IZZI
            2     ZZZZ   # strongest term
            -0.5  IIIZ
            1+0.5i XIIY
        ";
        let op: PauliOperator = text.parse().unwrap();
        assert_eq!(op.len(), 4);
        assert_eq!(op.n_qubits(), 4);
        assert_eq!(op.terms()[3].coeff, c(1.0, 0.5));

        assert!("1.0 IZZI extra".parse::<PauliOperator>().is_err());
        assert!("abc IZZI".parse::<PauliOperator>().is_err());
        let err = "1.0 IZ\n1.0 QZ".parse::<PauliOperator>().unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_permuted_requires_permutation() {
        let op = PauliOperator::from_labels([(1.0, "X"), (2.0, "Z")]).unwrap();
        assert_eq!(op.permuted(&[1, 0]).unwrap().terms()[0].label(), "Z");
        assert!(op.permuted(&[0, 0]).is_none());
        assert!(op.permuted(&[0]).is_none());
    }

    #[test]
    fn test_display() {
        let op = PauliOperator::from_labels([(1.0, "IZ"), (-0.5, "XX")]).unwrap();
        assert_eq!(op.to_string(), "1·IZ + -0.5·XX");
        // IZ and XX anticommute, so the cross terms cancel.
        let sq = op.compose(&op).unwrap().simplify();
        assert_eq!(sq.to_string(), "1.25·II");
    }
}
