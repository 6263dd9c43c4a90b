//! Execution results.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Measurement outcome histogram.
///
/// Bitstrings are written with classical bit 0 as the rightmost character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    counts: FxHashMap<String, u64>,
}

impl Counts {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` observations of `bitstring`.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.counts.entry(bitstring.into()).or_insert(0) += count;
    }

    /// Observations of `bitstring` (zero if never seen).
    pub fn get(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Total number of recorded shots.
    pub fn total_shots(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Relative frequency of `bitstring`.
    #[allow(clippy::cast_precision_loss)]
    pub fn probability(&self, bitstring: &str) -> f64 {
        let total = self.total_shots();
        if total == 0 {
            return 0.0;
        }
        self.get(bitstring) as f64 / total as f64
    }

    /// Estimate ⟨Z⟩ on classical bit `clbit` as P(0) − P(1).
    ///
    /// Returns `None` when no shots were recorded or a bitstring is too short
    /// to contain the bit.
    #[allow(clippy::cast_precision_loss)]
    pub fn z_expectation(&self, clbit: usize) -> Option<f64> {
        let total = self.total_shots();
        if total == 0 {
            return None;
        }
        let mut signed: i128 = 0;
        for (bits, &count) in &self.counts {
            let idx = bits.len().checked_sub(clbit + 1)?;
            match bits.as_bytes()[idx] {
                b'0' => signed += i128::from(count),
                b'1' => signed -= i128::from(count),
                _ => return None,
            }
        }
        Some(signed as f64 / total as f64)
    }

    /// Iterate over `(bitstring, count)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no outcome was recorded.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Result of executing one circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement histogram.
    pub counts: Counts,
    /// Number of shots executed. Zero for an exact readout.
    pub shots: u32,
    /// Exact ⟨Z⟩ on the first measured qubit, when the backend can compute it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expectation: Option<f64>,
    /// Wall-clock execution time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl ExecutionResult {
    /// Create a sampled result.
    pub fn new(counts: Counts, shots: u32) -> Self {
        Self {
            counts,
            shots,
            expectation: None,
            execution_time_ms: None,
        }
    }

    /// Create an exact result carrying ⟨Z⟩ and no samples.
    pub fn exact(expectation: f64) -> Self {
        Self {
            counts: Counts::new(),
            shots: 0,
            expectation: Some(expectation),
            execution_time_ms: None,
        }
    }

    /// Attach the execution time.
    #[must_use]
    pub fn with_execution_time(mut self, ms: u64) -> Self {
        self.execution_time_ms = Some(ms);
        self
    }

    /// Attach an exact expectation value.
    #[must_use]
    pub fn with_expectation(mut self, expectation: f64) -> Self {
        self.expectation = Some(expectation);
        self
    }
}
