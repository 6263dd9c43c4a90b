//! Circuit execution and ancilla readout.
//!
//! [`MeasurementEngine`] turns a tagged circuit into a single ⟨Z⟩ value on
//! classical bit 0. Batches run through [`MeasurementEngine::run_all`] with a
//! bounded number of circuits in flight; results come back in submission
//! order so the cost sums are deterministic for a deterministic backend.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{debug, trace};

use vqls_hal::{Backend, HalError, ValidationResult};
use vqls_ir::Circuit;

use crate::error::{CircuitTag, VqlsError, VqlsResult};

/// Default number of circuits in flight.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// One ancilla readout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeasurementRecord {
    /// Which circuit produced the value.
    pub tag: CircuitTag,
    /// ⟨Z⟩ on the ancilla.
    pub z: f64,
}

impl MeasurementRecord {
    /// Probability of reading 0 on the ancilla.
    pub fn p_zero(&self) -> f64 {
        0.5 * self.z + 0.5
    }
}

/// Executes measurement circuits against a backend.
#[derive(Clone)]
pub struct MeasurementEngine {
    backend: Arc<dyn Backend>,
    shots: u32,
    max_concurrency: usize,
}

impl std::fmt::Debug for MeasurementEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeasurementEngine")
            .field("backend", &self.backend.name())
            .field("shots", &self.shots)
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}

impl MeasurementEngine {
    /// Create an engine. `shots = 0` requests exact expectations and needs a
    /// backend that advertises them.
    pub fn new(backend: Arc<dyn Backend>, shots: u32) -> VqlsResult<Self> {
        let caps = backend.capabilities();
        if shots == 0 && !caps.exact_expectation {
            return Err(VqlsError::Config(format!(
                "backend '{}' cannot compute exact expectations; set shots > 0",
                backend.name()
            )));
        }
        if shots > caps.max_shots {
            return Err(VqlsError::Config(format!(
                "{shots} shots exceeds the limit of {} on backend '{}'",
                caps.max_shots,
                backend.name()
            )));
        }
        Ok(Self {
            backend,
            shots,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        })
    }

    /// Bound the number of circuits in flight. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Shots per circuit (0 = exact).
    pub fn shots(&self) -> u32 {
        self.shots
    }

    /// Circuits in flight.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Name of the underlying backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// The underlying backend.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Execute one circuit and read ⟨Z⟩ on classical bit 0.
    ///
    /// An exact expectation on the result takes precedence over counts.
    pub async fn expectation(&self, circuit: &Circuit, tag: CircuitTag) -> VqlsResult<f64> {
        let failed = |source: HalError| VqlsError::MeasurementFailed {
            circuit: tag,
            source,
        };

        if let ValidationResult::Invalid { reasons } =
            self.backend.validate(circuit).await.map_err(failed)?
        {
            return Err(failed(HalError::InvalidCircuit(reasons.join("; "))));
        }

        let result = self
            .backend
            .execute(circuit, self.shots)
            .await
            .map_err(failed)?;

        let z = match result.expectation {
            Some(z) => z,
            None => result
                .counts
                .z_expectation(0)
                .ok_or_else(|| failed(HalError::Backend("result carries no counts".into())))?,
        };
        trace!(%tag, z, "measured");
        Ok(z)
    }

    /// Execute a batch, preserving input order in the output.
    ///
    /// The first failure ends the batch; circuits still queued are not
    /// submitted.
    pub async fn run_all(
        &self,
        jobs: Vec<(CircuitTag, Circuit)>,
    ) -> VqlsResult<Vec<MeasurementRecord>> {
        debug!(
            circuits = jobs.len(),
            max_concurrency = self.max_concurrency,
            "running measurement batch"
        );
        stream::iter(jobs)
            .map(|(tag, circuit)| async move {
                let z = self.expectation(&circuit, tag).await?;
                Ok::<_, VqlsError>(MeasurementRecord { tag, z })
            })
            .buffered(self.max_concurrency)
            .try_collect()
            .await
    }
}
