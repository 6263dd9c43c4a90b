//! Simulator backend implementation.

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::Hasher;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

use vqls_hal::{
    Backend, BackendConfig, BackendFactory, Capabilities, Counts, ExecutionResult, HalError,
    HalResult, Job, JobId, JobStatus,
};
use vqls_ir::Circuit;

use crate::statevector::Statevector;

const DEFAULT_MAX_QUBITS: u32 = 20;
/// Largest width accepted from a [`BackendConfig`].
const MAX_QUBITS: u32 = 30;

/// Job data for the simulator.
struct SimJob {
    job: Job,
    result: Option<ExecutionResult>,
}

type JobMap = Mutex<FxHashMap<String, SimJob>>;

/// Removes an unfinished job's entry when the submitting future is dropped.
struct PendingJob<'a> {
    jobs: &'a JobMap,
    id: &'a JobId,
    finished: bool,
}

impl Drop for PendingJob<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
            jobs.remove(&self.id.0);
            debug!(job = %self.id, "submission abandoned, job dropped");
        }
    }
}

/// Local simulator backend.
///
/// `shots = 0` returns the exact ⟨Z⟩ of the first measured qubit. Any other
/// shot count samples the final state. With a seed, the sample stream of a
/// job depends only on the seed and the circuit, so results are reproducible
/// regardless of how many jobs run concurrently.
pub struct SimulatorBackend {
    /// Backend configuration.
    config: BackendConfig,
    /// Cached capabilities.
    capabilities: Capabilities,
    /// Active jobs.
    jobs: Arc<JobMap>,
    /// Base seed for sampling; `None` draws from OS entropy.
    seed: Option<u64>,
}

impl SimulatorBackend {
    /// Create a new simulator backend with default settings.
    pub fn new() -> Self {
        Self::with_max_qubits(DEFAULT_MAX_QUBITS)
    }

    /// Create a simulator with custom max qubits.
    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self {
            config: BackendConfig::new("simulator"),
            capabilities: Capabilities::simulator(max_qubits),
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            seed: None,
        }
    }

    /// Fix the sampling seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Limit the shots accepted per job.
    #[must_use]
    pub fn with_max_shots(mut self, max_shots: u32) -> Self {
        self.capabilities = self.capabilities.with_max_shots(max_shots);
        self
    }

    fn rng_for(&self, circuit: &Circuit) -> HalResult<StdRng> {
        let Some(seed) = self.seed else {
            return Ok(StdRng::from_entropy());
        };
        let mut hasher = FxHasher::default();
        hasher.write_u64(seed);
        hasher.write(&serde_json::to_vec(circuit.instructions())?);
        Ok(StdRng::seed_from_u64(hasher.finish()))
    }

    fn check_limits(&self, circuit: &Circuit, shots: u32) -> HalResult<()> {
        let caps = &self.capabilities;
        if circuit.num_qubits() > caps.num_qubits as usize {
            return Err(HalError::TooManyQubits {
                required: circuit.num_qubits(),
                available: caps.num_qubits,
            });
        }
        if shots > caps.max_shots {
            return Err(HalError::ShotLimit {
                requested: shots,
                limit: caps.max_shots,
            });
        }
        if circuit.measured_qubits().is_empty() {
            return Err(HalError::InvalidCircuit(format!(
                "circuit '{}' measures no qubit",
                circuit.name()
            )));
        }
        Ok(())
    }

    fn store(&self, job_id: &JobId, update: impl FnOnce(&mut SimJob)) {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sim_job) = jobs.get_mut(&job_id.0) {
            update(sim_job);
        }
    }
}

/// Run a simulation synchronously.
#[allow(clippy::cast_possible_truncation)]
fn run_simulation(circuit: &Circuit, shots: u32, rng: &mut StdRng) -> ExecutionResult {
    let start = Instant::now();
    debug!(
        circuit = circuit.name(),
        qubits = circuit.num_qubits(),
        ops = circuit.num_ops(),
        shots,
        "starting simulation"
    );

    let sv = Statevector::from_circuit(circuit);
    let readout: Vec<(usize, usize)> = circuit
        .instructions()
        .iter()
        .filter(|i| i.is_measure())
        .flat_map(|i| i.qubits.iter().zip(&i.clbits).map(|(q, c)| (q.index(), c.0 as usize)))
        .collect();

    let result = if shots == 0 {
        let qubit = readout.first().map_or(0, |&(q, _)| q);
        ExecutionResult::exact(sv.z_expectation(qubit))
    } else {
        let width = circuit.num_clbits();
        let mut counts = Counts::new();
        for outcome in sv.sample_many(rng, shots) {
            let mut bits = vec![b'0'; width];
            for &(qubit, clbit) in &readout {
                if outcome & (1 << qubit) != 0 {
                    bits[width - 1 - clbit] = b'1';
                }
            }
            counts.insert(String::from_utf8_lossy(&bits).into_owned(), 1);
        }
        ExecutionResult::new(counts, shots)
    };

    let elapsed = start.elapsed();
    debug!(circuit = circuit.name(), ?elapsed, "simulation completed");
    result.with_execution_time(elapsed.as_millis() as u64)
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
        self.check_limits(circuit, shots)?;

        let job_id = JobId::new(Uuid::new_v4().to_string());
        {
            let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
            jobs.insert(
                job_id.0.clone(),
                SimJob {
                    job: Job::new(job_id.clone(), circuit.name(), shots),
                    result: None,
                },
            );
        }
        debug!("Submitted job: {}", job_id);
        let mut pending = PendingJob {
            jobs: &self.jobs,
            id: &job_id,
            finished: false,
        };
        self.store(&job_id, |j| j.job.transition(JobStatus::Running));

        let mut rng = self.rng_for(circuit)?;
        let owned = circuit.clone();
        let outcome =
            tokio::task::spawn_blocking(move || run_simulation(&owned, shots, &mut rng)).await;
        pending.finished = true;

        match outcome {
            Ok(result) => self.store(&job_id, |j| {
                j.result = Some(result);
                j.job.transition(JobStatus::Completed);
            }),
            Err(e) => self.store(&job_id, |j| {
                j.job.transition(JobStatus::Failed(format!("simulation task aborted: {e}")));
            }),
        }

        Ok(job_id.clone())
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let status = jobs
            .get(&job_id.0)
            .map(|j| j.job.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        // Failed and cancelled jobs carry no result; they are reported once.
        if matches!(status, JobStatus::Failed(_) | JobStatus::Cancelled) {
            jobs.remove(&job_id.0);
        }
        Ok(status)
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        // Results are handed out once.
        jobs.remove(&job_id.0)
            .and_then(|j| j.result)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        match jobs.get_mut(&job_id.0) {
            Some(sim_job) => {
                sim_job.job.transition(JobStatus::Cancelled);
                Ok(())
            }
            None => Err(HalError::JobNotFound(job_id.0.clone())),
        }
    }
}

impl BackendFactory for SimulatorBackend {
    #[allow(clippy::cast_possible_truncation)]
    fn from_config(config: BackendConfig) -> HalResult<Self> {
        let max_qubits = config
            .extra_u64("max_qubits")
            .map_or(DEFAULT_MAX_QUBITS, |v| v as u32);
        if max_qubits == 0 || max_qubits > MAX_QUBITS {
            return Err(HalError::Configuration(format!(
                "max_qubits must be in 1..={MAX_QUBITS}, got {max_qubits}"
            )));
        }
        let mut capabilities = Capabilities::simulator(max_qubits);
        if let Some(max_shots) = config.extra_u64("max_shots") {
            capabilities = capabilities.with_max_shots(max_shots as u32);
        }

        Ok(Self {
            seed: config.extra_u64("seed"),
            config,
            capabilities,
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
        })
    }
}
