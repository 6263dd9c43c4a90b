//! Backend trait and configuration.
//!
//! ```text
//!   capabilities() ──→ validate() ──→ submit() ──→ status() ──→ result()
//!    (sync, &ref)       (async)       (async)      (async)      (async)
//! ```
//!
//! | Method | Kind | Required | Returns |
//! |--------|------|----------|---------|
//! | `name()` | sync | yes | `&str` |
//! | `capabilities()` | sync | yes | `&Capabilities` |
//! | `validate()` | async | provided | `HalResult<ValidationResult>` |
//! | `submit()` | async | yes | `HalResult<JobId>` |
//! | `status()` | async | yes | `HalResult<JobStatus>` |
//! | `result()` | async | yes | `HalResult<ExecutionResult>` |
//! | `cancel()` | async | yes | `HalResult<()>` |
//! | `wait()` | async | provided | `HalResult<ExecutionResult>` |
//! | `execute()` | async | provided | `HalResult<ExecutionResult>` |

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use vqls_ir::Circuit;

use crate::capability::Capabilities;
use crate::error::{HalError, HalResult};
use crate::job::{JobId, JobStatus};
use crate::result::ExecutionResult;

/// Configuration for a backend instance.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Name of the backend.
    pub name: String,
    /// API endpoint URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Authentication token.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Additional configuration.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BackendConfig {
    /// Create a new backend configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
            token: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Add extra configuration.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Read an unsigned integer from the extra map.
    pub fn extra_u64(&self, key: &str) -> Option<u64> {
        self.extra.get(key).and_then(serde_json::Value::as_u64)
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .field("extra", &self.extra)
            .finish()
    }
}

/// Trait for quantum backends.
///
/// The measurement engine only needs [`execute`](Backend::execute), but the
/// full job lifecycle is exposed so a remote backend can queue work and be
/// polled.
///
/// # Contract
///
/// - `capabilities()` MUST be synchronous and infallible.
/// - `submit()` MUST return a job that starts in `Queued` or has already
///   reached a terminal state.
/// - `result()` MUST only be called when status is `Completed`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Get the capabilities of this backend.
    fn capabilities(&self) -> &Capabilities;

    /// Validate a circuit against backend constraints.
    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult> {
        let caps = self.capabilities();
        let mut reasons = vec![];
        if circuit.num_qubits() > caps.num_qubits as usize {
            reasons.push(format!(
                "circuit has {} qubits, backend supports {}",
                circuit.num_qubits(),
                caps.num_qubits
            ));
        }
        for inst in circuit.instructions() {
            if !caps.gate_set.supports(inst) {
                reasons.push(format!("unsupported instruction '{}'", inst.name()));
            }
        }
        if reasons.is_empty() {
            Ok(ValidationResult::Valid)
        } else {
            Ok(ValidationResult::Invalid { reasons })
        }
    }

    /// Submit a circuit for execution.
    ///
    /// `shots = 0` requests an exact readout and is only valid when
    /// `capabilities().exact_expectation` is set.
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId>;

    /// Get the status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Get the result of a completed job.
    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult>;

    /// Cancel a running job.
    async fn cancel(&self, job_id: &JobId) -> HalResult<()>;

    /// Poll interval used by [`wait`](Backend::wait).
    fn poll_interval(&self) -> Duration {
        Duration::from_millis(500)
    }

    /// Wait for a job to complete and return its result.
    ///
    /// Default implementation polls at [`poll_interval`](Backend::poll_interval)
    /// for up to 600 polls.
    async fn wait(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        const MAX_POLLS: u32 = 600;

        for _ in 0..MAX_POLLS {
            match self.status(job_id).await? {
                JobStatus::Completed => return self.result(job_id).await,
                JobStatus::Failed(reason) => {
                    return Err(HalError::JobFailed {
                        job_id: job_id.0.clone(),
                        reason,
                    });
                }
                JobStatus::Cancelled => return Err(HalError::JobCancelled),
                JobStatus::Queued | JobStatus::Running => {
                    tokio::time::sleep(self.poll_interval()).await;
                }
            }
        }

        Err(HalError::Timeout {
            job_id: job_id.0.clone(),
            polls: MAX_POLLS,
        })
    }

    /// Submit a circuit and wait for its result.
    async fn execute(&self, circuit: &Circuit, shots: u32) -> HalResult<ExecutionResult> {
        let job_id = self.submit(circuit, shots).await?;
        debug!(job = %job_id, circuit = circuit.name(), "awaiting result");
        self.wait(&job_id).await
    }
}

/// Result of circuit validation against backend constraints.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// Circuit is valid and can be submitted directly.
    Valid,
    /// Circuit is invalid for this backend.
    Invalid {
        /// Reasons the circuit is invalid.
        reasons: Vec<String>,
    },
}

impl ValidationResult {
    /// Check if the circuit is valid.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

/// Trait for creating backends from configuration.
pub trait BackendFactory: Backend + Sized {
    /// Create a backend from configuration.
    fn from_config(config: BackendConfig) -> HalResult<Self>;
}
