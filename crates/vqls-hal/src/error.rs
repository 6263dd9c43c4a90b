//! Backend error type.

use thiserror::Error;

/// Failures reported by a [`Backend`](crate::Backend).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// The circuit is wider than the backend.
    #[error("Circuit needs {required} qubits, backend has {available}")]
    TooManyQubits {
        /// Qubits the circuit uses.
        required: usize,
        /// Qubits the backend offers.
        available: u32,
    },

    /// Shot count above the backend limit.
    #[error("{requested} shots requested, limit is {limit}")]
    ShotLimit {
        /// Requested shots.
        requested: u32,
        /// Backend maximum.
        limit: u32,
    },

    /// The circuit cannot run as built.
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    /// The backend refused the job.
    #[error("Job submission failed: {0}")]
    SubmissionFailed(String),

    /// The job ran and failed.
    #[error("Job {job_id} failed: {reason}")]
    JobFailed {
        /// Failed job.
        job_id: String,
        /// Backend-supplied reason.
        reason: String,
    },

    #[error("Job cancelled")]
    JobCancelled,

    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// The job did not finish within the polling budget.
    #[error("Job {job_id} still pending after {polls} polls")]
    Timeout {
        /// Pending job.
        job_id: String,
        /// Status polls made.
        polls: u32,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Bad backend configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Anything else the backend reports.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;
