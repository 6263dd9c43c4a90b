//! Problem configuration.
//!
//! Supports loading configuration from:
//! 1. A YAML file
//! 2. Environment variables (with the `VQLS_` prefix)
//!
//! Environment variables override file values, which override defaults. The
//! defaults describe the reference problem: A = IZZI + 2·ZZZZ − 0.5·IIIZ on
//! four qubits, an eight-layer rotation ansatz and 50 descent steps of 0.1.

use std::fmt;
use std::path::Path;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::ansatz::{Ansatz, AnsatzVariant};
use crate::engine::DEFAULT_MAX_CONCURRENCY;
use crate::error::{VqlsError, VqlsResult};
use crate::gradient::{DEFAULT_EPSILON, GradientMethod};
use crate::optimizer::{DEFAULT_ITERATIONS, DEFAULT_STEP_SIZE, GradientDescent};
use crate::pauli::{PauliOperator, PauliTerm};
use crate::protocol::EstimationMode;

/// Complete problem configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemConfig {
    /// Terms of A.
    #[serde(default = "default_operator")]
    pub operator: Vec<TermSpec>,

    /// Ansatz structure.
    #[serde(default)]
    pub ansatz: AnsatzConfig,

    /// Numerator estimation mode.
    #[serde(default)]
    pub estimation: EstimationMode,

    /// Descent budget.
    #[serde(default)]
    pub optimizer: OptimizerConfig,

    /// Gradient estimator.
    #[serde(default)]
    pub gradient: GradientConfig,

    /// Measurement engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Local simulator settings.
    #[serde(default)]
    pub backend: SimulatorConfig,
}

/// One operator term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermSpec {
    /// Coefficient.
    pub coeff: Coefficient,
    /// Pauli string over {I, X, Y, Z}.
    pub pauli: String,
}

/// A real or complex coefficient.
///
/// Written as a number (`-0.5`), a `[re, im]` pair, or a string such as
/// `"1+0.5i"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coefficient {
    /// Real value.
    Real(f64),
    /// `[re, im]`.
    Pair([f64; 2]),
    /// Textual complex number.
    Text(String),
}

impl Coefficient {
    /// Resolve to a complex number.
    pub fn value(&self) -> VqlsResult<Complex64> {
        match self {
            Coefficient::Real(re) => Ok(Complex64::new(*re, 0.0)),
            Coefficient::Pair([re, im]) => Ok(Complex64::new(*re, *im)),
            Coefficient::Text(s) => s.trim().parse().map_err(|_| {
                VqlsError::InvalidOperator(format!("invalid coefficient \"{s}\""))
            }),
        }
    }
}

/// Ansatz settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnsatzConfig {
    /// Layering policy.
    #[serde(default)]
    pub variant: AnsatzVariant,
    /// Layer count L.
    #[serde(default = "default_layers")]
    pub layers: u32,
}

/// Optimizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Number of descent steps.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Step size η.
    #[serde(default = "default_step_size")]
    pub step_size: f64,
}

/// Gradient settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientConfig {
    /// Estimator.
    #[serde(default)]
    pub method: GradientMethod,
    /// Finite-difference step.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

/// Measurement engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Shots per circuit; 0 requests exact expectations.
    #[serde(default)]
    pub shots: u32,
    /// Circuits in flight.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Merge like terms of A·A before measuring.
    #[serde(default = "default_true")]
    pub simplify_products: bool,
}

/// Local simulator settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Sampling seed. Unseeded runs draw from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Width limit of the simulator.
    #[serde(default = "default_max_qubits")]
    pub max_qubits: u32,
}

/// Widest statevector the local simulator is allowed to allocate.
pub const MAX_SIMULATOR_QUBITS: u32 = 30;

// Default value functions
fn default_operator() -> Vec<TermSpec> {
    [(1.0, "IZZI"), (2.0, "ZZZZ"), (-0.5, "IIIZ")]
        .into_iter()
        .map(|(c, p)| TermSpec {
            coeff: Coefficient::Real(c),
            pauli: p.to_string(),
        })
        .collect()
}

fn default_layers() -> u32 {
    8
}

fn default_iterations() -> usize {
    DEFAULT_ITERATIONS
}

fn default_step_size() -> f64 {
    DEFAULT_STEP_SIZE
}

fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_true() -> bool {
    true
}

fn default_max_qubits() -> u32 {
    20
}

impl Default for ProblemConfig {
    fn default() -> Self {
        Self {
            operator: default_operator(),
            ansatz: AnsatzConfig::default(),
            estimation: EstimationMode::default(),
            optimizer: OptimizerConfig::default(),
            gradient: GradientConfig::default(),
            engine: EngineConfig::default(),
            backend: SimulatorConfig::default(),
        }
    }
}

impl Default for AnsatzConfig {
    fn default() -> Self {
        Self {
            variant: AnsatzVariant::default(),
            layers: default_layers(),
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            step_size: default_step_size(),
        }
    }
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            method: GradientMethod::default(),
            epsilon: default_epsilon(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shots: 0,
            max_concurrency: default_max_concurrency(),
            simplify_products: true,
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_qubits: default_max_qubits(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> VqlsResult<T>
where
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| VqlsError::Config(format!("{key}={raw}: {e}")))
}

impl ProblemConfig {
    /// Parse a YAML document.
    pub fn from_yaml(contents: &str, origin: &str) -> VqlsResult<Self> {
        serde_yaml_ng::from_str(contents).map_err(|e| VqlsError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Load and validate configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> VqlsResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&contents, &path.display().to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `VQLS_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> VqlsResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `VQLS_*` overrides from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> VqlsResult<()> {
        if let Some(v) = lookup("VQLS_LAYERS") {
            self.ansatz.layers = parse_env("VQLS_LAYERS", &v)?;
        }
        if let Some(v) = lookup("VQLS_ANSATZ") {
            self.ansatz.variant = v.parse()?;
        }
        if let Some(v) = lookup("VQLS_ITERATIONS") {
            self.optimizer.iterations = parse_env("VQLS_ITERATIONS", &v)?;
        }
        if let Some(v) = lookup("VQLS_STEP_SIZE") {
            self.optimizer.step_size = parse_env("VQLS_STEP_SIZE", &v)?;
        }
        if let Some(v) = lookup("VQLS_SHOTS") {
            self.engine.shots = parse_env("VQLS_SHOTS", &v)?;
        }
        if let Some(v) = lookup("VQLS_SEED") {
            self.backend.seed = Some(parse_env("VQLS_SEED", &v)?);
        }
        if let Some(v) = lookup("VQLS_ESTIMATION") {
            self.estimation = v.parse()?;
        }
        Ok(())
    }

    /// Load from an optional file, apply environment overrides, validate.
    pub fn load(path: Option<&Path>) -> VqlsResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the solver cannot run with.
    pub fn validate(&self) -> VqlsResult<()> {
        if self.ansatz.layers == 0 {
            return Err(VqlsError::Config("ansatz.layers must be at least 1".into()));
        }
        if !(self.optimizer.step_size.is_finite() && self.optimizer.step_size > 0.0) {
            return Err(VqlsError::Config(format!(
                "optimizer.step_size must be positive, got {}",
                self.optimizer.step_size
            )));
        }
        if !(self.gradient.epsilon.is_finite() && self.gradient.epsilon > 0.0) {
            return Err(VqlsError::Config(format!(
                "gradient.epsilon must be positive, got {}",
                self.gradient.epsilon
            )));
        }
        if self.engine.max_concurrency == 0 {
            return Err(VqlsError::Config("engine.max_concurrency must be at least 1".into()));
        }
        if !(1..=MAX_SIMULATOR_QUBITS).contains(&self.backend.max_qubits) {
            return Err(VqlsError::Config(format!(
                "backend.max_qubits must be in 1..={MAX_SIMULATOR_QUBITS}, got {}",
                self.backend.max_qubits
            )));
        }
        Ok(())
    }

    /// Build A from the configured terms.
    pub fn operator(&self) -> VqlsResult<PauliOperator> {
        let terms = self
            .operator
            .iter()
            .map(|t| PauliTerm::new(t.coeff.value()?, &t.pauli))
            .collect::<VqlsResult<Vec<_>>>()?;
        PauliOperator::new(terms)
    }

    /// Replace the configured terms with `operator`.
    pub fn set_operator(&mut self, operator: &PauliOperator) {
        self.operator = operator
            .terms()
            .iter()
            .map(|t| TermSpec {
                coeff: if t.coeff.im == 0.0 {
                    Coefficient::Real(t.coeff.re)
                } else {
                    Coefficient::Pair([t.coeff.re, t.coeff.im])
                },
                pauli: t.label(),
            })
            .collect();
    }

    /// Ansatz for an `n_qubits` operator.
    pub fn ansatz(&self, n_qubits: u32) -> Ansatz {
        Ansatz::new(n_qubits, self.ansatz.layers, self.ansatz.variant)
    }

    /// Optimizer from the configured budget.
    pub fn optimizer(&self) -> VqlsResult<GradientDescent> {
        GradientDescent::new(self.optimizer.iterations, self.optimizer.step_size)
    }
}

/// Read an operator from a line-oriented file (`<coefficient> <pauli>` per line).
pub fn load_operator_file<P: AsRef<Path>>(path: P) -> VqlsResult<PauliOperator> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    contents.parse().map_err(|e| match e {
        VqlsError::InvalidOperator(msg) => {
            VqlsError::InvalidOperator(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}
