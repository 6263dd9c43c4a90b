//! End-to-end solve: configuration and backend in, optimized θ out.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use vqls_hal::Backend;

use crate::ansatz::Ansatz;
use crate::config::ProblemConfig;
use crate::cost::{CostEstimate, CostFunction};
use crate::engine::MeasurementEngine;
use crate::error::{VqlsError, VqlsResult};
use crate::gradient::GradientEstimator;
use crate::optimizer::{GradientDescent, IterationReport, OptimizationResult, StopSignal};
use crate::pauli::PauliOperator;
use crate::protocol::EstimationMode;

/// Summary of a finished solve.
#[derive(Debug, Clone, Serialize)]
pub struct SolveReport {
    /// A, as text.
    pub operator: String,
    /// Ansatz structure.
    pub ansatz: Ansatz,
    /// Numerator estimation mode.
    pub estimation: EstimationMode,
    /// Gradient estimator name.
    pub gradient: &'static str,
    /// Shots per circuit (0 = exact).
    pub shots: u32,
    /// Optimizer outcome.
    #[serde(flatten)]
    pub result: OptimizationResult,
}

/// A configured VQLS problem bound to a backend.
#[derive(Debug)]
pub struct Solver {
    cost: CostFunction,
    optimizer: GradientDescent,
    gradient: Box<dyn GradientEstimator>,
}

impl Solver {
    /// Build a solver for `operator` using the remaining settings of `config`.
    pub fn new(
        config: &ProblemConfig,
        operator: PauliOperator,
        backend: Arc<dyn Backend>,
    ) -> VqlsResult<Self> {
        config.validate()?;
        let n = u32::try_from(operator.n_qubits())
            .map_err(|_| VqlsError::Config("operator is too wide".into()))?;
        let engine = MeasurementEngine::new(backend, config.engine.shots)?
            .with_max_concurrency(config.engine.max_concurrency);
        let cost = CostFunction::new(operator, config.ansatz(n), config.estimation, engine)?
            .with_simplified_product(config.engine.simplify_products)?;
        Ok(Self {
            cost,
            optimizer: config.optimizer()?,
            gradient: config.gradient.method.estimator(config.gradient.epsilon)?,
        })
    }

    /// Build a solver for the operator listed in `config`.
    pub fn from_config(config: &ProblemConfig, backend: Arc<dyn Backend>) -> VqlsResult<Self> {
        Self::new(config, config.operator()?, backend)
    }

    /// The cost function being minimized.
    pub fn cost(&self) -> &CostFunction {
        &self.cost
    }

    /// The optimizer settings.
    pub fn optimizer(&self) -> &GradientDescent {
        &self.optimizer
    }

    /// The gradient estimator.
    pub fn gradient(&self) -> &dyn GradientEstimator {
        self.gradient.as_ref()
    }

    /// θ₀: the zero vector of the ansatz length.
    pub fn initial_parameters(&self) -> Vec<f64> {
        self.cost.ansatz().zero_parameters()
    }

    /// Evaluate the cost once at θ.
    pub async fn evaluate(&self, theta: &[f64]) -> VqlsResult<CostEstimate> {
        self.cost.evaluate(theta).await
    }

    /// Run gradient descent from θ₀.
    pub async fn run<F>(&self, stop: Option<StopSignal>, on_step: F) -> VqlsResult<SolveReport>
    where
        F: FnMut(&IterationReport) + Send,
    {
        info!(
            operator = %self.cost.operator(),
            ansatz = %self.cost.ansatz(),
            estimation = %self.cost.mode(),
            gradient = self.gradient.name(),
            iterations = self.optimizer.iterations,
            "solving"
        );
        let result = self
            .optimizer
            .minimize(
                &self.cost,
                self.gradient.as_ref(),
                self.initial_parameters(),
                stop,
                on_step,
            )
            .await?;
        info!(
            initial = result.initial_cost,
            final_cost = result.final_cost(),
            steps = result.iterations_completed(),
            stopped = result.stopped,
            "solve finished"
        );
        Ok(SolveReport {
            operator: self.cost.operator().to_string(),
            ansatz: *self.cost.ansatz(),
            estimation: self.cost.mode(),
            gradient: self.gradient.name(),
            shots: self.cost.engine().shots(),
            result,
        })
    }
}
