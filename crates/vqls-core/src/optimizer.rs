//! Fixed-budget gradient descent.
//!
//! Each iteration computes the full gradient at the current θ, forms
//! θ' = θ − η·∇C(θ), evaluates C(θ') and only then commits θ'. There is no
//! convergence test; the loop runs for exactly `iterations` steps unless it is
//! stopped or an evaluation fails.
//!
//! Stopping goes through a [`StopHandle`]/[`StopSignal`] pair backed by a
//! `tokio::sync::watch` channel. A stop that lands mid-iteration drops the
//! in-flight evaluations and leaves θ at the last committed value.

use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{VqlsError, VqlsResult};
use crate::gradient::{GradientEstimator, Objective};

/// Default number of descent steps.
pub const DEFAULT_ITERATIONS: usize = 50;

/// Default step size η.
pub const DEFAULT_STEP_SIZE: f64 = 0.1;

/// Requests a running optimization to stop.
#[derive(Debug, Clone)]
pub struct StopHandle(std::sync::Arc<watch::Sender<bool>>);

impl StopHandle {
    /// Signal every attached [`StopSignal`].
    pub fn stop(&self) {
        self.0.send_replace(true);
    }
}

/// Observes a [`StopHandle`].
#[derive(Debug, Clone)]
pub struct StopSignal(watch::Receiver<bool>);

impl StopSignal {
    /// True once a stop was requested.
    pub fn is_stopped(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolve when a stop is requested. Never resolves if every handle is
    /// dropped first.
    pub async fn stopped(&mut self) {
        if self.0.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Create a connected stop pair.
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle(std::sync::Arc::new(tx)), StopSignal(rx))
}

/// One completed descent step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationReport {
    /// 1-based step index.
    pub iteration: usize,
    /// C(θ) after the update.
    pub cost: f64,
    /// ‖∇C‖₂ at the pre-update θ.
    pub gradient_norm: f64,
    /// Wall time of the step.
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }
}

/// Outcome of [`GradientDescent::minimize`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    /// Last committed parameters.
    pub theta: Vec<f64>,
    /// C(θ₀).
    pub initial_cost: f64,
    /// C(θ) after every committed update, in order.
    pub history: Vec<f64>,
    /// Per-step details, aligned with `history`.
    pub steps: Vec<IterationReport>,
    /// True when the run ended on a stop request.
    pub stopped: bool,
}

impl OptimizationResult {
    /// Number of committed updates.
    pub fn iterations_completed(&self) -> usize {
        self.history.len()
    }

    /// Cost at the returned θ.
    pub fn final_cost(&self) -> f64 {
        self.history.last().copied().unwrap_or(self.initial_cost)
    }

    /// Lowest cost seen, including θ₀.
    pub fn best_cost(&self) -> f64 {
        self.history.iter().copied().fold(self.initial_cost, f64::min)
    }
}

/// Plain gradient descent with a fixed budget and step size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientDescent {
    /// Number of steps.
    pub iterations: usize,
    /// Step size η.
    pub step_size: f64,
}

impl Default for GradientDescent {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            step_size: DEFAULT_STEP_SIZE,
        }
    }
}

enum Step<T> {
    Done(VqlsResult<T>),
    Stopped,
}

async fn until_stopped<T>(
    signal: Option<&mut StopSignal>,
    work: impl Future<Output = VqlsResult<T>>,
) -> Step<T> {
    match signal {
        Some(signal) => tokio::select! {
            biased;
            () = signal.stopped() => Step::Stopped,
            out = work => Step::Done(out),
        },
        None => Step::Done(work.await),
    }
}

impl GradientDescent {
    /// Create an optimizer.
    pub fn new(iterations: usize, step_size: f64) -> VqlsResult<Self> {
        if !(step_size.is_finite() && step_size > 0.0) {
            return Err(VqlsError::Config(format!(
                "step size must be positive, got {step_size}"
            )));
        }
        Ok(Self {
            iterations,
            step_size,
        })
    }

    /// Minimize `objective` from `theta0`.
    ///
    /// `on_step` runs after each committed update. Failures are reported as
    /// [`VqlsError::Aborted`] carrying the step index (0 for the initial
    /// evaluation) and the objective's description.
    pub async fn minimize<F>(
        &self,
        objective: &dyn Objective,
        gradient: &dyn GradientEstimator,
        theta0: Vec<f64>,
        mut stop: Option<StopSignal>,
        mut on_step: F,
    ) -> VqlsResult<OptimizationResult>
    where
        F: FnMut(&IterationReport) + Send,
    {
        let abort = |iteration: usize, source: VqlsError| VqlsError::Aborted {
            iteration,
            context: objective.describe(),
            source: Box::new(source),
        };

        let mut theta = theta0;
        let mut result = OptimizationResult {
            theta: Vec::new(),
            initial_cost: f64::NAN,
            history: Vec::with_capacity(self.iterations),
            steps: Vec::with_capacity(self.iterations),
            stopped: false,
        };

        match until_stopped(stop.as_mut(), objective.value(&theta)).await {
            Step::Done(cost) => result.initial_cost = cost.map_err(|e| abort(0, e))?,
            Step::Stopped => {
                result.stopped = true;
                result.theta = theta;
                return Ok(result);
            }
        }
        debug!(
            cost = result.initial_cost,
            parameters = theta.len(),
            estimator = gradient.name(),
            evaluations_per_step = gradient.evaluations(theta.len()) + 1,
            "starting gradient descent"
        );

        for iteration in 1..=self.iterations {
            let started = Instant::now();
            let work = async {
                let grad = gradient.gradient(objective, &theta).await?;
                let next: Vec<f64> = theta
                    .iter()
                    .zip(&grad)
                    .map(|(t, g)| t - self.step_size * g)
                    .collect();
                let cost = objective.value(&next).await?;
                Ok::<_, VqlsError>((next, grad, cost))
            };

            let (next, grad, cost) = match until_stopped(stop.as_mut(), work).await {
                Step::Done(out) => out.map_err(|e| abort(iteration, e))?,
                Step::Stopped => {
                    info!(iteration, "stop requested, discarding in-flight step");
                    result.stopped = true;
                    break;
                }
            };
            theta = next;

            let report = IterationReport {
                iteration,
                cost,
                gradient_norm: grad.iter().map(|g| g * g).sum::<f64>().sqrt(),
                elapsed: started.elapsed(),
            };
            info!(
                iteration,
                cost,
                gradient_norm = report.gradient_norm,
                "descent step"
            );
            on_step(&report);
            result.history.push(cost);
            result.steps.push(report);
        }

        result.theta = theta;
        Ok(result)
    }
}
