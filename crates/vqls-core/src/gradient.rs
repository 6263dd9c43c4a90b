//! Gradient estimators built on repeated objective evaluations.
//!
//! | Estimator | Evaluations | Formula |
//! |-----------|-------------|---------|
//! | [`FiniteDifference`] forward | p + 1 | (f(θ + εeᵢ) − f(θ)) / ε |
//! | [`FiniteDifference`] central | 2p | (f(θ + εeᵢ) − f(θ − εeᵢ)) / 2ε |
//! | [`ParameterShift`] | 2p | (f(θ + seᵢ) − f(θ − seᵢ)) / 2 sin s |
//!
//! The parameter-shift rule is exact for objectives that are trigonometric
//! quadratics in each Ry angle. The Hadamard-test denominator and the
//! swap-test numerator are of that form; the surrogate numerator is linear in
//! the amplitudes and the rule only approximates its derivative there.

use std::f64::consts::FRAC_PI_2;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{VqlsError, VqlsResult};

/// Default finite-difference step.
pub const DEFAULT_EPSILON: f64 = 1e-4;

/// A scalar function of the ansatz parameters.
#[async_trait]
pub trait Objective: Send + Sync {
    /// Required length of θ.
    fn num_parameters(&self) -> usize;

    /// Evaluate at θ.
    async fn value(&self, theta: &[f64]) -> VqlsResult<f64>;

    /// Human-readable context used in error reports.
    fn describe(&self) -> String {
        format!("objective with {} parameters", self.num_parameters())
    }
}

/// Computes ∇f(θ) from evaluations of an [`Objective`].
///
/// Implementations must not keep state between calls.
#[async_trait]
pub trait GradientEstimator: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Objective evaluations needed for one gradient of `p` parameters.
    fn evaluations(&self, p: usize) -> usize;

    /// Estimate the gradient at θ.
    async fn gradient(&self, objective: &dyn Objective, theta: &[f64]) -> VqlsResult<Vec<f64>>;
}

/// Finite-difference scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difference {
    /// One-sided difference.
    Forward,
    /// Symmetric difference.
    #[default]
    Central,
}

/// Finite-difference gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiniteDifference {
    /// Difference scheme.
    pub scheme: Difference,
    /// Step ε.
    pub epsilon: f64,
}

impl Default for FiniteDifference {
    fn default() -> Self {
        Self {
            scheme: Difference::Central,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl FiniteDifference {
    /// Central differences with step `epsilon`.
    pub fn central(epsilon: f64) -> Self {
        Self {
            scheme: Difference::Central,
            epsilon,
        }
    }

    /// Forward differences with step `epsilon`.
    pub fn forward(epsilon: f64) -> Self {
        Self {
            scheme: Difference::Forward,
            epsilon,
        }
    }
}

#[async_trait]
impl GradientEstimator for FiniteDifference {
    fn name(&self) -> &'static str {
        match self.scheme {
            Difference::Forward => "forward_difference",
            Difference::Central => "central_difference",
        }
    }

    fn evaluations(&self, p: usize) -> usize {
        match self.scheme {
            Difference::Forward => p + 1,
            Difference::Central => 2 * p,
        }
    }

    async fn gradient(&self, objective: &dyn Objective, theta: &[f64]) -> VqlsResult<Vec<f64>> {
        let eps = self.epsilon;
        let base = match self.scheme {
            Difference::Forward => Some(objective.value(theta).await?),
            Difference::Central => None,
        };

        let mut grad = Vec::with_capacity(theta.len());
        let mut shifted = theta.to_vec();
        for i in 0..theta.len() {
            shifted[i] = theta[i] + eps;
            let plus = objective.value(&shifted).await?;
            let g = match base {
                Some(f0) => (plus - f0) / eps,
                None => {
                    shifted[i] = theta[i] - eps;
                    let minus = objective.value(&shifted).await?;
                    (plus - minus) / (2.0 * eps)
                }
            };
            shifted[i] = theta[i];
            grad.push(g);
        }
        Ok(grad)
    }
}

/// Parameter-shift gradient for Ry-generated parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterShift {
    /// Shift s, π/2 by default.
    pub shift: f64,
}

impl Default for ParameterShift {
    fn default() -> Self {
        Self { shift: FRAC_PI_2 }
    }
}

#[async_trait]
impl GradientEstimator for ParameterShift {
    fn name(&self) -> &'static str {
        "parameter_shift"
    }

    fn evaluations(&self, p: usize) -> usize {
        2 * p
    }

    async fn gradient(&self, objective: &dyn Objective, theta: &[f64]) -> VqlsResult<Vec<f64>> {
        let s = self.shift;
        let denom = 2.0 * s.sin();
        let mut grad = Vec::with_capacity(theta.len());
        let mut shifted = theta.to_vec();
        for i in 0..theta.len() {
            shifted[i] = theta[i] + s;
            let plus = objective.value(&shifted).await?;
            shifted[i] = theta[i] - s;
            let minus = objective.value(&shifted).await?;
            shifted[i] = theta[i];
            grad.push((plus - minus) / denom);
        }
        Ok(grad)
    }
}

/// Gradient method as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientMethod {
    /// [`FiniteDifference`] with [`Difference::Forward`].
    Forward,
    /// [`FiniteDifference`] with [`Difference::Central`].
    #[default]
    Central,
    /// [`ParameterShift`] with s = π/2.
    ParameterShift,
}

impl GradientMethod {
    /// Build the estimator. `epsilon` only applies to finite differences.
    pub fn estimator(self, epsilon: f64) -> VqlsResult<Box<dyn GradientEstimator>> {
        if matches!(self, GradientMethod::Forward | GradientMethod::Central)
            && !(epsilon.is_finite() && epsilon > 0.0)
        {
            return Err(VqlsError::Config(format!(
                "finite-difference epsilon must be positive, got {epsilon}"
            )));
        }
        Ok(match self {
            GradientMethod::Forward => Box::new(FiniteDifference::forward(epsilon)),
            GradientMethod::Central => Box::new(FiniteDifference::central(epsilon)),
            GradientMethod::ParameterShift => Box::new(ParameterShift::default()),
        })
    }
}

impl std::str::FromStr for GradientMethod {
    type Err = VqlsError;

    fn from_str(s: &str) -> VqlsResult<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "forward" => Ok(GradientMethod::Forward),
            "central" => Ok(GradientMethod::Central),
            "parameter_shift" | "shift" => Ok(GradientMethod::ParameterShift),
            other => Err(VqlsError::Config(format!(
                "unknown gradient method '{other}', expected forward, central or parameter_shift"
            ))),
        }
    }
}

impl fmt::Display for GradientMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GradientMethod::Forward => "forward",
            GradientMethod::Central => "central",
            GradientMethod::ParameterShift => "parameter_shift",
        })
    }
}
