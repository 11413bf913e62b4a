//! Model-link capability interface.
//!
//! The estimator never looks up model behaviour ambiently: every filter and
//! the SAEM driver receive a [`ModelLink`] implementation at construction and
//! call exactly the operations it exposes:
//!
//! - transition function `f_θ(state, input) → next_state`
//! - observation likelihood `g_θ(state, observed_output) → density ≥ 0`
//! - input-uncertainty sampler (one disturbance draw per particle)
//! - prior and random-walk update distributions per estimated parameter
//! - model dimensions and the observed input/output flux series
//!
//! `theta` arguments are always the vector of *estimated* parameters, in
//! [`ModelLink::parameters`] order. Parameters held fixed live inside the
//! model implementation.

pub mod distributions;
pub mod errors;
pub mod reservoir;

use nalgebra::DMatrix;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use distributions::Distribution;
pub use errors::{ConfigError, ConfigResult};
pub use reservoir::{ParameterSetting, ReservoirConfig, ReservoirModel};

/// Model dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDimensions {
    /// Number of observed time steps T (state storage has T+1 columns)
    pub time_steps: usize,
    /// Number of transition steps K (K ≤ T)
    pub transition_steps: usize,
}

impl ModelDimensions {
    /// Create dimensions with `K == T`.
    pub fn new(time_steps: usize) -> Self {
        Self {
            time_steps,
            transition_steps: time_steps,
        }
    }

    /// Check that both dimensions are set and `K ≤ T`.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.time_steps == 0 {
            return Err(ConfigError::Missing {
                field: "time_steps".to_string(),
            });
        }
        if self.transition_steps == 0 {
            return Err(ConfigError::Missing {
                field: "transition_steps".to_string(),
            });
        }
        if self.transition_steps > self.time_steps {
            return Err(ConfigError::invalid(
                "transition_steps",
                format!(
                    "{} transition steps exceed {} time steps",
                    self.transition_steps, self.time_steps
                ),
            ));
        }
        Ok(())
    }
}

/// One estimated parameter: its identifier, prior and update distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter identifier
    pub name: String,
    /// Distribution of the initial draws
    pub prior: Distribution,
    /// Distribution of random-walk increments
    pub update: Distribution,
}

impl ParameterSpec {
    /// Create a new parameter specification
    pub fn new(name: impl Into<String>, prior: Distribution, update: Distribution) -> Self {
        Self {
            name: name.into(),
            prior,
            update,
        }
    }
}

/// Capability interface the estimator is built against.
///
/// Implementations must be `Send + Sync` so per-draw filter passes can run
/// in parallel.
pub trait ModelLink: Send + Sync {
    /// Number of time steps T and transition steps K.
    fn dimensions(&self) -> ModelDimensions;

    /// Estimated parameters, in `theta` order.
    fn parameters(&self) -> &[ParameterSpec];

    /// Observed input flux series (length T).
    fn influx(&self) -> &[f64];

    /// Observed output flux series (length T).
    fn outflux(&self) -> &[f64];

    /// Transition `x_{k+1} = f_θ(x_k, r_k)`.
    fn transition(&self, state: f64, input: f64, theta: &[f64]) -> f64;

    /// Observation density `g_θ(state, observed) ≥ 0`.
    fn observation_likelihood(&self, state: f64, observed: f64, theta: &[f64]) -> f64;

    /// Log observation density. Override for numerical stability in the tails.
    fn log_observation_likelihood(&self, state: f64, observed: f64, theta: &[f64]) -> f64 {
        self.observation_likelihood(state, observed, theta).ln()
    }

    /// Input-uncertainty model: fill `out` with one disturbance draw per
    /// particle for a step whose observed input is `influx`.
    ///
    /// Whether the draw is shared across particles or independent per
    /// particle is the model's choice.
    fn sample_inputs<R: Rng + ?Sized>(&self, rng: &mut R, influx: f64, out: &mut [f64]);

    /// State at step 0. Defaults to the first observed output.
    fn initial_state(&self) -> f64 {
        self.outflux().first().copied().unwrap_or(0.0)
    }

    /// Number of estimated parameters P.
    fn num_parameters(&self) -> usize {
        self.parameters().len()
    }

    /// Identifiers of the estimated parameters.
    fn parameter_names(&self) -> Vec<String> {
        self.parameters().iter().map(|p| p.name.clone()).collect()
    }

    /// Draw `count` parameter vectors from the priors, one per row ([count, P]).
    fn sample_theta_from_prior<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
    ) -> ConfigResult<DMatrix<f64>> {
        let params = self.parameters();
        let mut theta = DMatrix::zeros(count, params.len());
        for (p, spec) in params.iter().enumerate() {
            let draws = spec.prior.draw(rng, count)?;
            for (d, value) in draws.into_iter().enumerate() {
                theta[(d, p)] = value;
            }
        }
        Ok(theta)
    }

    /// Check dimensions, series lengths and distributions.
    fn validate(&self) -> ConfigResult<()> {
        let dims = self.dimensions();
        dims.validate()?;
        for (field, series) in [("influx", self.influx()), ("outflux", self.outflux())] {
            if series.len() != dims.time_steps {
                return Err(ConfigError::LengthMismatch {
                    field: field.to_string(),
                    expected: dims.time_steps,
                    actual: series.len(),
                });
            }
            if let Some(i) = series.iter().position(|v| !v.is_finite()) {
                return Err(ConfigError::invalid(
                    field,
                    format!("non-finite value at index {}", i),
                ));
            }
        }
        if self.parameters().is_empty() {
            return Err(ConfigError::Missing {
                field: "parameters".to_string(),
            });
        }
        for spec in self.parameters() {
            spec.prior.validate()?;
            spec.update.validate()?;
        }
        if !self.initial_state().is_finite() {
            return Err(ConfigError::invalid("initial_state", "must be finite"));
        }
        Ok(())
    }
}
