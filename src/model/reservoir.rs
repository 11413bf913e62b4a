//! Linear reservoir reference model
//!
//! A scalar storage driven by an uncertain input flux:
//!
//! ```text
//! x_{k+1} = decay · x_k + r_k        r_k ~ N(influx_k, input_std²)
//! y_k     ~ N(x_{k+1}, obs_std²)
//! ```
//!
//! `decay` and `obs_std` are each either fixed or estimated. Estimated
//! parameters appear in `theta` in that order (decay first).

use rand::Rng;
use rand_distr::{Distribution as _, Normal};
use serde::{Deserialize, Serialize};

use super::distributions::Distribution;
use super::errors::{ConfigError, ConfigResult};
use super::{ModelDimensions, ModelLink, ParameterSpec};
use crate::common::utils::{gaussian_log_pdf, gaussian_pdf};

/// Identifier of the decay parameter.
pub const DECAY: &str = "decay";
/// Identifier of the observation noise parameter.
pub const OBS_STD: &str = "obs_std";

/// Whether a model parameter is held fixed or estimated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ParameterSetting {
    /// Held at `value`
    Fixed {
        /// Fixed value
        value: f64,
    },
    /// Estimated by the SAEM driver
    Estimated {
        /// Prior used for initial draws
        prior: Distribution,
        /// Random-walk update distribution
        update: Distribution,
    },
}

impl ParameterSetting {
    /// Fixed parameter.
    pub fn fixed(value: f64) -> Self {
        ParameterSetting::Fixed { value }
    }

    /// Estimated parameter.
    pub fn estimated(prior: Distribution, update: Distribution) -> Self {
        ParameterSetting::Estimated { prior, update }
    }
}

/// Serializable description of a reservoir model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservoirConfig {
    /// Storage decay per step
    pub decay: ParameterSetting,
    /// Observation noise standard deviation
    pub obs_std: ParameterSetting,
    /// Input uncertainty standard deviation (≥ 0)
    pub input_std: f64,
    /// Observed input flux (length T)
    pub influx: Vec<f64>,
    /// Observed output flux (length T)
    pub outflux: Vec<f64>,
    /// Transition steps K (defaults to T)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_steps: Option<usize>,
    /// Storage at step 0 (defaults to the first observed output)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<f64>,
}

/// Where a parameter's value comes from at evaluation time
#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    Fixed(f64),
    Theta(usize),
}

impl Slot {
    #[inline]
    fn value(self, theta: &[f64]) -> f64 {
        match self {
            Slot::Fixed(v) => v,
            Slot::Theta(i) => theta[i],
        }
    }
}

/// Linear reservoir implementing [`ModelLink`]
#[derive(Debug, Clone)]
pub struct ReservoirModel {
    config: ReservoirConfig,
    parameters: Vec<ParameterSpec>,
    decay: Slot,
    obs_std: Slot,
}

impl ReservoirModel {
    /// Build and validate a model from its configuration.
    pub fn from_config(config: ReservoirConfig) -> ConfigResult<Self> {
        if !config.input_std.is_finite() || config.input_std < 0.0 {
            return Err(ConfigError::invalid("input_std", "must be finite and >= 0"));
        }

        let mut parameters = Vec::new();
        let mut slot_for = |name: &str, setting: &ParameterSetting| match setting {
            ParameterSetting::Fixed { value } => Slot::Fixed(*value),
            ParameterSetting::Estimated { prior, update } => {
                parameters.push(ParameterSpec::new(name, prior.clone(), update.clone()));
                Slot::Theta(parameters.len() - 1)
            }
        };
        let decay = slot_for(DECAY, &config.decay);
        let obs_std = slot_for(OBS_STD, &config.obs_std);

        let model = Self {
            config,
            parameters,
            decay,
            obs_std,
        };
        model.validate()?;
        Ok(model)
    }

    /// Parse a JSON [`ReservoirConfig`] and build the model.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: ReservoirConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    /// Model with `decay` and `obs_std` settings over the given series.
    pub fn new(
        influx: Vec<f64>,
        outflux: Vec<f64>,
        decay: ParameterSetting,
        obs_std: ParameterSetting,
        input_std: f64,
    ) -> ConfigResult<Self> {
        Self::from_config(ReservoirConfig {
            decay,
            obs_std,
            input_std,
            influx,
            outflux,
            transition_steps: None,
            initial_state: None,
        })
    }

    /// Override the storage at step 0.
    pub fn with_initial_state(mut self, x0: f64) -> ConfigResult<Self> {
        self.config.initial_state = Some(x0);
        self.validate()?;
        Ok(self)
    }

    /// Run fewer transition steps than observed time steps.
    pub fn with_transition_steps(mut self, k: usize) -> ConfigResult<Self> {
        self.config.transition_steps = Some(k);
        self.validate()?;
        Ok(self)
    }

    /// Underlying configuration.
    pub fn config(&self) -> &ReservoirConfig {
        &self.config
    }

    /// Input uncertainty standard deviation.
    pub fn input_std(&self) -> f64 {
        self.config.input_std
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.config).unwrap_or_else(|_| "{}".to_string())
    }
}

impl ModelLink for ReservoirModel {
    fn dimensions(&self) -> ModelDimensions {
        let time_steps = self.config.outflux.len();
        ModelDimensions {
            time_steps,
            transition_steps: self.config.transition_steps.unwrap_or(time_steps),
        }
    }

    fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    fn influx(&self) -> &[f64] {
        &self.config.influx
    }

    fn outflux(&self) -> &[f64] {
        &self.config.outflux
    }

    #[inline]
    fn transition(&self, state: f64, input: f64, theta: &[f64]) -> f64 {
        self.decay.value(theta) * state + input
    }

    // The noise scale enters as |σ| so random-walk proposals may cross zero.
    #[inline]
    fn observation_likelihood(&self, state: f64, observed: f64, theta: &[f64]) -> f64 {
        gaussian_pdf(observed, state, self.obs_std.value(theta).abs())
    }

    #[inline]
    fn log_observation_likelihood(&self, state: f64, observed: f64, theta: &[f64]) -> f64 {
        gaussian_log_pdf(observed, state, self.obs_std.value(theta).abs())
    }

    fn sample_inputs<R: Rng + ?Sized>(&self, rng: &mut R, influx: f64, out: &mut [f64]) {
        let std = self.config.input_std;
        match Normal::new(influx, std) {
            Ok(noise) if std > 0.0 => out.iter_mut().for_each(|r| *r = noise.sample(rng)),
            _ => out.iter_mut().for_each(|r| *r = influx),
        }
    }

    fn initial_state(&self) -> f64 {
        self.config
            .initial_state
            .or_else(|| self.config.outflux.first().copied())
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::rng::SimpleRng;
    use approx::assert_relative_eq;

    fn series() -> (Vec<f64>, Vec<f64>) {
        (vec![1.0; 4], vec![5.0, 4.5, 4.2, 4.0])
    }

    #[test]
    fn test_estimated_parameters_in_order() {
        let (influx, outflux) = series();
        let model = ReservoirModel::new(
            influx,
            outflux,
            ParameterSetting::estimated(
                Distribution::Uniform { low: 0.1, high: 0.9 },
                Distribution::random_walk(0.05),
            ),
            ParameterSetting::estimated(
                Distribution::Uniform { low: 0.1, high: 1.0 },
                Distribution::random_walk(0.01),
            ),
            0.1,
        )
        .unwrap();
        assert_eq!(model.parameter_names(), vec![DECAY, OBS_STD]);
        assert_relative_eq!(model.transition(2.0, 1.0, &[0.5, 0.3]), 2.0);
        assert_eq!(model.initial_state(), 5.0);
        assert_eq!(model.dimensions(), ModelDimensions::new(4));
    }

    #[test]
    fn test_fixed_parameters_are_not_in_theta() {
        let (influx, outflux) = series();
        let model = ReservoirModel::new(
            influx,
            outflux,
            ParameterSetting::fixed(0.8),
            ParameterSetting::estimated(
                Distribution::Uniform { low: 0.1, high: 1.0 },
                Distribution::random_walk(0.01),
            ),
            0.1,
        )
        .unwrap();
        assert_eq!(model.num_parameters(), 1);
        assert_relative_eq!(model.transition(10.0, 0.0, &[0.2]), 8.0);
        assert_relative_eq!(
            model.log_observation_likelihood(1.0, 1.0, &[0.2]),
            model.observation_likelihood(1.0, 1.0, &[0.2]).ln(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_zero_input_std_is_deterministic() {
        let (influx, outflux) = series();
        let model = ReservoirModel::new(
            influx,
            outflux,
            ParameterSetting::estimated(
                Distribution::Uniform { low: 0.1, high: 0.9 },
                Distribution::random_walk(0.05),
            ),
            ParameterSetting::fixed(0.1),
            0.0,
        )
        .unwrap();
        let mut out = vec![0.0; 5];
        model.sample_inputs(&mut SimpleRng::new(1), 2.5, &mut out);
        assert!(out.iter().all(|&r| r == 2.5));
    }

    #[test]
    fn test_validation_failures() {
        let estimated = || {
            ParameterSetting::estimated(
                Distribution::Uniform { low: 0.1, high: 0.9 },
                Distribution::random_walk(0.05),
            )
        };
        let err = ReservoirModel::new(
            vec![1.0; 3],
            vec![1.0; 4],
            estimated(),
            ParameterSetting::fixed(0.1),
            0.1,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::LengthMismatch { .. }));

        let err = ReservoirModel::new(
            vec![1.0; 4],
            vec![1.0; 4],
            ParameterSetting::fixed(0.5),
            ParameterSetting::fixed(0.1),
            0.1,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));

        let model = ReservoirModel::new(
            vec![1.0; 4],
            vec![1.0; 4],
            estimated(),
            ParameterSetting::fixed(0.1),
            0.1,
        )
        .unwrap();
        assert!(model.clone().with_transition_steps(5).is_err());
        assert_eq!(
            model.with_transition_steps(3).unwrap().dimensions().transition_steps,
            3
        );
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "decay": {"mode": "estimated",
                      "prior": {"kind": "uniform", "low": 0.2, "high": 1.0},
                      "update": {"kind": "normal", "mean": 0.0, "std": 0.05}},
            "obs_std": {"mode": "fixed", "value": 0.1},
            "input_std": 0.2,
            "influx": [1.0, 1.0, 1.0],
            "outflux": [3.0, 3.1, 2.9],
            "initial_state": 2.5
        }"#;
        let model = ReservoirModel::from_json(json).unwrap();
        assert_eq!(model.num_parameters(), 1);
        assert_eq!(model.initial_state(), 2.5);

        let round_trip = ReservoirModel::from_json(&model.to_json()).unwrap();
        assert_eq!(round_trip.config(), model.config());

        assert!(matches!(
            ReservoirModel::from_json("{}"),
            Err(ConfigError::Parse { .. })
        ));
    }
}
