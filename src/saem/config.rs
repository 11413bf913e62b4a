//! Estimator configuration
//!
//! The particle count is an explicit setting: it is required in JSON and
//! the [`Default`] impl is only a starting point for experiments.

use serde::{Deserialize, Serialize};

use super::step_size::StepSize;
use crate::common::resample::ResamplingScheme;
use crate::filter::DEFAULT_ANCESTOR_BANDWIDTH;
use crate::model::{ConfigError, ConfigResult};

/// Default seed used by [`crate::saem::SaemEstimator::run_seeded`].
pub const DEFAULT_SEED: u64 = 42;

fn default_step_size() -> StepSize {
    StepSize::default()
}

fn default_bandwidth() -> f64 {
    DEFAULT_ANCESTOR_BANDWIDTH
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// SAEM estimator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaemConfig {
    /// Particles per filter pass (N)
    pub particle_count: usize,
    /// Independent parameter draws (D)
    pub num_draws: usize,
    /// Outer iterations (L)
    pub chain_length: usize,
    /// γ schedule for the `Qh` recursion
    #[serde(default = "default_step_size")]
    pub step_size: StepSize,
    /// Standard deviation of the ancestor-sampling kernel
    #[serde(default = "default_bandwidth")]
    pub ancestor_bandwidth: f64,
    /// Resampling scheme used by the filters and the extractor
    #[serde(default)]
    pub resampling: ResamplingScheme,
    /// Seed for [`crate::saem::SaemEstimator::run_seeded`]
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl SaemConfig {
    /// Configuration with N particles, D draws and L iterations.
    pub fn new(particle_count: usize, num_draws: usize, chain_length: usize) -> Self {
        Self {
            particle_count,
            num_draws,
            chain_length,
            step_size: default_step_size(),
            ancestor_bandwidth: default_bandwidth(),
            resampling: ResamplingScheme::default(),
            seed: default_seed(),
        }
    }

    /// Set the step-size schedule.
    pub fn with_step_size(mut self, step_size: StepSize) -> Self {
        self.step_size = step_size;
        self
    }

    /// Set the ancestor-sampling kernel bandwidth.
    pub fn with_ancestor_bandwidth(mut self, bandwidth: f64) -> Self {
        self.ancestor_bandwidth = bandwidth;
        self
    }

    /// Set the resampling scheme.
    pub fn with_resampling(mut self, scheme: ResamplingScheme) -> Self {
        self.resampling = scheme;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check counts, bandwidth and step-size schedule.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.particle_count == 0 {
            return Err(ConfigError::Missing {
                field: "particle_count".to_string(),
            });
        }
        if self.num_draws == 0 {
            return Err(ConfigError::Missing {
                field: "num_draws".to_string(),
            });
        }
        if !self.ancestor_bandwidth.is_finite() || self.ancestor_bandwidth <= 0.0 {
            return Err(ConfigError::invalid(
                "ancestor_bandwidth",
                "must be finite and > 0",
            ));
        }
        self.step_size.validate(self.chain_length)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: SaemConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Serialize to pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for SaemConfig {
    fn default() -> Self {
        Self::new(100, 10, 20)
    }
}
