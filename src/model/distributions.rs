//! Prior and random-walk update distributions
//!
//! Each estimated parameter carries two of these: a prior, used for the
//! initial parameter draws, and an update distribution, whose draws are
//! added to the current estimate as random-walk increments.

use rand::Rng;
use rand_distr::{Distribution as _, LogNormal, Normal, Uniform};
use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigResult};

/// Univariate distribution exposing `draw(count)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Distribution {
    /// Gaussian `N(mean, std²)`
    Normal {
        /// Mean
        mean: f64,
        /// Standard deviation (> 0)
        std: f64,
    },
    /// Continuous uniform on `[low, high)`
    Uniform {
        /// Lower bound
        low: f64,
        /// Upper bound (> low)
        high: f64,
    },
    /// Log-normal with log-scale location `mu` and scale `sigma`
    LogNormal {
        /// Location of `ln X`
        mu: f64,
        /// Scale of `ln X` (> 0)
        sigma: f64,
    },
    /// Point mass
    Constant {
        /// The value every draw returns
        value: f64,
    },
}

impl Distribution {
    /// Zero-mean Gaussian random-walk step.
    pub fn random_walk(std: f64) -> Self {
        Distribution::Normal { mean: 0.0, std }
    }

    /// Short identifier used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Distribution::Normal { .. } => "normal",
            Distribution::Uniform { .. } => "uniform",
            Distribution::LogNormal { .. } => "log_normal",
            Distribution::Constant { .. } => "constant",
        }
    }

    /// Check the parameters without drawing.
    pub fn validate(&self) -> ConfigResult<()> {
        let reject = |reason: &str| {
            Err(ConfigError::InvalidDistribution {
                kind: self.kind(),
                reason: reason.to_string(),
            })
        };
        match *self {
            Distribution::Normal { mean, std } => {
                if !mean.is_finite() || !std.is_finite() || std <= 0.0 {
                    return reject("mean must be finite and std finite and > 0");
                }
            }
            Distribution::Uniform { low, high } => {
                if !low.is_finite() || !high.is_finite() || low >= high {
                    return reject("bounds must be finite with low < high");
                }
            }
            Distribution::LogNormal { mu, sigma } => {
                if !mu.is_finite() || !sigma.is_finite() || sigma <= 0.0 {
                    return reject("mu must be finite and sigma finite and > 0");
                }
            }
            Distribution::Constant { value } => {
                if !value.is_finite() {
                    return reject("value must be finite");
                }
            }
        }
        Ok(())
    }

    /// Draw `count` independent samples.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> ConfigResult<Vec<f64>> {
        self.validate()?;
        let samples = match *self {
            Distribution::Normal { mean, std } => {
                let d = Normal::new(mean, std).map_err(|e| self.rejected(e))?;
                (0..count).map(|_| d.sample(rng)).collect()
            }
            Distribution::Uniform { low, high } => {
                let d = Uniform::new(low, high);
                (0..count).map(|_| d.sample(rng)).collect()
            }
            Distribution::LogNormal { mu, sigma } => {
                let d = LogNormal::new(mu, sigma).map_err(|e| self.rejected(e))?;
                (0..count).map(|_| d.sample(rng)).collect()
            }
            Distribution::Constant { value } => vec![value; count],
        };
        Ok(samples)
    }

    fn rejected(&self, e: impl std::fmt::Display) -> ConfigError {
        ConfigError::InvalidDistribution {
            kind: self.kind(),
            reason: e.to_string(),
        }
    }
}
