//! Stochastic-approximation step sizes
//!
//! The schedule is indexed by `0` for initialization and `ll + 1` for outer
//! iteration `ll`, so a chain of length L consumes indices `0..=L`.

use serde::{Deserialize, Serialize};

use crate::model::{ConfigError, ConfigResult};

/// Step-size schedule γ for the `Qh` recursion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepSize {
    /// Same γ at every index
    Constant(f64),
    /// Explicit γ per index (length ≥ L+1)
    Sequence(Vec<f64>),
    /// γ = 1 for indices below `burn_in`, then `1 / (i - burn_in + 1)`
    BurnIn {
        /// Number of leading indices with γ = 1
        burn_in: usize,
    },
}

impl Default for StepSize {
    fn default() -> Self {
        StepSize::Constant(0.75)
    }
}

impl StepSize {
    /// γ at schedule index `index`.
    ///
    /// A sequence shorter than `index + 1` repeats its last value; validated
    /// schedules never hit that case.
    pub fn at(&self, index: usize) -> f64 {
        match self {
            StepSize::Constant(gamma) => *gamma,
            StepSize::Sequence(values) => values
                .get(index)
                .or_else(|| values.last())
                .copied()
                .unwrap_or(1.0),
            StepSize::BurnIn { burn_in } => {
                if index < *burn_in {
                    1.0
                } else {
                    1.0 / (index - burn_in + 1) as f64
                }
            }
        }
    }

    /// Check the schedule covers a chain of length `chain_length` with
    /// values in `(0, 1]`.
    pub fn validate(&self, chain_length: usize) -> ConfigResult<()> {
        let check = |gamma: f64| {
            if gamma > 0.0 && gamma <= 1.0 {
                Ok(())
            } else {
                Err(ConfigError::invalid(
                    "step_size",
                    format!("{} is outside (0, 1]", gamma),
                ))
            }
        };
        match self {
            StepSize::Constant(gamma) => check(*gamma),
            StepSize::Sequence(values) => {
                if values.len() < chain_length + 1 {
                    return Err(ConfigError::LengthMismatch {
                        field: "step_size".to_string(),
                        expected: chain_length + 1,
                        actual: values.len(),
                    });
                }
                values.iter().try_for_each(|&gamma| check(gamma))
            }
            StepSize::BurnIn { .. } => Ok(()),
        }
    }
}
