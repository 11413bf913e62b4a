//! Error types for the particle filters and the resampling primitive
//!
//! Every failure carries the time step it happened at, so a failing run can
//! be reproduced from its seed.

use std::fmt;

use crate::model::ConfigError;

/// Result alias for particle-system operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur while running a particle filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Missing or inconsistent dimensions / settings
    Configuration {
        /// Description of the configuration issue
        description: String,
    },

    /// Dimension mismatch between expected and actual
    DimensionMismatch {
        /// What was expected
        expected: usize,
        /// What was received
        actual: usize,
        /// Context (e.g., "ancestor rows", "reference trajectory length")
        context: String,
    },

    /// Every particle has zero observation likelihood
    ///
    /// With zero observation noise this is the usual outcome: no particle
    /// lands exactly on the observation.
    DegenerateWeights {
        /// Step whose re-weighting produced all `-inf` log-weights
        time_step: usize,
    },

    /// A log-weight is NaN or `+inf`
    ///
    /// A particle that hits the observation exactly under zero observation
    /// noise has infinite density and lands here, not in
    /// [`FilterError::DegenerateWeights`].
    NonFiniteWeight {
        /// Step at which the weight appeared
        time_step: usize,
        /// Particle index
        index: usize,
        /// Offending value
        value: f64,
    },

    /// Ancestor index outside `[0, N)` (upstream resampling bug or corrupt state)
    AncestorOutOfRange {
        /// Particle whose ancestor is invalid
        particle: usize,
        /// Step of the ancestor column
        time_step: usize,
        /// The invalid index
        index: usize,
        /// Number of particles N
        particle_count: usize,
    },

    /// Resampling failed for a reason other than degenerate weights
    Resample {
        /// Step being resampled
        time_step: usize,
        /// Underlying failure
        source: ResampleError,
    },
}

impl FilterError {
    /// Map a resampling failure at `time_step` onto the filter taxonomy.
    ///
    /// All-zero weights become [`FilterError::DegenerateWeights`], invalid
    /// weights become [`FilterError::NonFiniteWeight`].
    pub fn from_resample(time_step: usize, source: ResampleError) -> Self {
        match source {
            ResampleError::AllWeightsZero => FilterError::DegenerateWeights { time_step },
            ResampleError::InvalidWeight { index, value } => FilterError::NonFiniteWeight {
                time_step,
                index,
                value,
            },
            other => FilterError::Resample {
                time_step,
                source: other,
            },
        }
    }

    /// Time step associated with the error, if any.
    pub fn time_step(&self) -> Option<usize> {
        match self {
            FilterError::DegenerateWeights { time_step }
            | FilterError::NonFiniteWeight { time_step, .. }
            | FilterError::AncestorOutOfRange { time_step, .. }
            | FilterError::Resample { time_step, .. } => Some(*time_step),
            _ => None,
        }
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::Configuration { description } => {
                write!(f, "Configuration error: {}", description)
            }
            FilterError::DimensionMismatch {
                expected,
                actual,
                context,
            } => {
                write!(
                    f,
                    "Dimension mismatch for {}: expected {}, got {}",
                    context, expected, actual
                )
            }
            FilterError::DegenerateWeights { time_step } => {
                write!(
                    f,
                    "Degenerate weights at step {}: every particle has zero likelihood",
                    time_step
                )
            }
            FilterError::NonFiniteWeight {
                time_step,
                index,
                value,
            } => {
                write!(
                    f,
                    "Non-finite log-weight {} for particle {} at step {}",
                    value, index, time_step
                )
            }
            FilterError::AncestorOutOfRange {
                particle,
                time_step,
                index,
                particle_count,
            } => {
                write!(
                    f,
                    "Ancestor index {} of particle {} at step {} is outside [0, {})",
                    index, particle, time_step, particle_count
                )
            }
            FilterError::Resample { time_step, source } => {
                write!(f, "Resampling failed at step {}: {}", time_step, source)
            }
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FilterError::Resample { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for FilterError {
    fn from(e: ConfigError) -> Self {
        FilterError::Configuration {
            description: e.to_string(),
        }
    }
}

/// Errors that can occur while resampling
#[derive(Debug, Clone, PartialEq)]
pub enum ResampleError {
    /// No weights were supplied
    EmptyWeights,

    /// Zero draws were requested
    ZeroCount,

    /// A weight is NaN or `+inf`
    InvalidWeight {
        /// Index of the weight
        index: usize,
        /// Offending value
        value: f64,
    },

    /// Every weight is `-inf`
    AllWeightsZero,
}

impl fmt::Display for ResampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResampleError::EmptyWeights => write!(f, "No weights to resample from"),
            ResampleError::ZeroCount => write!(f, "Requested zero resampled indices"),
            ResampleError::InvalidWeight { index, value } => {
                write!(f, "Invalid log-weight {} at index {}", value, index)
            }
            ResampleError::AllWeightsZero => write!(f, "All weights are zero (log-weight -inf)"),
        }
    }
}

impl std::error::Error for ResampleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_error_display() {
        let err = FilterError::DegenerateWeights { time_step: 3 };
        assert!(err.to_string().contains("step 3"));

        let err = FilterError::DimensionMismatch {
            expected: 4,
            actual: 6,
            context: "ancestor rows".to_string(),
        };
        assert!(err.to_string().contains("4"));
        assert!(err.to_string().contains("6"));
        assert!(err.to_string().contains("ancestor rows"));

        let err = FilterError::AncestorOutOfRange {
            particle: 1,
            time_step: 2,
            index: 9,
            particle_count: 5,
        };
        assert!(err.to_string().contains("[0, 5)"));
    }

    #[test]
    fn test_resample_error_mapping() {
        assert_eq!(
            FilterError::from_resample(4, ResampleError::AllWeightsZero),
            FilterError::DegenerateWeights { time_step: 4 }
        );
        assert!(matches!(
            FilterError::from_resample(
                2,
                ResampleError::InvalidWeight {
                    index: 1,
                    value: f64::INFINITY
                }
            ),
            FilterError::NonFiniteWeight {
                time_step: 2,
                index: 1,
                ..
            }
        ));
        let err = FilterError::from_resample(1, ResampleError::EmptyWeights);
        assert_eq!(err.time_step(), Some(1));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_config_error_conversion() {
        let cfg = ConfigError::InvalidValue {
            field: "particle_count".to_string(),
            reason: "must be at least 2".to_string(),
        };
        let err: FilterError = cfg.into();
        assert!(matches!(err, FilterError::Configuration { .. }));
        assert!(err.to_string().contains("particle_count"));
    }
}
