//! SAEM driver errors
//!
//! Filter failures are wrapped with the iteration, coordinate and draw they
//! happened in. Together with the inner time step and the run's seed this
//! is enough to reproduce the failure.

use std::fmt;

use crate::filter::FilterError;
use crate::model::ConfigError;

/// Result alias for the SAEM driver.
pub type SaemResult<T> = Result<T, SaemError>;

/// Errors raised by [`crate::saem::SaemEstimator`]
#[derive(Debug, Clone, PartialEq)]
pub enum SaemError {
    /// Invalid model or estimator configuration (raised before any filtering)
    Config(ConfigError),

    /// A filter pass or reference extraction failed
    Filter {
        /// Outer iteration `ll` (`None` during initialization)
        iteration: Option<usize>,
        /// Parameter coordinate being updated (`None` during initialization)
        coordinate: Option<usize>,
        /// Parameter draw whose particle system failed
        draw: usize,
        /// Underlying failure (carries the time step)
        source: FilterError,
    },
}

impl SaemError {
    pub(crate) fn filter(
        iteration: Option<usize>,
        coordinate: Option<usize>,
        draw: usize,
        source: FilterError,
    ) -> Self {
        SaemError::Filter {
            iteration,
            coordinate,
            draw,
            source,
        }
    }

    /// Time step of the underlying filter failure, if any.
    pub fn time_step(&self) -> Option<usize> {
        match self {
            SaemError::Filter { source, .. } => source.time_step(),
            SaemError::Config(_) => None,
        }
    }

    /// True for [`FilterError::DegenerateWeights`] failures.
    pub fn is_degenerate(&self) -> bool {
        matches!(
            self,
            SaemError::Filter {
                source: FilterError::DegenerateWeights { .. },
                ..
            }
        )
    }
}

impl fmt::Display for SaemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaemError::Config(e) => write!(f, "Invalid configuration: {}", e),
            SaemError::Filter {
                iteration,
                coordinate,
                draw,
                source,
            } => match (iteration, coordinate) {
                (Some(ll), Some(p)) => write!(
                    f,
                    "Draw {} failed at iteration {}, coordinate {}: {}",
                    draw, ll, p, source
                ),
                (Some(ll), None) => {
                    write!(f, "Draw {} failed at iteration {}: {}", draw, ll, source)
                }
                _ => write!(f, "Draw {} failed during initialization: {}", draw, source),
            },
        }
    }
}

impl std::error::Error for SaemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaemError::Config(e) => Some(e),
            SaemError::Filter { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for SaemError {
    fn from(e: ConfigError) -> Self {
        SaemError::Config(e)
    }
}
