//! Stochastic-approximation EM over particle Gibbs
//!
//! - [`SaemEstimator`] - Outer loop: initialization, coordinate sweeps, selection
//! - [`SaemConfig`] - Particle count, draws, chain length and step sizes
//! - [`StepSize`] - γ schedule for the `Qh` recursion
//! - [`CoordinateSweep`] - Coordinate-wise proposal bookkeeping
//! - [`ParameterRecord`] / [`InputRecord`] - Write-once chain records
//! - [`SaemOutput`] - Records plus final `Qh`

pub mod config;
pub mod coordinate;
pub mod driver;
pub mod errors;
pub mod records;
pub mod step_size;

pub use config::{SaemConfig, DEFAULT_SEED};
pub use coordinate::CoordinateSweep;
pub use driver::{stochastic_approximation_update, SaemEstimator};
pub use errors::{SaemError, SaemResult};
pub use records::{InputRecord, ParameterRecord, SaemOutput, SaemSummary};
pub use step_size::StepSize;
