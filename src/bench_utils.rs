//! Benchmark utilities shared between Criterion benchmarks and tests.
//!
//! This module provides:
//! - Scenario presets of increasing size
//! - Synthetic series and model construction for a preset
//! - Estimator factory

use crate::common::ground_truth::{generate_reservoir_observations, SyntheticSeries};
use crate::model::{ConfigResult, Distribution, ParameterSetting, ReservoirModel};
use crate::saem::{SaemConfig, SaemEstimator, SaemResult, StepSize};

// =============================================================================
// Scenario Presets
// =============================================================================

/// True decay used to synthesize benchmark observations
pub const TRUE_DECAY: f64 = 0.7;

/// True observation noise used to synthesize benchmark observations
pub const TRUE_OBS_STD: f64 = 0.1;

/// Input uncertainty around the observed influx
pub const INPUT_STD: f64 = 0.1;

/// Storage at step 0
pub const INITIAL_STATE: f64 = 10.0;

/// Sizes of one benchmark run
#[derive(Debug, Clone, Copy)]
pub struct BenchScenario {
    /// Display name
    pub name: &'static str,
    /// Time steps T (= K)
    pub time_steps: usize,
    /// Particles N
    pub particle_count: usize,
    /// Draws D
    pub num_draws: usize,
    /// Outer iterations L
    pub chain_length: usize,
}

/// Presets, smallest first
pub const SCENARIOS: &[BenchScenario] = &[
    BenchScenario {
        name: "t5_n100",
        time_steps: 5,
        particle_count: 100,
        num_draws: 10,
        chain_length: 5,
    },
    BenchScenario {
        name: "t20_n200",
        time_steps: 20,
        particle_count: 200,
        num_draws: 10,
        chain_length: 5,
    },
    BenchScenario {
        name: "t50_n500",
        time_steps: 50,
        particle_count: 500,
        num_draws: 10,
        chain_length: 3,
    },
];

// =============================================================================
// Prepared Scenario
// =============================================================================

/// Model, configuration and the series behind them
#[derive(Debug, Clone)]
pub struct PreparedScenario {
    /// Synthetic ground truth
    pub series: SyntheticSeries,
    /// Model with `decay` estimated and `obs_std` fixed at its true value
    pub model: ReservoirModel,
    /// Estimator configuration for the preset sizes
    pub config: SaemConfig,
}

/// Synthesize observations for `scenario` and build the matching model.
pub fn prepare_scenario(scenario: &BenchScenario, seed: u64) -> ConfigResult<PreparedScenario> {
    let influx = vec![1.0; scenario.time_steps];
    let series = generate_reservoir_observations(
        TRUE_DECAY,
        INPUT_STD,
        TRUE_OBS_STD,
        INITIAL_STATE,
        &influx,
        seed,
    )?;

    let model = ReservoirModel::new(
        series.influx.clone(),
        series.outflux.clone(),
        ParameterSetting::estimated(
            Distribution::Uniform { low: 0.5, high: 0.9 },
            Distribution::random_walk(0.01),
        ),
        ParameterSetting::fixed(TRUE_OBS_STD),
        INPUT_STD,
    )?
    .with_initial_state(INITIAL_STATE)?;

    let config = SaemConfig::new(
        scenario.particle_count,
        scenario.num_draws,
        scenario.chain_length,
    )
    .with_step_size(StepSize::Constant(0.75))
    .with_seed(seed);

    Ok(PreparedScenario {
        series,
        model,
        config,
    })
}

/// Estimator for a prepared scenario.
pub fn create_estimator(prepared: &PreparedScenario) -> SaemResult<SaemEstimator<ReservoirModel>> {
    SaemEstimator::new(prepared.model.clone(), prepared.config.clone())
}
