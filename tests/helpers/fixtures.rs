//! Synthetic reservoir fixtures
//!
//! Every fixture is generated from a fixed seed so the integration tests
//! are deterministic.

use particle_saem::common::ground_truth::{generate_reservoir_observations, SyntheticSeries};
use particle_saem::{Distribution, ParameterSetting, ReservoirModel};

/// Storage at step 0
pub const INITIAL_STATE: f64 = 10.0;
/// Decay used to synthesize the observations
pub const TRUE_DECAY: f64 = 0.7;
/// Constant observed influx
pub const INFLUX: f64 = 1.0;
/// Input uncertainty around the influx
pub const INPUT_STD: f64 = 0.1;
/// Observation noise used to synthesize the observations
pub const OBS_STD: f64 = 0.1;

/// Synthetic series of `steps` time steps
pub fn reservoir_series(steps: usize, seed: u64) -> SyntheticSeries {
    generate_reservoir_observations(
        TRUE_DECAY,
        INPUT_STD,
        OBS_STD,
        INITIAL_STATE,
        &vec![INFLUX; steps],
        seed,
    )
    .expect("valid synthetic parameters")
}

/// Decay prior used by the recovery tests
pub fn decay_prior() -> Distribution {
    Distribution::Uniform { low: 0.5, high: 0.9 }
}

/// Model over `series` with `decay` estimated and `obs_std` fixed.
pub fn decay_model(series: &SyntheticSeries, obs_std: f64) -> ReservoirModel {
    ReservoirModel::new(
        series.influx.clone(),
        series.outflux.clone(),
        ParameterSetting::estimated(decay_prior(), Distribution::random_walk(0.01)),
        ParameterSetting::fixed(obs_std),
        INPUT_STD,
    )
    .and_then(|m| m.with_initial_state(INITIAL_STATE))
    .expect("valid reservoir model")
}

/// Model with both `decay` and `obs_std` estimated.
pub fn joint_model(series: &SyntheticSeries) -> ReservoirModel {
    ReservoirModel::new(
        series.influx.clone(),
        series.outflux.clone(),
        ParameterSetting::estimated(decay_prior(), Distribution::random_walk(0.01)),
        ParameterSetting::estimated(
            Distribution::Uniform { low: 0.05, high: 0.3 },
            Distribution::random_walk(0.01),
        ),
        INPUT_STD,
    )
    .and_then(|m| m.with_initial_state(INITIAL_STATE))
    .expect("valid reservoir model")
}
