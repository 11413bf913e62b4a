//! Synthetic observation generation
//!
//! Simulates the linear reservoir forward from a known parameter value so
//! tests and benchmarks have observations with a known answer.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::model::{ConfigError, ConfigResult};

/// Simulated reservoir series
#[derive(Debug, Clone)]
pub struct SyntheticSeries {
    /// True storage, `x_0 ..= x_T` (length T+1)
    pub states: Vec<f64>,
    /// True inputs, `r_0 .. r_{T-1}` (length T)
    pub inputs: Vec<f64>,
    /// Observed input flux (length T)
    pub influx: Vec<f64>,
    /// Noisy observations of `x_{k+1}` (length T)
    pub outflux: Vec<f64>,
}

/// Simulate the reservoir `x_{k+1} = decay · x_k + r_k`, `r_k ~ N(influx_k, input_std²)`,
/// observed as `y_k ~ N(x_{k+1}, obs_std²)`.
///
/// Zero standard deviations give exact (noise-free) values.
///
/// # Arguments
/// * `decay` - Storage decay per step
/// * `input_std` - Standard deviation of the input around the observed influx
/// * `obs_std` - Observation noise standard deviation
/// * `initial_state` - Storage at step 0
/// * `influx` - Observed input flux, one value per time step
/// * `seed` - RNG seed
pub fn generate_reservoir_observations(
    decay: f64,
    input_std: f64,
    obs_std: f64,
    initial_state: f64,
    influx: &[f64],
    seed: u64,
) -> ConfigResult<SyntheticSeries> {
    let input_noise = noise("input_std", input_std)?;
    let obs_noise = noise("obs_std", obs_std)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let t = influx.len();
    let mut states = Vec::with_capacity(t + 1);
    let mut inputs = Vec::with_capacity(t);
    let mut outflux = Vec::with_capacity(t);
    states.push(initial_state);

    let mut x = initial_state;
    for &u in influx {
        let r = u + input_noise.map_or(0.0, |d| d.sample(&mut rng));
        x = decay * x + r;
        inputs.push(r);
        states.push(x);
        outflux.push(x + obs_noise.map_or(0.0, |d| d.sample(&mut rng)));
    }

    Ok(SyntheticSeries {
        states,
        inputs,
        influx: influx.to_vec(),
        outflux,
    })
}

fn noise(field: &str, std: f64) -> ConfigResult<Option<Normal<f64>>> {
    if !std.is_finite() || std < 0.0 {
        return Err(ConfigError::invalid(field, "must be finite and >= 0"));
    }
    if std == 0.0 {
        return Ok(None);
    }
    Normal::new(0.0, std)
        .map(Some)
        .map_err(|e| ConfigError::invalid(field, e.to_string()))
}
