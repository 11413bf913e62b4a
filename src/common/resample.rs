//! Resampling primitive
//!
//! Converts a weighted empirical distribution (unnormalized log-weights)
//! into `count` indices drawn proportional to weight. Every particle-system
//! component goes through [`resample`]; it is valid for any `count >= 1`
//! (the filters ask for 1, N and N−1 draws).

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::utils::{max_log_weight, normalized_weights};
use crate::filter::errors::ResampleError;

/// Resampling scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResamplingScheme {
    /// Independent inverse-CDF draws (multinomial resampling)
    #[default]
    Multinomial,
    /// One uniform offset on a regular grid (lower variance)
    Systematic,
}

/// Draw `count` indices proportional to `exp(log_weights)`.
///
/// # Errors
/// - [`ResampleError::EmptyWeights`] if `log_weights` is empty
/// - [`ResampleError::ZeroCount`] if `count == 0`
/// - [`ResampleError::InvalidWeight`] for NaN or `+inf` entries
/// - [`ResampleError::AllWeightsZero`] if every entry is `-inf`
pub fn resample<R: Rng + ?Sized>(
    rng: &mut R,
    log_weights: &[f64],
    count: usize,
    scheme: ResamplingScheme,
) -> Result<Vec<usize>, ResampleError> {
    validate_log_weights(log_weights)?;
    if count == 0 {
        return Err(ResampleError::ZeroCount);
    }

    let cdf = cumulative_weights(log_weights);
    let positions = match scheme {
        ResamplingScheme::Multinomial => sorted_uniforms(rng, count),
        ResamplingScheme::Systematic => {
            let step = 1.0 / count as f64;
            let offset = rng.gen::<f64>() * step;
            (0..count).map(|i| offset + step * i as f64).collect()
        }
    };

    Ok(invert_cdf(&cdf, log_weights, &positions))
}

fn validate_log_weights(log_weights: &[f64]) -> Result<(), ResampleError> {
    if log_weights.is_empty() {
        return Err(ResampleError::EmptyWeights);
    }
    if let Some((index, &value)) = log_weights
        .iter()
        .enumerate()
        .find(|(_, w)| w.is_nan() || **w == f64::INFINITY)
    {
        return Err(ResampleError::InvalidWeight { index, value });
    }
    if max_log_weight(log_weights) == f64::NEG_INFINITY {
        return Err(ResampleError::AllWeightsZero);
    }
    Ok(())
}

fn cumulative_weights(log_weights: &[f64]) -> Vec<f64> {
    let mut cdf = normalized_weights(log_weights);
    let mut running = 0.0;
    for p in cdf.iter_mut() {
        running += *p;
        *p = running;
    }
    cdf
}

/// Sorted U(0,1) draws via normalized exponential spacings (O(count)).
fn sorted_uniforms<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<f64> {
    let mut spacings: Vec<f64> = (0..=count)
        .map(|_| -(1.0 - rng.gen::<f64>()).ln())
        .collect();
    let total: f64 = spacings.iter().sum();
    let mut running = 0.0;
    for s in spacings.iter_mut() {
        running += *s;
        *s = running / total;
    }
    spacings.truncate(count);
    spacings
}

/// Walk sorted positions through the CDF.
///
/// The last index with non-zero weight absorbs round-off at the top of the
/// CDF, so a zero-weight particle is never returned.
fn invert_cdf(cdf: &[f64], log_weights: &[f64], positions: &[f64]) -> Vec<usize> {
    let last_valid = log_weights
        .iter()
        .rposition(|w| *w > f64::NEG_INFINITY)
        .unwrap_or(cdf.len() - 1);

    let mut indices = Vec::with_capacity(positions.len());
    let mut j = 0usize;
    for &u in positions {
        while j < last_valid && (cdf[j] <= u || log_weights[j] == f64::NEG_INFINITY) {
            j += 1;
        }
        indices.push(j);
    }
    indices
}
