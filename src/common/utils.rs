//! Log-space numerical helpers shared by the filters and the SAEM driver.
//!
//! Particle weights are carried as unnormalized log-weights everywhere in
//! the crate. These helpers do the max-shifted exponentiation needed to
//! turn them into probabilities without overflow.

use std::f64::consts::PI;

/// `ln(sqrt(2π))`
const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

/// Log of the sum of exponentials.
///
/// Returns `-inf` for an empty slice or when every entry is `-inf`.
pub fn log_sum_exp(log_weights: &[f64]) -> f64 {
    let max_log_w = max_log_weight(log_weights);
    if max_log_w == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum_exp: f64 = log_weights.iter().map(|w| (w - max_log_w).exp()).sum();
    max_log_w + sum_exp.ln()
}

/// Normalize log-weights into probabilities summing to one.
///
/// If every weight is `-inf` the result is uniform; callers that must treat
/// that case as an error check [`max_log_weight`] first.
pub fn normalized_weights(log_weights: &[f64]) -> Vec<f64> {
    let n = log_weights.len();
    let log_total = log_sum_exp(log_weights);
    if log_total == f64::NEG_INFINITY {
        return vec![1.0 / n as f64; n];
    }
    log_weights.iter().map(|w| (w - log_total).exp()).collect()
}

/// Effective sample size `1 / Σ wᵢ²` of a set of log-weights.
pub fn effective_sample_size(log_weights: &[f64]) -> f64 {
    if log_weights.is_empty() || max_log_weight(log_weights) == f64::NEG_INFINITY {
        return 0.0;
    }
    let sum_sq: f64 = normalized_weights(log_weights).iter().map(|w| w * w).sum();
    1.0 / sum_sq
}

/// Largest entry, ignoring NaN. `-inf` for an empty slice.
pub fn max_log_weight(log_weights: &[f64]) -> f64 {
    log_weights
        .iter()
        .cloned()
        .filter(|w| !w.is_nan())
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Index of the largest entry (lowest index wins ties). `None` when empty.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i).or(if values.is_empty() { None } else { Some(0) })
}

/// Log-density of `N(mean, std²)` at `x`.
///
/// A zero standard deviation is a point mass: `+inf` at the mean and `-inf`
/// everywhere else. Negative or NaN `std` gives NaN.
#[inline]
pub fn gaussian_log_pdf(x: f64, mean: f64, std: f64) -> f64 {
    if std.is_nan() || std < 0.0 {
        return f64::NAN;
    }
    if std == 0.0 {
        return if x == mean {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
    }
    let z = (x - mean) / std;
    -0.5 * z * z - std.ln() - LN_SQRT_2PI
}

/// Density of `N(mean, std²)` at `x`.
#[inline]
pub fn gaussian_pdf(x: f64, mean: f64, std: f64) -> f64 {
    if std <= 0.0 {
        return if std == 0.0 && x == mean { f64::INFINITY } else { 0.0 };
    }
    let z = (x - mean) / std;
    (-0.5 * z * z).exp() / (std * (2.0 * PI).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_log_sum_exp_matches_direct_sum() {
        let w = [0.1_f64.ln(), 0.2_f64.ln(), 0.7_f64.ln()];
        assert_relative_eq!(log_sum_exp(&w), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_log_sum_exp_is_shift_stable() {
        let w = [-1000.0, -1000.0];
        assert_relative_eq!(log_sum_exp(&w), -1000.0 + 2.0_f64.ln(), epsilon = 1e-9);
        assert_eq!(log_sum_exp(&[]), f64::NEG_INFINITY);
        assert_eq!(
            log_sum_exp(&[f64::NEG_INFINITY, f64::NEG_INFINITY]),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn test_normalized_weights() {
        let p = normalized_weights(&[0.0, 0.0, f64::NEG_INFINITY, 2.0_f64.ln()]);
        assert_relative_eq!(p[0], 0.25, epsilon = 1e-12);
        assert_relative_eq!(p[2], 0.0);
        assert_relative_eq!(p[3], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_effective_sample_size() {
        assert_relative_eq!(effective_sample_size(&[0.0; 8]), 8.0, epsilon = 1e-9);
        let ess = effective_sample_size(&[0.0, f64::NEG_INFINITY, f64::NEG_INFINITY]);
        assert_relative_eq!(ess, 1.0, epsilon = 1e-12);
        assert_eq!(effective_sample_size(&[f64::NEG_INFINITY]), 0.0);
    }

    #[test]
    fn test_argmax_ties_and_nan() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), Some(1));
        assert_eq!(argmax(&[f64::NAN, -1.0]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_gaussian_log_pdf() {
        assert_relative_eq!(
            gaussian_log_pdf(1.0, 1.0, 1.0),
            -LN_SQRT_2PI,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            gaussian_log_pdf(0.3, -0.2, 0.7),
            gaussian_pdf(0.3, -0.2, 0.7).ln(),
            epsilon = 1e-12
        );
        // Far tails stay finite in log space
        assert!(gaussian_log_pdf(1.0, 0.0, 5e-6).is_finite());
        assert_eq!(gaussian_log_pdf(1.0, 0.0, 0.0), f64::NEG_INFINITY);
        assert_eq!(gaussian_log_pdf(0.0, 0.0, 0.0), f64::INFINITY);
    }
}
