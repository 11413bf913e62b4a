//! Trajectory extraction
//!
//! Draws one full path from a completed [`ParticleState`]: a terminal
//! particle proportional to the final log-weights, then ancestor links
//! followed back to step 0. The extracted path is the reference consumed
//! by the next conditional pass.

use rand::Rng;

use super::errors::{FilterError, FilterResult};
use super::state::ParticleState;
use crate::common::resample::{resample, ResamplingScheme};

/// A pinned reference path
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTrajectory {
    /// Particle index at each step `0..=K` (empty when built from values)
    pub path: Vec<usize>,
    /// State at each step `0..=K`
    pub states: Vec<f64>,
    /// Input at each transition step `0..K`
    pub inputs: Vec<f64>,
}

impl ReferenceTrajectory {
    /// Reference from explicit values.
    ///
    /// # Errors
    /// [`FilterError::DimensionMismatch`] unless `states.len() == inputs.len() + 1`.
    pub fn from_values(states: Vec<f64>, inputs: Vec<f64>) -> FilterResult<Self> {
        if states.len() != inputs.len() + 1 {
            return Err(FilterError::DimensionMismatch {
                expected: inputs.len() + 1,
                actual: states.len(),
                context: "reference states".to_string(),
            });
        }
        Ok(Self {
            path: Vec::new(),
            states,
            inputs,
        })
    }

    /// Number of transition steps K.
    pub fn transition_steps(&self) -> usize {
        self.inputs.len()
    }
}

/// Sample the particle index path, `0..=K`.
pub fn sample_path<R: Rng + ?Sized>(
    rng: &mut R,
    state: &ParticleState,
    scheme: ResamplingScheme,
) -> FilterResult<Vec<usize>> {
    let k = state.transition_steps();
    let terminal = resample(rng, state.log_weights().as_slice(), 1, scheme)
        .map_err(|e| FilterError::from_resample(k, e))?;
    state.trace_ancestry(terminal[0])
}

/// States along `path`, length K+1.
pub fn state_trajectory(state: &ParticleState, path: &[usize]) -> Vec<f64> {
    path.iter()
        .enumerate()
        .map(|(k, &j)| state.states()[(j, k)])
        .collect()
}

/// Inputs along `path`, length K. Entry `k` produced the state at step k+1.
pub fn input_trajectory(state: &ParticleState, path: &[usize]) -> Vec<f64> {
    path.iter()
        .skip(1)
        .enumerate()
        .map(|(k, &j)| state.inputs()[(j, k)])
        .collect()
}

/// Sample a path and gather its states and inputs.
pub fn extract_reference<R: Rng + ?Sized>(
    rng: &mut R,
    state: &ParticleState,
    scheme: ResamplingScheme,
) -> FilterResult<ReferenceTrajectory> {
    let path = sample_path(rng, state, scheme)?;
    Ok(ReferenceTrajectory {
        states: state_trajectory(state, &path),
        inputs: input_trajectory(state, &path),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::rng::SimpleRng;
    use nalgebra::{DMatrix, DVector};

    fn state() -> ParticleState {
        // 3 particles, K = T = 2; particle 2 carries all the weight.
        let states = DMatrix::from_row_slice(3, 3, &[1.0, 2.0, 3.0, 1.0, 2.5, 3.5, 1.0, 2.2, 3.2]);
        let ancestors = DMatrix::from_row_slice(3, 3, &[0, 2, 1, 1, 0, 1, 2, 0, 0]);
        let weights = DVector::from_vec(vec![f64::NEG_INFINITY, f64::NEG_INFINITY, -0.5]);
        let inputs = DMatrix::from_row_slice(3, 2, &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        ParticleState::new(states, ancestors, weights, inputs).unwrap()
    }

    #[test]
    fn test_extract_follows_ancestors() {
        let state = state();
        let reference =
            extract_reference(&mut SimpleRng::new(5), &state, ResamplingScheme::Multinomial).unwrap();
        // 2 at step 2 <- 0 at step 1 <- 2 at step 0
        assert_eq!(reference.path, vec![2, 0, 2]);
        assert_eq!(reference.states, vec![1.0, 2.0, 3.2]);
        assert_eq!(reference.inputs, vec![0.1, 0.6]);
        assert_eq!(reference.transition_steps(), 2);
    }

    #[test]
    fn test_extract_is_idempotent_for_same_seed() {
        let state = ParticleState::new(
            DMatrix::from_fn(4, 3, |j, k| (j * 10 + k) as f64),
            DMatrix::from_row_slice(4, 3, &[0, 1, 2, 1, 3, 0, 2, 0, 3, 3, 2, 1]),
            DVector::from_vec(vec![-1.0, -0.5, -2.0, -0.7]),
            DMatrix::from_fn(4, 2, |j, k| (j + k) as f64 * 0.1),
        )
        .unwrap();
        for seed in 0..20 {
            let a = extract_reference(&mut SimpleRng::new(seed), &state, ResamplingScheme::Multinomial)
                .unwrap();
            let b = extract_reference(&mut SimpleRng::new(seed), &state, ResamplingScheme::Multinomial)
                .unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_reference_from_values_checks_lengths() {
        assert!(ReferenceTrajectory::from_values(vec![1.0, 2.0], vec![0.5]).is_ok());
        assert!(matches!(
            ReferenceTrajectory::from_values(vec![1.0, 2.0], vec![0.5, 0.5]),
            Err(FilterError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_degenerate_terminal_weights() {
        let state = ParticleState::new(
            DMatrix::zeros(2, 2),
            DMatrix::from_fn(2, 2, |j, _| j),
            DVector::from_element(2, f64::NEG_INFINITY),
            DMatrix::zeros(2, 1),
        )
        .unwrap();
        assert_eq!(
            sample_path(&mut SimpleRng::new(1), &state, ResamplingScheme::Systematic),
            Err(FilterError::DegenerateWeights { time_step: 1 })
        );
    }
}
