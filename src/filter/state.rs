//! Particle state snapshot
//!
//! The unit of persistence between filter passes. Layout (N particles,
//! T observed steps, K ≤ T transition steps):
//!
//! | field         | shape      | meaning                                         |
//! |---------------|------------|-------------------------------------------------|
//! | `states`      | [N, T+1]   | state per particle per step                      |
//! | `ancestors`   | [N, K+1]   | `(j, k)`: index at step k−1 of j's parent        |
//! | `log_weights` | [N]        | path-cumulative log-weight after step K          |
//! | `inputs`      | [N, K]     | input draw that produced `states[(j, k+1)]`      |
//!
//! Column 0 of `ancestors` is the identity.

use nalgebra::{DMatrix, DVector};

use super::errors::{FilterError, FilterResult};
use crate::common::utils;

/// Snapshot of one particle system
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleState {
    states: DMatrix<f64>,
    ancestors: DMatrix<usize>,
    log_weights: DVector<f64>,
    inputs: DMatrix<f64>,
}

impl ParticleState {
    /// Assemble a state, checking shapes, ancestor indices and weights.
    ///
    /// # Errors
    /// - [`FilterError::Configuration`] for zero particles or a non-identity
    ///   ancestor column 0
    /// - [`FilterError::DimensionMismatch`] for inconsistent shapes
    /// - [`FilterError::AncestorOutOfRange`] for an index outside `[0, N)`
    /// - [`FilterError::NonFiniteWeight`] for NaN or `+inf` log-weights
    pub fn new(
        states: DMatrix<f64>,
        ancestors: DMatrix<usize>,
        log_weights: DVector<f64>,
        inputs: DMatrix<f64>,
    ) -> FilterResult<Self> {
        let state = Self {
            states,
            ancestors,
            log_weights,
            inputs,
        };
        state.validate()?;
        Ok(state)
    }

    /// State before any transition: every particle at `x0`, identity
    /// ancestors, log-weights `ln(1/N)`.
    pub fn initial(
        particle_count: usize,
        time_steps: usize,
        transition_steps: usize,
        x0: f64,
    ) -> FilterResult<Self> {
        let n = particle_count;
        let mut states = DMatrix::zeros(n, time_steps + 1);
        states.column_mut(0).fill(x0);
        Self::new(
            states,
            DMatrix::from_fn(n, transition_steps + 1, |j, c| if c == 0 { j } else { 0 }),
            DVector::from_element(n, -(n as f64).ln()),
            DMatrix::zeros(n, transition_steps),
        )
    }

    /// Split into `(states, ancestors, log_weights, inputs)`.
    pub(crate) fn into_parts(self) -> (DMatrix<f64>, DMatrix<usize>, DVector<f64>, DMatrix<f64>) {
        (self.states, self.ancestors, self.log_weights, self.inputs)
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> FilterResult<()> {
        let n = self.states.nrows();
        if n == 0 {
            return Err(FilterError::Configuration {
                description: "particle state has no particles".to_string(),
            });
        }

        let rows = [
            ("ancestor rows", self.ancestors.nrows()),
            ("log-weight length", self.log_weights.len()),
            ("input rows", self.inputs.nrows()),
        ];
        for (context, actual) in rows {
            if actual != n {
                return Err(FilterError::DimensionMismatch {
                    expected: n,
                    actual,
                    context: context.to_string(),
                });
            }
        }

        let k = self.inputs.ncols();
        if self.ancestors.ncols() != k + 1 {
            return Err(FilterError::DimensionMismatch {
                expected: k + 1,
                actual: self.ancestors.ncols(),
                context: "ancestor columns".to_string(),
            });
        }
        // T ≥ K, so states need at least K+1 columns.
        if self.states.ncols() < k + 1 {
            return Err(FilterError::DimensionMismatch {
                expected: k + 1,
                actual: self.states.ncols(),
                context: "state columns".to_string(),
            });
        }

        for j in 0..n {
            if self.ancestors[(j, 0)] != j {
                return Err(FilterError::Configuration {
                    description: format!(
                        "ancestor column 0 must be the identity, particle {} points to {}",
                        j,
                        self.ancestors[(j, 0)]
                    ),
                });
            }
        }
        for step in 1..=k {
            for j in 0..n {
                let index = self.ancestors[(j, step)];
                if index >= n {
                    return Err(FilterError::AncestorOutOfRange {
                        particle: j,
                        time_step: step,
                        index,
                        particle_count: n,
                    });
                }
            }
        }

        if let Some((index, &value)) = self
            .log_weights
            .iter()
            .enumerate()
            .find(|(_, w)| w.is_nan() || **w == f64::INFINITY)
        {
            return Err(FilterError::NonFiniteWeight {
                time_step: k,
                index,
                value,
            });
        }
        Ok(())
    }

    /// States, [N, T+1].
    pub fn states(&self) -> &DMatrix<f64> {
        &self.states
    }

    /// Ancestor indices, [N, K+1].
    pub fn ancestors(&self) -> &DMatrix<usize> {
        &self.ancestors
    }

    /// Log-weights after the last transition step, [N].
    pub fn log_weights(&self) -> &DVector<f64> {
        &self.log_weights
    }

    /// Input draws, [N, K].
    pub fn inputs(&self) -> &DMatrix<f64> {
        &self.inputs
    }

    /// Number of particles N.
    pub fn particle_count(&self) -> usize {
        self.states.nrows()
    }

    /// Number of transition steps K.
    pub fn transition_steps(&self) -> usize {
        self.inputs.ncols()
    }

    /// Number of observed time steps T.
    pub fn time_steps(&self) -> usize {
        self.states.ncols() - 1
    }

    /// Follow ancestor links back from `particle` at step K.
    ///
    /// Returns the particle index at every step `0..=K`.
    pub fn trace_ancestry(&self, particle: usize) -> FilterResult<Vec<usize>> {
        let n = self.particle_count();
        let k = self.transition_steps();
        if particle >= n {
            return Err(FilterError::AncestorOutOfRange {
                particle,
                time_step: k,
                index: particle,
                particle_count: n,
            });
        }

        let mut path = vec![0; k + 1];
        path[k] = particle;
        for step in (1..=k).rev() {
            let index = self.ancestors[(path[step], step)];
            if index >= n {
                return Err(FilterError::AncestorOutOfRange {
                    particle: path[step],
                    time_step: step,
                    index,
                    particle_count: n,
                });
            }
            path[step - 1] = index;
        }
        Ok(path)
    }

    /// Largest log-weight (the per-draw statistic fed to `Qh`).
    pub fn max_log_weight(&self) -> f64 {
        utils::max_log_weight(self.log_weights.as_slice())
    }

    /// Effective sample size of the normalized weights.
    pub fn effective_sample_size(&self) -> f64 {
        utils::effective_sample_size(self.log_weights.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small_state() -> ParticleState {
        // 3 particles, T = K = 2
        let states = DMatrix::from_row_slice(3, 3, &[1.0, 2.0, 3.0, 1.0, 2.5, 3.5, 1.0, 2.2, 3.2]);
        let ancestors = DMatrix::from_row_slice(3, 3, &[0, 2, 1, 1, 0, 1, 2, 0, 2]);
        let weights = DVector::from_vec(vec![-1.0, -2.0, f64::NEG_INFINITY]);
        let inputs = DMatrix::zeros(3, 2);
        ParticleState::new(states, ancestors, weights, inputs).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let state = ParticleState::initial(4, 6, 5, 10.0).unwrap();
        assert_eq!(state.particle_count(), 4);
        assert_eq!(state.time_steps(), 6);
        assert_eq!(state.transition_steps(), 5);
        assert!(state.states().column(0).iter().all(|&x| x == 10.0));
        assert_relative_eq!(state.log_weights()[2], (0.25f64).ln());
        assert_relative_eq!(state.effective_sample_size(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_trace_ancestry() {
        let state = small_state();
        assert_eq!(state.trace_ancestry(0).unwrap(), vec![0, 1, 0]);
        assert_eq!(state.trace_ancestry(1).unwrap(), vec![0, 1, 1]);
        assert_eq!(state.trace_ancestry(2).unwrap(), vec![0, 2, 2]);
        assert!(matches!(
            state.trace_ancestry(3),
            Err(FilterError::AncestorOutOfRange { index: 3, .. })
        ));
        assert_relative_eq!(state.max_log_weight(), -1.0);
    }

    #[test]
    fn test_shape_validation() {
        let err = ParticleState::new(
            DMatrix::zeros(3, 4),
            DMatrix::from_fn(2, 4, |j, _| j),
            DVector::zeros(3),
            DMatrix::zeros(3, 3),
        )
        .unwrap_err();
        assert!(matches!(err, FilterError::DimensionMismatch { expected: 3, actual: 2, .. }));

        let err = ParticleState::new(
            DMatrix::zeros(2, 3),
            DMatrix::from_fn(2, 4, |j, _| j),
            DVector::zeros(2),
            DMatrix::zeros(2, 3),
        )
        .unwrap_err();
        assert!(matches!(err, FilterError::DimensionMismatch { expected: 4, actual: 3, .. }));
    }

    #[test]
    fn test_ancestor_validation() {
        let mut ancestors = DMatrix::from_fn(2, 3, |j, _| j);
        ancestors[(1, 2)] = 2;
        let err = ParticleState::new(
            DMatrix::zeros(2, 3),
            ancestors,
            DVector::zeros(2),
            DMatrix::zeros(2, 2),
        )
        .unwrap_err();
        assert_eq!(
            err,
            FilterError::AncestorOutOfRange {
                particle: 1,
                time_step: 2,
                index: 2,
                particle_count: 2
            }
        );

        let mut ancestors = DMatrix::from_fn(2, 3, |j, _| j);
        ancestors[(0, 0)] = 1;
        assert!(matches!(
            ParticleState::new(DMatrix::zeros(2, 3), ancestors, DVector::zeros(2), DMatrix::zeros(2, 2)),
            Err(FilterError::Configuration { .. })
        ));
    }

    #[test]
    fn test_weight_validation() {
        let err = ParticleState::new(
            DMatrix::zeros(2, 2),
            DMatrix::from_fn(2, 2, |j, _| j),
            DVector::from_vec(vec![0.0, f64::NAN]),
            DMatrix::zeros(2, 1),
        )
        .unwrap_err();
        assert!(matches!(err, FilterError::NonFiniteWeight { index: 1, .. }));
    }
}
