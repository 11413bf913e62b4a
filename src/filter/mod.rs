//! Particle filters
//!
//! This module provides the particle-system layer of the estimator:
//!
//! - [`ParticleState`] - Snapshot of one particle system (states, ancestors, weights, inputs)
//! - [`ParticleFilter`] - Bootstrap SMC and conditional SMC with ancestor sampling
//! - [`trajectory`] - Backward extraction of one path from a completed state
//!
//! # Filter Passes
//!
//! - [`ParticleFilter::run_smc`] - Unconditioned bootstrap pass (initialization)
//! - [`ParticleFilter::run_cpf_as`] - Conditional pass pinned to a reference path
//!
//! Every pass builds a fresh [`ParticleState`]; a state handed in is never
//! mutated.

pub mod cpf_as;
pub mod errors;
pub mod smc;
pub mod state;
pub mod trajectory;

use nalgebra::{DMatrix, DVector};

pub use errors::{FilterError, FilterResult, ResampleError};
pub use state::ParticleState;
pub use trajectory::ReferenceTrajectory;

use crate::common::resample::ResamplingScheme;
use crate::model::ModelLink;

/// Default standard deviation of the ancestor-sampling proximity kernel.
pub const DEFAULT_ANCESTOR_BANDWIDTH: f64 = 5e-6;

/// Particle filter bound to a model.
///
/// Holds the model capability interface and the particle-system settings.
/// The filter itself is stateless between passes, so one instance can be
/// shared across parameter draws (and threads).
#[derive(Debug, Clone)]
pub struct ParticleFilter<'a, M: ModelLink> {
    /// Model link supplying transition, likelihood and inputs
    model: &'a M,
    /// Number of particles N
    particle_count: usize,
    /// Standard deviation of the ancestor-sampling kernel
    ancestor_bandwidth: f64,
    /// Resampling scheme for ancestor draws
    resampling: ResamplingScheme,
}

impl<'a, M: ModelLink> ParticleFilter<'a, M> {
    /// Create a filter with `particle_count` particles.
    ///
    /// # Errors
    /// [`FilterError::Configuration`] if `particle_count` is zero or the
    /// model fails validation.
    pub fn new(model: &'a M, particle_count: usize) -> FilterResult<Self> {
        if particle_count == 0 {
            return Err(FilterError::Configuration {
                description: "particle count must be at least 1".to_string(),
            });
        }
        model.validate()?;
        Ok(Self {
            model,
            particle_count,
            ancestor_bandwidth: DEFAULT_ANCESTOR_BANDWIDTH,
            resampling: ResamplingScheme::default(),
        })
    }

    /// Set the ancestor-sampling kernel bandwidth (finite, > 0).
    pub fn with_ancestor_bandwidth(mut self, bandwidth: f64) -> FilterResult<Self> {
        if !bandwidth.is_finite() || bandwidth <= 0.0 {
            return Err(FilterError::Configuration {
                description: format!("ancestor bandwidth must be finite and > 0, got {}", bandwidth),
            });
        }
        self.ancestor_bandwidth = bandwidth;
        Ok(self)
    }

    /// Set the resampling scheme.
    pub fn with_resampling(mut self, scheme: ResamplingScheme) -> Self {
        self.resampling = scheme;
        self
    }

    /// The model link.
    pub fn model(&self) -> &'a M {
        self.model
    }

    /// Number of particles N.
    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    /// Ancestor-sampling kernel bandwidth.
    pub fn ancestor_bandwidth(&self) -> f64 {
        self.ancestor_bandwidth
    }

    /// Resampling scheme.
    pub fn resampling(&self) -> ResamplingScheme {
        self.resampling
    }

    fn check_theta(&self, theta: &[f64]) -> FilterResult<()> {
        let expected = self.model.num_parameters();
        if theta.len() != expected {
            return Err(FilterError::DimensionMismatch {
                expected,
                actual: theta.len(),
                context: "parameter vector".to_string(),
            });
        }
        Ok(())
    }

    /// Storage for a pass, taken from [`ParticleState::initial`].
    fn initial_storage(
        &self,
    ) -> FilterResult<(DMatrix<f64>, DMatrix<usize>, DVector<f64>, DMatrix<f64>)> {
        let dims = self.model.dimensions();
        let state = ParticleState::initial(
            self.particle_count,
            dims.time_steps,
            dims.transition_steps,
            self.model.initial_state(),
        )?;
        Ok(state.into_parts())
    }

    /// Add `ln g_θ(x_{k+1}, y_k)` to the gathered parent log-weights.
    ///
    /// # Errors
    /// - [`FilterError::NonFiniteWeight`] for a NaN or `+inf` result, including
    ///   an exact hit on a zero-width observation density
    /// - [`FilterError::DegenerateWeights`] if every result is `-inf`
    fn reweight(
        &self,
        states: &DMatrix<f64>,
        mut log_weights: DVector<f64>,
        k: usize,
        theta: &[f64],
    ) -> FilterResult<DVector<f64>> {
        let observed = self.model.outflux()[k];
        for (j, w) in log_weights.iter_mut().enumerate() {
            *w += self
                .model
                .log_observation_likelihood(states[(j, k + 1)], observed, theta);
            if w.is_nan() || *w == f64::INFINITY {
                return Err(FilterError::NonFiniteWeight {
                    time_step: k + 1,
                    index: j,
                    value: *w,
                });
            }
        }
        if log_weights.iter().all(|&w| w == f64::NEG_INFINITY) {
            return Err(FilterError::DegenerateWeights { time_step: k + 1 });
        }
        Ok(log_weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Distribution, ParameterSetting, ReservoirModel};

    fn model() -> ReservoirModel {
        ReservoirModel::new(
            vec![1.0; 3],
            vec![3.0, 3.0, 3.0],
            ParameterSetting::estimated(
                Distribution::Uniform { low: 0.1, high: 0.9 },
                Distribution::random_walk(0.05),
            ),
            ParameterSetting::fixed(0.5),
            0.1,
        )
        .unwrap()
    }

    #[test]
    fn test_filter_configuration() {
        let model = model();
        assert!(matches!(
            ParticleFilter::new(&model, 0),
            Err(FilterError::Configuration { .. })
        ));
        let filter = ParticleFilter::new(&model, 8).unwrap();
        assert_eq!(filter.particle_count(), 8);
        assert_eq!(filter.ancestor_bandwidth(), DEFAULT_ANCESTOR_BANDWIDTH);
        assert!(filter.clone().with_ancestor_bandwidth(0.0).is_err());
        assert!(filter.with_ancestor_bandwidth(1e-3).is_ok());
    }

    #[test]
    fn test_theta_length_checked() {
        let model = model();
        let filter = ParticleFilter::new(&model, 4).unwrap();
        assert!(matches!(
            filter.check_theta(&[0.5, 0.1]),
            Err(FilterError::DimensionMismatch { expected: 1, actual: 2, .. })
        ));
    }

    #[test]
    fn test_reweight_degenerate_and_non_finite() {
        let model = ReservoirModel::new(
            vec![1.0; 3],
            vec![3.0, 3.0, 3.0],
            ParameterSetting::estimated(
                Distribution::Uniform { low: 0.1, high: 0.9 },
                Distribution::random_walk(0.05),
            ),
            ParameterSetting::fixed(0.0),
            0.1,
        )
        .unwrap();
        let filter = ParticleFilter::new(&model, 2).unwrap();
        let (mut states, _, weights, _) = filter.initial_storage().unwrap();

        states[(0, 1)] = 2.0;
        states[(1, 1)] = 4.0;
        assert_eq!(
            filter.reweight(&states, weights.clone(), 0, &[0.5]),
            Err(FilterError::DegenerateWeights { time_step: 1 })
        );

        // Exact hit on a zero-width likelihood is an infinite density.
        states[(1, 1)] = 3.0;
        assert!(matches!(
            filter.reweight(&states, weights, 0, &[0.5]),
            Err(FilterError::NonFiniteWeight { time_step: 1, index: 1, .. })
        ));
    }
}
