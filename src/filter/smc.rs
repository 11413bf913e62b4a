//! Bootstrap sequential Monte Carlo pass
//!
//! Resamples at every step (no adaptive trigger). Each step k:
//!
//! 1. draw N ancestors at step k proportional to the current log-weights
//! 2. gather the parents' states and log-weights
//! 3. draw one input per particle from the model's input-uncertainty model
//! 4. propagate `x_{k+1} = f_θ(x_k, r_k)`
//! 5. re-weight `w_{k+1} = w_parent + ln g_θ(x_{k+1}, y_k)`

use nalgebra::DVector;
use rand::Rng;

use super::errors::{FilterError, FilterResult};
use super::state::ParticleState;
use super::ParticleFilter;
use crate::common::resample::resample;
use crate::model::ModelLink;

impl<'a, M: ModelLink> ParticleFilter<'a, M> {
    /// Run an unconditioned bootstrap pass for the parameter vector `theta`.
    ///
    /// # Errors
    /// - [`FilterError::DimensionMismatch`] if `theta` has the wrong length
    /// - [`FilterError::DegenerateWeights`] if every particle has zero
    ///   likelihood after a step
    /// - [`FilterError::NonFiniteWeight`] if a log-weight becomes NaN or `+inf`
    pub fn run_smc<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        theta: &[f64],
    ) -> FilterResult<ParticleState> {
        self.check_theta(theta)?;
        let n = self.particle_count;
        let k_steps = self.model.dimensions().transition_steps;
        let influx = self.model.influx();

        let (mut states, mut ancestors, mut log_weights, mut inputs) = self.initial_storage()?;
        let mut draws = vec![0.0; n];

        for k in 0..k_steps {
            let parents = resample(rng, log_weights.as_slice(), n, self.resampling)
                .map_err(|e| FilterError::from_resample(k, e))?;
            self.model.sample_inputs(rng, influx[k], &mut draws);

            let mut gathered = DVector::zeros(n);
            for (j, &a) in parents.iter().enumerate() {
                ancestors[(j, k + 1)] = a;
                inputs[(j, k)] = draws[j];
                states[(j, k + 1)] = self.model.transition(states[(a, k)], draws[j], theta);
                gathered[j] = log_weights[a];
            }
            log_weights = self.reweight(&states, gathered, k, theta)?;
        }

        ParticleState::new(states, ancestors, log_weights, inputs)
    }
}
