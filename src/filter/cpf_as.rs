//! Conditional particle filter with ancestor sampling (CPF-AS)
//!
//! One particle slot (the last, `N-1`) is pinned to a reference path. At
//! each step the reference particle's ancestor is redrawn with weights
//!
//! ```text
//! W̃_j = W_j + ln N(x'_{k+1}; f_θ(x_{j,k}, r_{j,k}), bandwidth²)
//! ```
//!
//! so it adopts the history most compatible with the reference state. The
//! remaining N−1 slots are resampled as in the bootstrap pass. Iterating
//! this kernel is the particle-Gibbs step over trajectories.

use nalgebra::DVector;
use rand::Rng;

use super::errors::{FilterError, FilterResult};
use super::state::ParticleState;
use super::trajectory::{extract_reference, ReferenceTrajectory};
use super::ParticleFilter;
use crate::common::resample::resample;
use crate::common::utils::gaussian_log_pdf;
use crate::model::ModelLink;

impl<'a, M: ModelLink> ParticleFilter<'a, M> {
    /// Draw a reference from `prior` and run a conditional pass pinned to it.
    ///
    /// `prior` is left untouched; the returned state replaces it.
    pub fn run_cpf_as<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        prior: &ParticleState,
        theta: &[f64],
    ) -> FilterResult<ParticleState> {
        let reference = extract_reference(rng, prior, self.resampling)?;
        self.run_cpf_as_with_reference(rng, &reference, theta)
    }

    /// Run a conditional pass pinned to `reference`.
    ///
    /// After the pass, slot `N-1` holds `reference.states[k]` and
    /// `reference.inputs[k-1]` at every step `k ≥ 1`.
    ///
    /// # Errors
    /// - [`FilterError::DimensionMismatch`] if `theta` or `reference` do not
    ///   match the model dimensions
    /// - [`FilterError::DegenerateWeights`] / [`FilterError::NonFiniteWeight`]
    ///   as for [`ParticleFilter::run_smc`]
    pub fn run_cpf_as_with_reference<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        reference: &ReferenceTrajectory,
        theta: &[f64],
    ) -> FilterResult<ParticleState> {
        self.check_theta(theta)?;
        let n = self.particle_count;
        let k_steps = self.model.dimensions().transition_steps;
        check_reference(reference, k_steps, self.model.initial_state())?;
        let influx = self.model.influx();
        let pinned = n - 1;

        let (mut states, mut ancestors, mut log_weights, mut inputs) = self.initial_storage()?;
        let mut draws = vec![0.0; n];
        let mut candidates = vec![0.0; n];

        for k in 0..k_steps {
            let x_ref = reference.states[k + 1];

            self.model.sample_inputs(rng, influx[k], &mut draws);
            for j in 0..n {
                candidates[j] = self.model.transition(states[(j, k)], draws[j], theta);
            }

            let ancestor_weights: Vec<f64> = log_weights
                .iter()
                .zip(&candidates)
                .map(|(&w, &x)| w + gaussian_log_pdf(x_ref, x, self.ancestor_bandwidth))
                .collect();
            let a_ref = resample(rng, &ancestor_weights, 1, self.resampling)
                .map_err(|e| FilterError::from_resample(k, e))?[0];
            let parents = if pinned > 0 {
                resample(rng, log_weights.as_slice(), pinned, self.resampling)
                    .map_err(|e| FilterError::from_resample(k, e))?
            } else {
                Vec::new()
            };

            let mut gathered = DVector::zeros(n);
            for (j, &a) in parents.iter().enumerate() {
                ancestors[(j, k + 1)] = a;
                states[(j, k + 1)] = candidates[a];
                inputs[(j, k)] = draws[a];
                gathered[j] = log_weights[a];
            }
            ancestors[(pinned, k + 1)] = a_ref;
            states[(pinned, k + 1)] = x_ref;
            inputs[(pinned, k)] = reference.inputs[k];
            gathered[pinned] = log_weights[a_ref];

            log_weights = self.reweight(&states, gathered, k, theta)?;
        }

        ParticleState::new(states, ancestors, log_weights, inputs)
    }
}

/// Reference must span the horizon and start at the model's initial state.
fn check_reference(reference: &ReferenceTrajectory, k_steps: usize, x0: f64) -> FilterResult<()> {
    if reference.inputs.len() != k_steps {
        return Err(FilterError::DimensionMismatch {
            expected: k_steps,
            actual: reference.inputs.len(),
            context: "reference inputs".to_string(),
        });
    }
    if reference.states.len() != k_steps + 1 {
        return Err(FilterError::DimensionMismatch {
            expected: k_steps + 1,
            actual: reference.states.len(),
            context: "reference states".to_string(),
        });
    }
    if reference.states[0] != x0 {
        return Err(FilterError::Configuration {
            description: format!(
                "reference starts at {} but the initial state is {}",
                reference.states[0], x0
            ),
        });
    }
    Ok(())
}
