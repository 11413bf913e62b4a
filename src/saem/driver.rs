//! SAEM driver
//!
//! Outer loop of the estimator:
//!
//! 1. **Initialization**: D prior draws, one bootstrap pass each,
//!    `Qh = γ_0 · max log-weight`, the argmax draw becomes row 0.
//! 2. **Iteration `ll`, coordinate `p`**: D proposals for coordinate `p`
//!    around the latest accepted vector, one CPF-AS pass per draw on its
//!    own particle state, `Qh ← (1 − γ)·Qh + γ·max log-weight`, the argmax
//!    draw's value is recorded at `[ll+1, p]` and its extracted input path
//!    at `[ll+1, p, :]`.
//!
//! The chain length is fixed; there is no convergence test.
//!
//! # Parallelism
//!
//! With the `rayon` feature the D filter passes of one phase run in
//! parallel. Every draw gets its own [`SimpleRng`] stream forked from a
//! per-phase seed, so results do not depend on the feature. Selection,
//! record writes and reporting happen after the passes have joined.

use nalgebra::{DMatrix, DVector};
use rand::Rng;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use super::config::SaemConfig;
use super::coordinate::CoordinateSweep;
use super::errors::{SaemError, SaemResult};
use super::records::{InputRecord, ParameterRecord, SaemOutput};
use crate::common::rng::SimpleRng;
use crate::common::utils::argmax;
use crate::filter::trajectory::extract_reference;
use crate::filter::{FilterResult, ParticleFilter, ParticleState};
use crate::model::{ConfigError, ModelLink};
use crate::reporter::{NoOpReporter, SaemReporter};

/// Stochastic-approximation update `(1 − γ)·qh + γ·max_weights`.
///
/// For `γ ∈ [0, 1]` every entry lies between the old statistic and the new
/// maximum log-weight.
pub fn stochastic_approximation_update(
    qh: &DVector<f64>,
    max_weights: &DVector<f64>,
    gamma: f64,
) -> DVector<f64> {
    qh.zip_map(max_weights, |q, m| (1.0 - gamma) * q + gamma * m)
}

/// Particle-Gibbs SAEM estimator bound to a model
#[derive(Debug, Clone)]
pub struct SaemEstimator<M: ModelLink> {
    model: M,
    config: SaemConfig,
}

impl<M: ModelLink> SaemEstimator<M> {
    /// Validate the model and the configuration.
    ///
    /// All configuration errors surface here, never mid-run.
    pub fn new(model: M, config: SaemConfig) -> SaemResult<Self> {
        config.validate()?;
        model.validate()?;
        Ok(Self { model, config })
    }

    /// The model link.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The configuration.
    pub fn config(&self) -> &SaemConfig {
        &self.config
    }

    /// Run with a [`SimpleRng`] seeded from [`SaemConfig::seed`].
    pub fn run_seeded(&self) -> SaemResult<SaemOutput> {
        self.run(&mut SimpleRng::new(self.config.seed))
    }

    /// Run the full chain.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> SaemResult<SaemOutput> {
        self.run_with_reporter(rng, &mut NoOpReporter)
    }

    /// Run the full chain, reporting progress to `reporter`.
    ///
    /// # Errors
    /// [`SaemError::Filter`] with the iteration, coordinate and draw of the
    /// first failing filter pass (lowest draw index within a phase).
    pub fn run_with_reporter<R, Rep>(&self, rng: &mut R, reporter: &mut Rep) -> SaemResult<SaemOutput>
    where
        R: Rng + ?Sized,
        Rep: SaemReporter,
    {
        self.run_with_execution(rng, reporter, Execution::for_build())
    }

    fn run_with_execution<R, Rep>(
        &self,
        rng: &mut R,
        reporter: &mut Rep,
        execution: Execution,
    ) -> SaemResult<SaemOutput>
    where
        R: Rng + ?Sized,
        Rep: SaemReporter,
    {
        let filter = self.filter()?;
        let dims = self.model.dimensions();
        let params = self.model.parameters();
        let num_params = params.len();
        let num_draws = self.config.num_draws;
        let chain_length = self.config.chain_length;
        let scheme = self.config.resampling;
        let step_size = &self.config.step_size;

        let mut parameters = ParameterRecord::new(chain_length, num_params);
        let mut inputs = InputRecord::new(
            chain_length,
            num_params,
            dims.time_steps,
            dims.transition_steps,
        )?;

        // Initialization
        let theta = self.model.sample_theta_from_prior(rng, num_draws)?;
        let seed: u64 = rng.gen();
        let mut states = collect_states(
            run_draws(execution, num_draws, |d| {
                filter.run_smc(&mut SimpleRng::new(seed).fork(d as u64), &row(&theta, d))
            }),
            None,
            None,
        )?;
        for (d, state) in states.iter().enumerate() {
            reporter.on_draw_filtered(None, None, d, state);
        }

        let mut qh = max_weights(&states) * step_size.at(0);
        let best = best_draw(&qh)?;
        let initial = row(&theta, best);
        parameters.record_row(0, &initial)?;
        let reference = extract_reference(rng, &states[best], scheme)
            .map_err(|e| SaemError::filter(None, None, best, e))?;
        for p in 0..num_params {
            inputs.record(0, p, &reference.inputs)?;
        }
        reporter.on_initialization(&theta, &qh, best);

        // Coordinate-wise sweeps
        let mut sweep = CoordinateSweep::new(initial);
        for ll in 0..chain_length {
            let gamma = step_size.at(ll + 1);

            for (p, spec) in params.iter().enumerate() {
                let proposals = sweep.propose(rng, p, &spec.update, num_draws)?;
                let seed: u64 = rng.gen();
                let previous = &states;
                let next = collect_states(
                    run_draws(execution, num_draws, |d| {
                        filter.run_cpf_as(
                            &mut SimpleRng::new(seed).fork(d as u64),
                            &previous[d],
                            &row(&proposals, d),
                        )
                    }),
                    Some(ll),
                    Some(p),
                )?;
                states = next;
                for (d, state) in states.iter().enumerate() {
                    reporter.on_draw_filtered(Some(ll), Some(p), d, state);
                }

                qh = stochastic_approximation_update(&qh, &max_weights(&states), gamma);
                let best = best_draw(&qh)?;
                let value = proposals[(best, p)];
                parameters.record(ll + 1, p, value)?;
                sweep.accept(p, value)?;

                let reference = extract_reference(rng, &states[best], scheme)
                    .map_err(|e| SaemError::filter(Some(ll), Some(p), best, e))?;
                inputs.record(ll + 1, p, &reference.inputs)?;
                reporter.on_coordinate_update(ll, p, &proposals, &qh, best, value);
            }

            let accepted = sweep.finish()?;
            reporter.on_iteration_complete(ll, &accepted);
        }

        Ok(SaemOutput {
            parameters,
            inputs,
            final_qh: qh,
            parameter_names: self.model.parameter_names(),
        })
    }

    fn filter(&self) -> SaemResult<ParticleFilter<'_, M>> {
        ParticleFilter::new(&self.model, self.config.particle_count)
            .and_then(|f| f.with_ancestor_bandwidth(self.config.ancestor_bandwidth))
            .map(|f| f.with_resampling(self.config.resampling))
            .map_err(|e| SaemError::Config(ConfigError::invalid("filter", e.to_string())))
    }
}

/// How the D filter passes of one phase are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Execution {
    Sequential,
    #[cfg(feature = "rayon")]
    Parallel,
}

impl Execution {
    fn for_build() -> Self {
        #[cfg(feature = "rayon")]
        {
            Execution::Parallel
        }
        #[cfg(not(feature = "rayon"))]
        {
            Execution::Sequential
        }
    }
}

/// One filter pass per draw, in draw order.
fn run_draws<F>(execution: Execution, num_draws: usize, pass: F) -> Vec<FilterResult<ParticleState>>
where
    F: Fn(usize) -> FilterResult<ParticleState> + Send + Sync,
{
    match execution {
        Execution::Sequential => (0..num_draws).map(pass).collect(),
        #[cfg(feature = "rayon")]
        Execution::Parallel => (0..num_draws).into_par_iter().map(pass).collect(),
    }
}

fn collect_states(
    results: Vec<FilterResult<ParticleState>>,
    iteration: Option<usize>,
    coordinate: Option<usize>,
) -> SaemResult<Vec<ParticleState>> {
    results
        .into_iter()
        .enumerate()
        .map(|(d, r)| r.map_err(|e| SaemError::filter(iteration, coordinate, d, e)))
        .collect()
}

fn max_weights(states: &[ParticleState]) -> DVector<f64> {
    DVector::from_iterator(states.len(), states.iter().map(ParticleState::max_log_weight))
}

fn best_draw(qh: &DVector<f64>) -> SaemResult<usize> {
    argmax(qh.as_slice()).ok_or_else(|| {
        SaemError::Config(ConfigError::Missing {
            field: "num_draws".to_string(),
        })
    })
}

fn row(m: &DMatrix<f64>, i: usize) -> Vec<f64> {
    m.row(i).iter().copied().collect()
}
