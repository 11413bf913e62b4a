/*!
# particle_saem - Particle Gibbs SAEM for scalar state-space models

Rust implementation of a stochastic-approximation EM parameter search
driven by conditional particle filters with ancestor sampling (CPF-AS).

## Features

- Bootstrap SMC and CPF-AS over a scalar state with uncertain inputs
- Coordinate-wise SAEM sweeps over D parallel parameter draws
- Write-once parameter and input-trajectory records
- Optional `rayon` feature for parallel per-draw filter passes

## Modules

- [`model`] - Model capability interface, distributions, linear reservoir
- [`filter`] - Particle states, SMC, CPF-AS, trajectory extraction
- [`saem`] - SAEM driver, configuration, records
- [`reporter`] - Observability callbacks
- [`common`] - Low-level utilities

## Example

```rust,no_run
use particle_saem::{
    Distribution, ParameterSetting, ReservoirModel, SaemConfig, SaemEstimator, SimpleRng,
};

let model = ReservoirModel::new(
    vec![1.0; 5],
    vec![8.0, 6.6, 5.6, 4.9, 4.5],
    ParameterSetting::estimated(
        Distribution::Uniform { low: 0.5, high: 0.9 },
        Distribution::random_walk(0.01),
    ),
    ParameterSetting::fixed(0.1),
    0.1,
)?
.with_initial_state(10.0)?;

let estimator = SaemEstimator::new(model, SaemConfig::new(200, 10, 20))?;
let output = estimator.run(&mut SimpleRng::new(42))?;
println!("decay = {:?}", output.parameter("decay"));
# Ok::<(), particle_saem::SaemError>(())
```
*/

// ============================================================================
// Core modules
// ============================================================================

/// Model capability interface and the linear reservoir reference model
pub mod model;

/// Particle filters (SMC, CPF-AS) and trajectory extraction
pub mod filter;

/// SAEM driver, configuration and chain records
pub mod saem;

/// Observability callbacks for SAEM runs
pub mod reporter;

/// Low-level utilities (resampling, RNG, log-space numerics, synthetic data)
pub mod common;

/// Benchmark utilities (scenario presets, estimator factory)
pub mod bench_utils;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// Model
pub use model::{
    ConfigError, ConfigResult, Distribution, ModelDimensions, ModelLink, ParameterSetting,
    ParameterSpec, ReservoirConfig, ReservoirModel,
};

// Filters
pub use filter::{
    FilterError, FilterResult, ParticleFilter, ParticleState, ReferenceTrajectory, ResampleError,
};

// Estimator
pub use saem::{
    InputRecord, ParameterRecord, SaemConfig, SaemError, SaemEstimator, SaemOutput, SaemResult,
    SaemSummary, StepSize,
};

// Reporters
pub use reporter::{CompositeReporter, DebugReporter, LoggingReporter, NoOpReporter, SaemReporter};

// Utilities
pub use common::resample::ResamplingScheme;
pub use common::rng::SimpleRng;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
