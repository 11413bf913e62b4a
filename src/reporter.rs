//! Observability for SAEM runs.
//!
//! This module provides the [`SaemReporter`] trait for debugging and research
//! instrumentation. Reporters receive callbacks at key points of a run
//! without polluting the estimator logic.
//!
//! # Zero-Cost Abstraction
//!
//! The default [`NoOpReporter`] compiles to zero overhead - all callback
//! methods are empty and will be optimized away by the compiler.
//!
//! # Example
//!
//! ```ignore
//! use particle_saem::{DebugReporter, SaemEstimator};
//!
//! let mut reporter = DebugReporter::new();
//! let output = estimator.run_with_reporter(&mut rng, &mut reporter)?;
//!
//! println!("Captured {} coordinate updates", reporter.coordinate_events().len());
//! ```

use nalgebra::{DMatrix, DVector};

use crate::filter::ParticleState;

// ============================================================================
// Events
// ============================================================================

/// Initialization finished: one SMC pass per prior draw.
#[derive(Debug, Clone, PartialEq)]
pub struct InitializationEvent {
    /// Prior draws, one row per draw ([D, P])
    pub theta: DMatrix<f64>,
    /// Initial `Qh` per draw
    pub qh: DVector<f64>,
    /// Index of the winning draw
    pub best_draw: usize,
}

/// One draw's filter pass finished.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawEvent {
    /// Outer iteration (`None` during initialization)
    pub iteration: Option<usize>,
    /// Coordinate being updated (`None` during initialization)
    pub coordinate: Option<usize>,
    /// Draw index
    pub draw: usize,
    /// Largest log-weight of the new particle state
    pub max_log_weight: f64,
    /// Effective sample size of the new particle state
    pub effective_sample_size: f64,
}

/// One coordinate update finished and its winner was recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateEvent {
    /// Outer iteration `ll`
    pub iteration: usize,
    /// Coordinate `p`
    pub coordinate: usize,
    /// Proposals, one row per draw ([D, P])
    pub proposals: DMatrix<f64>,
    /// `Qh` after the update
    pub qh: DVector<f64>,
    /// Index of the winning draw
    pub best_draw: usize,
    /// Recorded value `[ll+1, p]`
    pub value: f64,
}

// ============================================================================
// SaemReporter Trait
// ============================================================================

/// Observability trait for SAEM runs.
///
/// All methods have default empty implementations, so you only need
/// to override the events you care about.
///
/// # Thread Safety
///
/// Callbacks are issued from the driving thread only, after any parallel
/// filter passes have joined, so reporters need not be `Send + Sync`.
pub trait SaemReporter {
    /// Called after the initial SMC passes and the iteration-0 selection.
    fn on_initialization(&mut self, _theta: &DMatrix<f64>, _qh: &DVector<f64>, _best_draw: usize) {}

    /// Called once per draw after its filter pass.
    fn on_draw_filtered(
        &mut self,
        _iteration: Option<usize>,
        _coordinate: Option<usize>,
        _draw: usize,
        _state: &ParticleState,
    ) {
    }

    /// Called after a coordinate's winner has been recorded.
    fn on_coordinate_update(
        &mut self,
        _iteration: usize,
        _coordinate: usize,
        _proposals: &DMatrix<f64>,
        _qh: &DVector<f64>,
        _best_draw: usize,
        _value: f64,
    ) {
    }

    /// Called after every coordinate of iteration `ll` has been updated.
    fn on_iteration_complete(&mut self, _iteration: usize, _parameters: &[f64]) {}
}

// ============================================================================
// NoOpReporter
// ============================================================================

/// Zero-cost reporter that does nothing.
///
/// This is the reporter used by [`crate::saem::SaemEstimator::run`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl NoOpReporter {
    /// Create a new no-op reporter.
    pub fn new() -> Self {
        Self
    }
}

impl SaemReporter for NoOpReporter {
    // All methods use default empty implementations
}

// ============================================================================
// DebugReporter
// ============================================================================

/// Reporter that captures all events for debugging.
///
/// Particle states are summarized (max log-weight and ESS), not cloned.
#[derive(Debug, Clone, Default)]
pub struct DebugReporter {
    initializations: Vec<InitializationEvent>,
    draws: Vec<DrawEvent>,
    coordinates: Vec<CoordinateEvent>,
    iterations: Vec<(usize, Vec<f64>)>,
}

impl DebugReporter {
    /// Create a new debug reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all captured events.
    pub fn clear(&mut self) {
        self.initializations.clear();
        self.draws.clear();
        self.coordinates.clear();
        self.iterations.clear();
    }

    /// Get captured initialization events.
    pub fn initialization_events(&self) -> &[InitializationEvent] {
        &self.initializations
    }

    /// Get captured per-draw events.
    pub fn draw_events(&self) -> &[DrawEvent] {
        &self.draws
    }

    /// Get captured coordinate update events.
    pub fn coordinate_events(&self) -> &[CoordinateEvent] {
        &self.coordinates
    }

    /// Get captured iteration events (iteration, parameter vector).
    pub fn iteration_events(&self) -> &[(usize, Vec<f64>)] {
        &self.iterations
    }

    /// Total number of captured events across all types.
    pub fn total_events(&self) -> usize {
        self.initializations.len() + self.draws.len() + self.coordinates.len() + self.iterations.len()
    }
}

impl SaemReporter for DebugReporter {
    fn on_initialization(&mut self, theta: &DMatrix<f64>, qh: &DVector<f64>, best_draw: usize) {
        self.initializations.push(InitializationEvent {
            theta: theta.clone(),
            qh: qh.clone(),
            best_draw,
        });
    }

    fn on_draw_filtered(
        &mut self,
        iteration: Option<usize>,
        coordinate: Option<usize>,
        draw: usize,
        state: &ParticleState,
    ) {
        self.draws.push(DrawEvent {
            iteration,
            coordinate,
            draw,
            max_log_weight: state.max_log_weight(),
            effective_sample_size: state.effective_sample_size(),
        });
    }

    fn on_coordinate_update(
        &mut self,
        iteration: usize,
        coordinate: usize,
        proposals: &DMatrix<f64>,
        qh: &DVector<f64>,
        best_draw: usize,
        value: f64,
    ) {
        self.coordinates.push(CoordinateEvent {
            iteration,
            coordinate,
            proposals: proposals.clone(),
            qh: qh.clone(),
            best_draw,
            value,
        });
    }

    fn on_iteration_complete(&mut self, iteration: usize, parameters: &[f64]) {
        self.iterations.push((iteration, parameters.to_vec()));
    }
}

// ============================================================================
// LoggingReporter
// ============================================================================

/// Reporter that emits events through the `log` crate.
///
/// # Log Levels
///
/// - `on_initialization`, `on_iteration_complete`: INFO
/// - `on_coordinate_update`: DEBUG
/// - `on_draw_filtered`: TRACE
///
/// The verbose variant also logs proposals and `Qh` at DEBUG.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingReporter {
    /// Whether to include proposal vectors and `Qh` in log messages
    verbose: bool,
}

impl LoggingReporter {
    /// Create a new logging reporter.
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Create a verbose logging reporter.
    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl SaemReporter for LoggingReporter {
    fn on_initialization(&mut self, theta: &DMatrix<f64>, qh: &DVector<f64>, best_draw: usize) {
        log::info!(
            "Initialization complete: {} draws, best draw {} (Qh={:.4})",
            theta.nrows(),
            best_draw,
            qh[best_draw]
        );
        if self.verbose {
            log::debug!("  Initial theta: {:?}", theta.row(best_draw).iter().collect::<Vec<_>>());
            log::debug!("  Initial Qh: {:?}", qh.as_slice());
        }
    }

    fn on_draw_filtered(
        &mut self,
        iteration: Option<usize>,
        coordinate: Option<usize>,
        draw: usize,
        state: &ParticleState,
    ) {
        log::trace!(
            "Draw {} filtered (iteration {:?}, coordinate {:?}): max log-weight {:.4}, ESS {:.1}",
            draw,
            iteration,
            coordinate,
            state.max_log_weight(),
            state.effective_sample_size()
        );
    }

    fn on_coordinate_update(
        &mut self,
        iteration: usize,
        coordinate: usize,
        proposals: &DMatrix<f64>,
        qh: &DVector<f64>,
        best_draw: usize,
        value: f64,
    ) {
        log::debug!(
            "Iteration {} coordinate {}: draw {} selected, value {:.6}",
            iteration,
            coordinate,
            best_draw,
            value
        );
        if self.verbose {
            log::debug!(
                "  Proposals: {:?}",
                proposals.column(coordinate).iter().collect::<Vec<_>>()
            );
            log::debug!("  Qh: {:?}", qh.as_slice());
        }
    }

    fn on_iteration_complete(&mut self, iteration: usize, parameters: &[f64]) {
        log::info!("Iteration {} complete: theta={:?}", iteration, parameters);
    }
}

// ============================================================================
// CompositeReporter
// ============================================================================

/// Reporter that forwards events to two child reporters.
///
/// # Example
///
/// ```
/// use particle_saem::reporter::{CompositeReporter, DebugReporter, LoggingReporter, SaemReporter};
///
/// let mut composite = CompositeReporter::new(DebugReporter::new(), LoggingReporter::new());
/// composite.on_iteration_complete(0, &[0.7]);
/// assert_eq!(composite.first().iteration_events().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct CompositeReporter<A: SaemReporter, B: SaemReporter> {
    first: A,
    second: B,
}

impl<A: SaemReporter, B: SaemReporter> CompositeReporter<A, B> {
    /// Create a new composite reporter.
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// Get a reference to the first reporter.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// Get a mutable reference to the first reporter.
    pub fn first_mut(&mut self) -> &mut A {
        &mut self.first
    }

    /// Get a reference to the second reporter.
    pub fn second(&self) -> &B {
        &self.second
    }

    /// Get a mutable reference to the second reporter.
    pub fn second_mut(&mut self) -> &mut B {
        &mut self.second
    }

    /// Consume and return both reporters.
    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: SaemReporter, B: SaemReporter> SaemReporter for CompositeReporter<A, B> {
    fn on_initialization(&mut self, theta: &DMatrix<f64>, qh: &DVector<f64>, best_draw: usize) {
        self.first.on_initialization(theta, qh, best_draw);
        self.second.on_initialization(theta, qh, best_draw);
    }

    fn on_draw_filtered(
        &mut self,
        iteration: Option<usize>,
        coordinate: Option<usize>,
        draw: usize,
        state: &ParticleState,
    ) {
        self.first.on_draw_filtered(iteration, coordinate, draw, state);
        self.second.on_draw_filtered(iteration, coordinate, draw, state);
    }

    fn on_coordinate_update(
        &mut self,
        iteration: usize,
        coordinate: usize,
        proposals: &DMatrix<f64>,
        qh: &DVector<f64>,
        best_draw: usize,
        value: f64,
    ) {
        self.first
            .on_coordinate_update(iteration, coordinate, proposals, qh, best_draw, value);
        self.second
            .on_coordinate_update(iteration, coordinate, proposals, qh, best_draw, value);
    }

    fn on_iteration_complete(&mut self, iteration: usize, parameters: &[f64]) {
        self.first.on_iteration_complete(iteration, parameters);
        self.second.on_iteration_complete(iteration, parameters);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ParticleState {
        ParticleState::initial(4, 3, 3, 1.0).unwrap()
    }

    #[test]
    fn test_noop_reporter() {
        let mut reporter = NoOpReporter::new();

        // These should all compile and do nothing
        reporter.on_initialization(&DMatrix::zeros(2, 1), &DVector::zeros(2), 0);
        reporter.on_draw_filtered(None, None, 0, &state());
        reporter.on_coordinate_update(0, 0, &DMatrix::zeros(2, 1), &DVector::zeros(2), 1, 0.5);
        reporter.on_iteration_complete(0, &[0.5]);
    }

    #[test]
    fn test_debug_reporter_captures_events() {
        let mut reporter = DebugReporter::new();
        assert_eq!(reporter.total_events(), 0);

        reporter.on_initialization(&DMatrix::zeros(2, 1), &DVector::from_vec(vec![-1.0, -0.5]), 1);
        reporter.on_draw_filtered(Some(0), Some(0), 1, &state());
        reporter.on_draw_filtered(Some(0), Some(0), 0, &state());
        reporter.on_coordinate_update(0, 0, &DMatrix::zeros(2, 1), &DVector::zeros(2), 1, 0.5);
        reporter.on_iteration_complete(0, &[0.5]);

        assert_eq!(reporter.initialization_events()[0].best_draw, 1);
        assert_eq!(reporter.draw_events().len(), 2);
        assert_eq!(reporter.draw_events()[0].draw, 1);
        assert!((reporter.draw_events()[0].effective_sample_size - 4.0).abs() < 1e-9);
        assert_eq!(reporter.coordinate_events()[0].value, 0.5);
        assert_eq!(reporter.iteration_events()[0], (0, vec![0.5]));
        assert_eq!(reporter.total_events(), 5);

        reporter.clear();
        assert_eq!(reporter.total_events(), 0);
    }

    #[test]
    fn test_logging_reporter_does_not_panic() {
        let mut reporter = LoggingReporter::verbose();
        let qh = DVector::from_vec(vec![-1.0, -0.5]);
        reporter.on_initialization(&DMatrix::zeros(2, 1), &qh, 1);
        reporter.on_draw_filtered(None, None, 0, &state());
        reporter.on_coordinate_update(0, 0, &DMatrix::zeros(2, 1), &qh, 1, 0.5);
        reporter.on_iteration_complete(0, &[0.5]);
    }

    #[test]
    fn test_composite_reporter() {
        let mut composite = CompositeReporter::new(DebugReporter::new(), DebugReporter::new());
        composite.on_iteration_complete(2, &[0.1, 0.2]);
        composite.on_draw_filtered(None, None, 3, &state());

        assert_eq!(composite.first().total_events(), 2);
        assert_eq!(composite.second().total_events(), 2);

        let (a, b) = composite.into_parts();
        assert_eq!(a.iteration_events(), b.iteration_events());
    }
}
