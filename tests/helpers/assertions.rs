//! Assertion functions for numerical comparisons with tolerance

use particle_saem::ParticleState;

/// Compare scalar values with tolerance
pub fn assert_scalar_close(actual: f64, expected: f64, tolerance: f64, field_name: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{}: expected {}, got {} (diff: {}, tolerance: {})",
        field_name,
        expected,
        actual,
        diff,
        tolerance
    );
}

/// Check the structural invariants of a completed particle state:
/// identity ancestors at step 0, in-range ancestors after, no NaN or `+inf`
/// weights, and at least one finite weight.
pub fn assert_valid_state(state: &ParticleState, context: &str) {
    let n = state.particle_count();
    let ancestors = state.ancestors();
    for j in 0..n {
        assert_eq!(ancestors[(j, 0)], j, "{}: ancestor column 0 row {}", context, j);
        for k in 1..ancestors.ncols() {
            assert!(
                ancestors[(j, k)] < n,
                "{}: ancestor [{}, {}] = {} out of range",
                context,
                j,
                k,
                ancestors[(j, k)]
            );
        }
    }
    for (j, &w) in state.log_weights().iter().enumerate() {
        assert!(
            !w.is_nan() && w != f64::INFINITY,
            "{}: log-weight {} is {}",
            context,
            j,
            w
        );
    }
    assert!(
        state.log_weights().iter().any(|w| w.is_finite()),
        "{}: all log-weights are -inf",
        context
    );
}
