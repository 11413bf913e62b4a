//! Common utilities shared by the filters and the SAEM driver.
//!
//! This module contains the resampling primitive, log-space numerics, the
//! deterministic RNG, and synthetic data generation.

pub mod ground_truth;
pub mod resample;
pub mod rng;
pub mod utils;
