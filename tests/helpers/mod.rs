//! Shared test helpers
//!
//! Fixture construction and tolerance assertions used across the
//! integration tests.

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;
