//! Analysis result handling.
//!
//! This module turns raw analyzer output into the normalized outcome
//! shape returned to callers.

pub mod aggregator;

pub use aggregator::*;
