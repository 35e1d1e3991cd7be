//! External analyzer invocation.
//!
//! This module wraps the `slither` binary as a child process with a hard
//! wall-clock deadline.

pub mod runner;

pub use runner::{AnalysisTarget, RunnerConfig, SlitherOutput, SlitherRunner};
