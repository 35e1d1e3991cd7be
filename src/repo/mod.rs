//! Repository acquisition modules.
//!
//! This module handles per-request workspaces and cloning of remote
//! repositories into them.

pub mod cloner;

pub use cloner::{clone_repository, CloneOptions, Workspace};
