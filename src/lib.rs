//! glmr - drive GitLab merge requests to a merge from the command line
//!
//! The core is the merge engine in [`merge`]: it polls a merge request,
//! rebases it when GitLab asks for it (within a retry budget), waits for CI,
//! and merges, all under one deadline. [`progress`] renders live status
//! while it runs.
//!
//! Everything that talks to GitLab goes through the
//! [`platform::MergeRequestService`] trait, so the engine can be driven by a
//! scripted service in tests.

pub mod auth;
pub mod config;
pub mod error;
pub mod merge;
pub mod platform;
pub mod progress;
pub mod types;

pub use error::{Error, Result};
