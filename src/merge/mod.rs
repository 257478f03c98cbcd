//! Merge engine
//!
//! Split the way the rest of the crate keeps effects at the edges:
//! 1. Guards - retry budget and deadline (pure)
//! 2. Policy - map a snapshot to a `MergeDecision` (pure, testable)
//! 3. Orchestrator - poll, act, render (effectful)

mod guard;
mod orchestrator;
mod policy;
mod rebase;

pub use guard::{DEFAULT_MAX_RETRIES, Deadline, RetryPolicy};
pub use orchestrator::{
    CI_WAIT_LABEL, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, MergeOptions, MergeOrchestrator,
    MergeReport,
};
pub use policy::{MergeDecision, decide};
pub use rebase::{REBASE_WAIT_LABEL, wait_for_rebase};
