//! Merge decisions - pure mapping from a snapshot to the next step
//!
//! No I/O happens here. The orchestrator fetches a snapshot, asks
//! [`decide`] what to do, and performs the effect.

use crate::types::{MergeRequest, PipelineStatus, StatusClass};

/// What the orchestrator should do with a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeDecision {
    /// Attempt the merge now
    Merge {
        /// Coarse status still says "in progress" but the pipeline already
        /// succeeded
        pipeline_ahead: bool,
    },
    /// Source branch must be rebased first
    Rebase,
    /// Conflicts need a human
    Conflict,
    /// Head pipeline failed or was canceled
    PipelineBroken(PipelineStatus),
    /// Remote is still working; poll again later
    Wait,
    /// Status outside the recognized set
    Unexpected(String),
}

/// Decide the next step for a snapshot
///
/// GitLab's `detailed_merge_status` lags behind the pipeline. While it
/// reports an in-progress value, a finished pipeline wins: `success` merges
/// right away and `failed`/`canceled` stop the run.
pub fn decide(mr: &MergeRequest) -> MergeDecision {
    match mr.detailed_merge_status.class() {
        StatusClass::Mergeable => MergeDecision::Merge {
            pipeline_ahead: false,
        },
        StatusClass::NeedsRebase => MergeDecision::Rebase,
        StatusClass::Conflict => MergeDecision::Conflict,
        StatusClass::InProgress => match mr.head_pipeline.as_ref().map(|p| &p.status) {
            Some(PipelineStatus::Success) => MergeDecision::Merge {
                pipeline_ahead: true,
            },
            Some(status) if status.is_broken() => MergeDecision::PipelineBroken(status.clone()),
            _ => MergeDecision::Wait,
        },
        StatusClass::Unexpected => {
            MergeDecision::Unexpected(mr.detailed_merge_status.to_string())
        }
    }
}
