//! GitLab merge request service
//!
//! Provides the interface the merge engine drives, plus the reqwest-backed
//! implementation.

mod gitlab;
mod reference;

pub use gitlab::GitLabService;
pub use reference::parse_mr_ref;

use crate::error::Result;
use crate::types::{JobStats, ListQuery, MergeRequest, MrRef, NewMergeRequest};
use async_trait::async_trait;

/// Merge request operations used by glmr
///
/// Every call is a single request/response round trip. Implementations never
/// retry; retry policy lives in the merge engine.
#[async_trait]
pub trait MergeRequestService: Send + Sync {
    /// Fetch a fresh snapshot of a merge request
    ///
    /// A [`MrRef::Global`] reference is resolved to its project first.
    async fn get_mr(&self, reference: &MrRef) -> Result<MergeRequest>;

    /// Ask GitLab to rebase the source branch onto the target branch
    ///
    /// Returns once the request is accepted; the rebase itself runs
    /// asynchronously and is observable through `rebase_in_progress`.
    async fn rebase_mr(&self, reference: &MrRef) -> Result<()>;

    /// Merge the merge request
    ///
    /// On failure the error carries GitLab's message so callers can tell
    /// whether a rebase is required.
    async fn merge_mr(&self, reference: &MrRef) -> Result<()>;

    /// Count jobs of a pipeline by status
    async fn pipeline_job_stats(&self, project: &str, pipeline_id: u64) -> Result<JobStats>;

    /// List open merge requests visible to the token owner
    async fn list_mrs(&self, query: &ListQuery) -> Result<Vec<MergeRequest>>;

    /// Open a merge request in `project` (numeric id or full path)
    async fn create_mr(&self, project: &str, request: &NewMergeRequest) -> Result<MergeRequest>;
}
