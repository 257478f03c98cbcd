//! Core types for glmr

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a merge request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MrRef {
    /// Instance-wide merge request id
    Global(u64),
    /// Project-scoped reference: project id or `group/project` path plus IID
    Project {
        /// Numeric project id or full project path
        project: String,
        /// Project-scoped merge request number
        iid: u64,
    },
}

impl MrRef {
    /// Build a project-scoped reference from a numeric project id
    pub fn project(project_id: u64, iid: u64) -> Self {
        Self::Project {
            project: project_id.to_string(),
            iid,
        }
    }
}

impl fmt::Display for MrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global(id) => write!(f, "{id}"),
            Self::Project { project, iid } => write!(f, "{project}!{iid}"),
        }
    }
}

/// GitLab's `detailed_merge_status`
///
/// Only the values the merge engine acts on get their own variant. Anything
/// else GitLab sends is kept verbatim in `Other` so it can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MergeStatus {
    /// Ready to merge
    Mergeable,
    /// Legacy spelling of `Mergeable`
    CanBeMerged,
    /// Source branch is behind the target and must be rebased
    NeedRebase,
    /// GitLab wants the mergeability recomputed (treated as needing a rebase)
    CannotBeMergedRecheck,
    /// Merge conflicts
    Conflict,
    /// Legacy spelling of `Conflict`
    CannotBeMerged,
    /// Mergeability is being computed
    Checking,
    /// Mergeability has not been computed yet
    Unchecked,
    /// Pipeline has not finished
    CiStillRunning,
    /// Any other value
    Other(String),
}

/// Coarse grouping of [`MergeStatus`] values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Merge can be attempted
    Mergeable,
    /// A rebase is required first
    NeedsRebase,
    /// Human intervention required
    Conflict,
    /// Remote is still working; the pipeline may know more
    InProgress,
    /// Unrecognized status
    Unexpected,
}

impl MergeStatus {
    /// Wire value as sent by GitLab
    pub fn as_str(&self) -> &str {
        match self {
            Self::Mergeable => "mergeable",
            Self::CanBeMerged => "can_be_merged",
            Self::NeedRebase => "need_rebase",
            Self::CannotBeMergedRecheck => "cannot_be_merged_recheck",
            Self::Conflict => "conflict",
            Self::CannotBeMerged => "cannot_be_merged",
            Self::Checking => "checking",
            Self::Unchecked => "unchecked",
            Self::CiStillRunning => "ci_still_running",
            Self::Other(s) => s,
        }
    }

    /// Group the status for the merge engine
    pub const fn class(&self) -> StatusClass {
        match self {
            Self::Mergeable | Self::CanBeMerged => StatusClass::Mergeable,
            Self::NeedRebase | Self::CannotBeMergedRecheck => StatusClass::NeedsRebase,
            Self::Conflict | Self::CannotBeMerged => StatusClass::Conflict,
            Self::Checking | Self::Unchecked | Self::CiStillRunning => StatusClass::InProgress,
            Self::Other(_) => StatusClass::Unexpected,
        }
    }
}

impl From<&str> for MergeStatus {
    fn from(s: &str) -> Self {
        match s {
            "mergeable" => Self::Mergeable,
            "can_be_merged" => Self::CanBeMerged,
            "need_rebase" => Self::NeedRebase,
            "cannot_be_merged_recheck" => Self::CannotBeMergedRecheck,
            "conflict" => Self::Conflict,
            "cannot_be_merged" => Self::CannotBeMerged,
            "checking" => Self::Checking,
            "unchecked" => Self::Unchecked,
            "ci_still_running" => Self::CiStillRunning,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for MergeStatus {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<MergeStatus> for String {
    fn from(status: MergeStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for MergeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PipelineStatus {
    /// All jobs passed
    Success,
    /// At least one job failed
    Failed,
    /// Pipeline was canceled
    Canceled,
    /// Jobs are running
    Running,
    /// Jobs are queued
    Pending,
    /// Any other value (`created`, `manual`, `scheduled`, ...)
    Other(String),
}

impl PipelineStatus {
    /// Wire value as sent by GitLab
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Running => "running",
            Self::Pending => "pending",
            Self::Other(s) => s,
        }
    }

    /// Whether the pipeline finished without success
    pub const fn is_broken(&self) -> bool {
        matches!(self, Self::Failed | Self::Canceled)
    }
}

impl From<String> for PipelineStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "success" => Self::Success,
            "failed" => Self::Failed,
            "canceled" => Self::Canceled,
            "running" => Self::Running,
            "pending" => Self::Pending,
            _ => Self::Other(s),
        }
    }
}

impl From<PipelineStatus> for String {
    fn from(status: PipelineStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Head pipeline of a merge request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline id
    pub id: u64,
    /// Current status
    pub status: PipelineStatus,
    /// Web URL for the pipeline
    pub web_url: Option<String>,
}

/// Job counts for a pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    /// Jobs that succeeded
    pub passed: u32,
    /// Jobs currently running
    pub running: u32,
    /// Jobs waiting to run (`pending` or `created`)
    pub pending: u32,
    /// Jobs that failed
    pub failed: u32,
}

impl JobStats {
    /// Tally job statuses
    pub fn from_statuses<'a>(statuses: impl IntoIterator<Item = &'a str>) -> Self {
        let mut stats = Self::default();
        for status in statuses {
            match status {
                "success" => stats.passed += 1,
                "running" => stats.running += 1,
                "pending" | "created" => stats.pending += 1,
                "failed" => stats.failed += 1,
                _ => {}
            }
        }
        stats
    }
}

impl fmt::Display for JobStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "✓ {} passed | ● {} running | ○ {} pending",
            self.passed, self.running, self.pending
        )
    }
}

/// One poll of a merge request
///
/// Snapshots are replaced on every poll, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequest {
    /// Instance-wide id
    pub id: u64,
    /// Project-scoped number
    pub iid: u64,
    /// Owning project
    pub project_id: u64,
    /// Title
    pub title: String,
    /// `opened`, `closed`, `merged`, `locked`
    pub state: String,
    /// Source branch name
    pub source_branch: String,
    /// Target branch name
    pub target_branch: String,
    /// Author display name
    pub author: Option<String>,
    /// Web URL for the MR
    pub web_url: String,
    /// Coarse mergeability classification
    pub detailed_merge_status: MergeStatus,
    /// Whether a rebase is running on the remote
    pub rebase_in_progress: bool,
    /// Error left behind by the last rebase or merge (never empty)
    pub merge_error: Option<String>,
    /// Pipeline for the head commit
    pub head_pipeline: Option<Pipeline>,
}

impl MergeRequest {
    /// Project-scoped reference to this MR
    pub fn reference(&self) -> MrRef {
        MrRef::project(self.project_id, self.iid)
    }
}

/// Fields for opening a merge request
///
/// Serialized as the body of GitLab's create endpoint. Optional fields and
/// unset flags are left out so GitLab applies the project defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct NewMergeRequest {
    /// Branch with the changes
    pub source_branch: String,
    /// Branch to merge into
    pub target_branch: String,
    /// Title
    pub title: String,
    /// Markdown description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Open as a draft
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub draft: bool,
    /// Squash commits on merge
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub squash: bool,
    /// Delete the source branch once merged
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub remove_source_branch: bool,
    /// Let members of the target project push to the source branch
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub allow_collaboration: bool,
}

/// Filters for listing merge requests
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Restrict to one project
    pub project_id: Option<u64>,
    /// Only MRs assigned to the token owner
    pub mine: bool,
    /// Only MRs with at least one approval
    pub approved: bool,
    /// Page size (GitLab caps at 100)
    pub per_page: Option<u32>,
}
