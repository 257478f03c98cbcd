//! Error types for glmr

use crate::progress::format_duration;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by glmr
#[derive(Debug, Error)]
pub enum Error {
    /// GitLab answered with a non-success status
    #[error("GitLab API error: {0}")]
    GitLabApi(String),

    /// Request could not be sent or the response could not be decoded
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration could not be loaded or is invalid
    #[error("config error: {0}")]
    Config(String),

    /// No usable token was found
    #[error("auth error: {0}")]
    Auth(String),

    /// Merge request reference could not be parsed
    #[error("invalid merge request reference: {0}")]
    InvalidReference(String),

    /// Merge request does not exist (or is not visible)
    #[error("merge request {0} not found")]
    NotFound(String),

    /// MR needs a rebase and auto-rebase is disabled
    #[error("MR needs rebase. Run with --auto-rebase or: glmr mr rebase {reference}")]
    NeedsRebase {
        /// Reference to hand to `glmr mr rebase`
        reference: String,
    },

    /// Rebase finished but GitLab reported a merge error
    #[error("rebase failed: {0}")]
    RebaseFailed(String),

    /// MR has conflicts that must be resolved by a human
    #[error("cannot merge: conflicts detected\nResolve manually: {url}")]
    Conflict {
        /// Web URL of the MR
        url: String,
    },

    /// Head pipeline failed or was canceled
    #[error("pipeline {status}, cannot merge\nSee: {url}")]
    PipelineFailed {
        /// Pipeline status as reported by GitLab
        status: String,
        /// Pipeline (or MR) web URL
        url: String,
    },

    /// Every allowed rebase attempt was used
    #[error("max retries exceeded ({0})")]
    MaxRetriesExceeded(u32),

    /// Orchestration deadline passed
    #[error("timeout exceeded ({})", format_duration(*.0))]
    TimedOut(Duration),

    /// GitLab reported a merge status outside the recognized set
    #[error("unexpected merge status: {0}")]
    UnexpectedStatus(String),

    /// Internal error
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Whether the error text asks for a rebase.
    ///
    /// GitLab has no structured error kind for this, so the merge endpoint's
    /// message is matched case-insensitively.
    pub fn mentions_rebase(&self) -> bool {
        self.to_string().to_lowercase().contains("rebase")
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
