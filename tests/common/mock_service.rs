//! Scripted merge request service for orchestration tests

use async_trait::async_trait;
use glmr::error::{Error, Result};
use glmr::platform::MergeRequestService;
use glmr::types::{JobStats, ListQuery, MergeRequest, MrRef, NewMergeRequest};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted mock merge request service
///
/// `get_mr` hands out the scripted snapshots in order. The last one repeats
/// once the script runs out, so a steady state needs only one entry.
///
/// Features:
/// - Scripted snapshot sequences
/// - Scripted merge failures
/// - Call tracking for verification
/// - Error injection for failure path testing
///
/// Listing and creation are not scripted: `list_mrs` returns nothing and
/// `create_mr` fails.
pub struct MockMergeRequestService {
    snapshots: Mutex<VecDeque<MergeRequest>>,
    last_snapshot: Mutex<Option<MergeRequest>>,
    merge_failures: Mutex<VecDeque<String>>,
    job_stats: Mutex<JobStats>,
    // Call tracking
    get_mr_calls: Mutex<Vec<MrRef>>,
    rebase_calls: Mutex<Vec<MrRef>>,
    merge_calls: Mutex<Vec<MrRef>>,
    job_stats_calls: Mutex<Vec<(String, u64)>>,
    // Error injection
    error_on_get_mr: Mutex<Option<String>>,
    error_on_rebase: Mutex<Option<String>>,
    error_on_job_stats: Mutex<Option<String>>,
}

impl MockMergeRequestService {
    /// Create a mock that serves `snapshots` in order
    pub fn with_snapshots(snapshots: impl IntoIterator<Item = MergeRequest>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots.into_iter().collect()),
            last_snapshot: Mutex::new(None),
            merge_failures: Mutex::new(VecDeque::new()),
            job_stats: Mutex::new(JobStats::default()),
            get_mr_calls: Mutex::new(Vec::new()),
            rebase_calls: Mutex::new(Vec::new()),
            merge_calls: Mutex::new(Vec::new()),
            job_stats_calls: Mutex::new(Vec::new()),
            error_on_get_mr: Mutex::new(None),
            error_on_rebase: Mutex::new(None),
            error_on_job_stats: Mutex::new(None),
        }
    }

    // === Scripting methods ===

    /// Make the next `merge_mr` call fail with GitLab's `message`
    ///
    /// Failures queue up; each merge attempt consumes one.
    pub fn fail_next_merge(&self, message: &str) {
        self.merge_failures
            .lock()
            .unwrap()
            .push_back(message.to_string());
    }

    /// Set the job counts returned by `pipeline_job_stats`
    pub fn set_job_stats(&self, stats: JobStats) {
        *self.job_stats.lock().unwrap() = stats;
    }

    // === Error injection methods ===

    /// Make `get_mr` return an error
    pub fn fail_get_mr(&self, msg: &str) {
        *self.error_on_get_mr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `rebase_mr` return an error
    pub fn fail_rebase(&self, msg: &str) {
        *self.error_on_rebase.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `pipeline_job_stats` return an error
    pub fn fail_job_stats(&self, msg: &str) {
        *self.error_on_job_stats.lock().unwrap() = Some(msg.to_string());
    }

    // === Call verification methods ===

    /// Get all references `get_mr` was called with
    pub fn get_mr_calls(&self) -> Vec<MrRef> {
        self.get_mr_calls.lock().unwrap().clone()
    }

    /// Get all `rebase_mr` calls
    pub fn rebase_calls(&self) -> Vec<MrRef> {
        self.rebase_calls.lock().unwrap().clone()
    }

    /// Get all `merge_mr` calls
    pub fn merge_calls(&self) -> Vec<MrRef> {
        self.merge_calls.lock().unwrap().clone()
    }

    /// Get all `pipeline_job_stats` calls
    pub fn job_stats_calls(&self) -> Vec<(String, u64)> {
        self.job_stats_calls.lock().unwrap().clone()
    }

    /// Assert that `merge_mr` was never called
    pub fn assert_merge_not_called(&self) {
        let calls = self.merge_calls();
        assert!(
            calls.is_empty(),
            "Expected merge_mr NOT to be called but it was: {calls:?}"
        );
    }

    /// Assert the number of rebase triggers
    pub fn assert_rebase_count(&self, expected: usize) {
        let calls = self.rebase_calls();
        assert_eq!(
            calls.len(),
            expected,
            "Expected {expected} rebase_mr call(s) but got: {calls:?}"
        );
    }
}

#[async_trait]
impl MergeRequestService for MockMergeRequestService {
    async fn get_mr(&self, reference: &MrRef) -> Result<MergeRequest> {
        self.get_mr_calls.lock().unwrap().push(reference.clone());

        if let Some(msg) = self.error_on_get_mr.lock().unwrap().as_ref() {
            return Err(Error::GitLabApi(msg.clone()));
        }

        let mut last = self.last_snapshot.lock().unwrap();
        if let Some(next) = self.snapshots.lock().unwrap().pop_front() {
            *last = Some(next);
        }
        last.clone()
            .ok_or_else(|| Error::NotFound(reference.to_string()))
    }

    async fn rebase_mr(&self, reference: &MrRef) -> Result<()> {
        self.rebase_calls.lock().unwrap().push(reference.clone());

        if let Some(msg) = self.error_on_rebase.lock().unwrap().as_ref() {
            return Err(Error::GitLabApi(format!("triggering rebase: {msg}")));
        }
        Ok(())
    }

    async fn merge_mr(&self, reference: &MrRef) -> Result<()> {
        self.merge_calls.lock().unwrap().push(reference.clone());

        if let Some(msg) = self.merge_failures.lock().unwrap().pop_front() {
            return Err(Error::GitLabApi(format!("merging MR: 405 Method Not Allowed: {msg}")));
        }
        Ok(())
    }

    async fn pipeline_job_stats(&self, project: &str, pipeline_id: u64) -> Result<JobStats> {
        self.job_stats_calls
            .lock()
            .unwrap()
            .push((project.to_string(), pipeline_id));

        if let Some(msg) = self.error_on_job_stats.lock().unwrap().as_ref() {
            return Err(Error::GitLabApi(msg.clone()));
        }
        Ok(*self.job_stats.lock().unwrap())
    }

    async fn list_mrs(&self, _query: &ListQuery) -> Result<Vec<MergeRequest>> {
        Ok(Vec::new())
    }

    async fn create_mr(&self, project: &str, _request: &NewMergeRequest) -> Result<MergeRequest> {
        Err(Error::Internal(format!(
            "create_mr is not scripted (project {project})"
        )))
    }
}
