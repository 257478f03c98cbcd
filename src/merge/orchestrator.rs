//! Merge orchestration
//!
//! Drives one merge request to a terminal outcome. Each loop iteration:
//! 1. Check the deadline
//! 2. Poll a fresh snapshot and print its status when it changed
//! 3. Ask [`decide`] what to do and perform that effect
//!
//! Transport errors end the run immediately. Nothing is retried here except
//! rebases, and those only within the [`RetryPolicy`] budget.

use super::guard::{DEFAULT_MAX_RETRIES, Deadline, RetryPolicy};
use super::policy::{MergeDecision, decide};
use super::rebase::wait_for_rebase;
use crate::error::{Error, Result};
use crate::platform::MergeRequestService;
use crate::progress::{ProgressReporter, StatsProvider};
use crate::types::{MergeRequest, MergeStatus, MrRef};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::debug;

/// Default overall time budget for a merge run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default delay between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Label of the waiting line shown while CI runs
pub const CI_WAIT_LABEL: &str = "Waiting for CI";

/// Behavior flags for a merge run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Rebase automatically when GitLab asks for it
    pub auto_rebase: bool,
    /// Maximum rebase attempts
    pub max_retries: u32,
    /// Overall time budget
    pub timeout: Duration,
    /// Delay between polls
    pub poll_interval: Duration,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            auto_rebase: false,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Outcome of a successful merge run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Project-scoped number of the merged MR
    pub iid: u64,
    /// Rebases triggered during the run
    pub rebase_attempts: u32,
    /// Wall time of the run, formatted
    pub total_time: String,
}

/// Live job counts for the CI waiting line
struct PipelineStats {
    service: Arc<dyn MergeRequestService>,
    project: String,
    pipeline_id: u64,
}

#[async_trait]
impl StatsProvider for PipelineStats {
    async fn stats(&self) -> Option<String> {
        match self
            .service
            .pipeline_job_stats(&self.project, self.pipeline_id)
            .await
        {
            Ok(stats) => Some(stats.to_string()),
            Err(e) => {
                debug!(pipeline_id = self.pipeline_id, "job stats unavailable: {e}");
                None
            }
        }
    }
}

/// State machine driving a single merge request
pub struct MergeOrchestrator<'a> {
    service: Arc<dyn MergeRequestService>,
    progress: &'a ProgressReporter,
    options: MergeOptions,
}

impl<'a> MergeOrchestrator<'a> {
    /// Create an orchestrator
    pub fn new(
        service: Arc<dyn MergeRequestService>,
        progress: &'a ProgressReporter,
        options: MergeOptions,
    ) -> Self {
        Self {
            service,
            progress,
            options,
        }
    }

    /// Merge `reference`, rebasing on demand if enabled
    ///
    /// Any failure is rendered as an error line before it is returned, and
    /// no waiting animation outlives the call.
    pub async fn run(&self, reference: &MrRef) -> Result<MergeReport> {
        let result = self.drive(reference).await;

        if let Err(e) = &result {
            self.progress.stop_wait().await;
            let message = e.to_string();
            self.progress.error(message.lines().next().unwrap_or_default());
        }
        result
    }

    async fn drive(&self, requested: &MrRef) -> Result<MergeReport> {
        let deadline = Deadline::after(self.options.timeout);
        let mut retries = RetryPolicy::new(self.options.max_retries);

        let initial = self.service.get_mr(requested).await?;
        self.progress
            .header(&format!("MR !{}: {}", initial.iid, initial.title));

        // Later polls skip global id resolution
        let reference = initial.reference();
        let mut last_status: Option<MergeStatus> = None;
        let mut stats_pipeline: Option<u64> = None;

        loop {
            if deadline.is_expired() {
                debug!(mr_iid = initial.iid, "deadline exceeded");
                return Err(Error::TimedOut(deadline.timeout()));
            }

            let mr = self.service.get_mr(&reference).await?;
            if last_status.as_ref() != Some(&mr.detailed_merge_status) {
                self.progress.stop_wait().await;
                self.progress.status(mr.detailed_merge_status.as_str());
                last_status = Some(mr.detailed_merge_status.clone());
            }

            let decision = decide(&mr);
            debug!(
                mr_iid = mr.iid,
                status = %mr.detailed_merge_status,
                ?decision,
                "merge decision"
            );

            match decision {
                MergeDecision::Merge { .. } => {
                    self.progress.stop_wait().await;
                    self.progress.action("Merging...");

                    match self.service.merge_mr(&reference).await {
                        Ok(()) => {
                            let total_time = self.progress.total_time();
                            self.progress
                                .success(&format!("MR merged successfully ({total_time} total)"));
                            return Ok(MergeReport {
                                iid: mr.iid,
                                rebase_attempts: retries.attempt(),
                                total_time,
                            });
                        }
                        Err(e) if self.options.auto_rebase && e.mentions_rebase() => {
                            debug!(mr_iid = mr.iid, "merge rejected, rebase required: {e}");
                            self.progress.action("Merge failed, needs rebase");
                            time::sleep(self.options.poll_interval).await;
                        }
                        Err(e) => return Err(e),
                    }
                }

                MergeDecision::Rebase => {
                    self.progress.stop_wait().await;
                    if !self.options.auto_rebase {
                        return Err(Error::NeedsRebase {
                            reference: requested.to_string(),
                        });
                    }

                    let Some(attempt) = retries.record_attempt() else {
                        return Err(Error::MaxRetriesExceeded(retries.max()));
                    };
                    self.progress.action(&format!(
                        "Triggering rebase... (attempt {attempt}/{})",
                        retries.max()
                    ));
                    self.service.rebase_mr(&reference).await?;

                    wait_for_rebase(
                        self.service.as_ref(),
                        self.progress,
                        &reference,
                        self.options.poll_interval,
                        &deadline,
                    )
                    .await?;

                    self.progress.action("Rebase complete");
                    last_status = None;
                    self.progress.forget_status();
                }

                MergeDecision::Conflict => {
                    return Err(Error::Conflict { url: mr.web_url });
                }

                MergeDecision::PipelineBroken(status) => {
                    let url = pipeline_url(&mr);
                    return Err(Error::PipelineFailed {
                        status: status.to_string(),
                        url,
                    });
                }

                MergeDecision::Wait => {
                    // A running session keeps its provider, so restart it
                    // when the head pipeline changes
                    let pipeline_id = mr.head_pipeline.as_ref().map(|p| p.id);
                    if pipeline_id != stats_pipeline {
                        self.progress.stop_wait().await;
                        stats_pipeline = pipeline_id;
                    }
                    self.progress.start_wait(CI_WAIT_LABEL, self.stats_for(&mr));
                    time::sleep(self.options.poll_interval).await;
                }

                MergeDecision::Unexpected(status) => {
                    return Err(Error::UnexpectedStatus(status));
                }
            }
        }
    }

    fn stats_for(&self, mr: &MergeRequest) -> Option<Arc<dyn StatsProvider>> {
        let pipeline = mr.head_pipeline.as_ref()?;
        Some(Arc::new(PipelineStats {
            service: Arc::clone(&self.service),
            project: mr.project_id.to_string(),
            pipeline_id: pipeline.id,
        }))
    }
}

fn pipeline_url(mr: &MergeRequest) -> String {
    mr.head_pipeline
        .as_ref()
        .and_then(|p| p.web_url.clone())
        .unwrap_or_else(|| mr.web_url.clone())
}
