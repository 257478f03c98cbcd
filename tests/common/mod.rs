//! Shared test utilities

#![allow(dead_code)]

mod mock_service;

pub use mock_service::MockMergeRequestService;

use glmr::progress::ProgressReporter;
use glmr::types::{MergeRequest, MergeStatus, Pipeline, PipelineStatus};
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Web URL used by every fixture MR
pub const MR_URL: &str = "https://gitlab.example.com/team/api/-/merge_requests/7";

/// Web URL used by every fixture pipeline
pub const PIPELINE_URL: &str = "https://gitlab.example.com/team/api/-/pipelines/900";

/// Build an MR snapshot with the given `detailed_merge_status`
pub fn make_mr(status: &str) -> MergeRequest {
    MergeRequest {
        id: 1001,
        iid: 7,
        project_id: 42,
        title: "Add retry budget".to_string(),
        state: "opened".to_string(),
        source_branch: "feat/retry".to_string(),
        target_branch: "main".to_string(),
        author: Some("Sam Doe".to_string()),
        web_url: MR_URL.to_string(),
        detailed_merge_status: MergeStatus::from(status),
        rebase_in_progress: false,
        merge_error: None,
        head_pipeline: None,
    }
}

/// Snapshot with a head pipeline in `pipeline_status`
pub fn make_mr_with_pipeline(status: &str, pipeline_status: &str) -> MergeRequest {
    MergeRequest {
        head_pipeline: Some(Pipeline {
            id: 900,
            status: PipelineStatus::from(pipeline_status.to_string()),
            web_url: Some(PIPELINE_URL.to_string()),
        }),
        ..make_mr(status)
    }
}

/// Snapshot of an MR whose rebase is still running
pub fn make_rebasing_mr(status: &str) -> MergeRequest {
    MergeRequest {
        rebase_in_progress: true,
        ..make_mr(status)
    }
}

/// Snapshot left behind by a failed rebase
pub fn make_failed_rebase_mr(message: &str) -> MergeRequest {
    MergeRequest {
        merge_error: Some(message.to_string()),
        ..make_mr("need_rebase")
    }
}

/// In-memory writer shared with a `ProgressReporter`
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Everything written so far
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    /// Written text with erase sequences and partial animation frames
    /// stripped, i.e. only the durable lines
    pub fn durable_lines(&self) -> Vec<String> {
        self.contents()
            .split('\n')
            .map(|line| line.rsplit("\r\x1b[K").next().unwrap_or_default().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Reporter writing into a buffer the test can inspect
pub fn capture_progress() -> (ProgressReporter, SharedBuffer) {
    let buf = SharedBuffer::default();
    (ProgressReporter::with_writer(buf.clone()), buf)
}
