//! Waiting for a remote rebase to finish

use super::guard::Deadline;
use crate::error::{Error, Result};
use crate::platform::MergeRequestService;
use crate::progress::ProgressReporter;
use crate::types::{MergeRequest, MrRef};
use std::time::Duration;
use tracing::debug;

/// Label of the waiting line shown while a rebase runs
pub const REBASE_WAIT_LABEL: &str = "Waiting for rebase";

/// Poll until GitLab reports the rebase finished
///
/// Shows the waiting animation for the duration and always stops it before
/// returning. The snapshot that ended the wait is returned, unless it
/// carries a merge error, which means the rebase failed.
pub async fn wait_for_rebase(
    service: &dyn MergeRequestService,
    progress: &ProgressReporter,
    reference: &MrRef,
    poll_interval: Duration,
    deadline: &Deadline,
) -> Result<MergeRequest> {
    progress.start_wait(REBASE_WAIT_LABEL, None);
    let polled = poll_until_rebased(service, reference, poll_interval, deadline).await;
    progress.stop_wait().await;

    let mr = polled?;
    if let Some(message) = mr.merge_error {
        return Err(Error::RebaseFailed(message));
    }
    Ok(mr)
}

async fn poll_until_rebased(
    service: &dyn MergeRequestService,
    reference: &MrRef,
    poll_interval: Duration,
    deadline: &Deadline,
) -> Result<MergeRequest> {
    loop {
        if deadline.is_expired() {
            return Err(Error::TimedOut(deadline.timeout()));
        }

        tokio::time::sleep(poll_interval).await;

        let mr = service.get_mr(reference).await?;
        debug!(
            mr_iid = mr.iid,
            rebase_in_progress = mr.rebase_in_progress,
            "polled rebase"
        );
        if !mr.rebase_in_progress {
            return Ok(mr);
        }
    }
}
