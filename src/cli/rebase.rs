//! Rebase command - rebase an MR's source branch onto its target

use crate::cli::context::CommandContext;
use glmr::error::Result;
use glmr::merge::{Deadline, wait_for_rebase};
use glmr::progress::ProgressReporter;
use glmr::types::MrRef;
use std::path::Path;

/// Options for the rebase command
#[derive(Debug, Clone, Copy, Default)]
pub struct RebaseOptions {
    /// Return once GitLab accepted the rebase
    pub no_wait: bool,
}

/// Run the rebase command
pub async fn run_rebase(
    config_path: Option<&Path>,
    reference: &MrRef,
    options: RebaseOptions,
) -> Result<()> {
    let ctx = CommandContext::new(config_path)?;
    let progress = ProgressReporter::stdout();

    let result = rebase(&ctx, &progress, reference, options).await;
    if let Err(e) = &result {
        progress.error(&e.to_string());
    }
    result
}

async fn rebase(
    ctx: &CommandContext,
    progress: &ProgressReporter,
    reference: &MrRef,
    options: RebaseOptions,
) -> Result<()> {
    let poll_interval = ctx.config.poll_interval()?;
    let deadline = Deadline::after(ctx.config.timeout()?);

    let mr = ctx.service.get_mr(reference).await?;
    progress.header(&format!("MR !{}: {}", mr.iid, mr.title));
    progress.action("Triggering rebase...");

    let reference = mr.reference();
    ctx.service.rebase_mr(&reference).await?;

    if options.no_wait {
        progress.action("Rebase triggered (not waiting for completion)");
        return Ok(());
    }

    let mr = wait_for_rebase(
        ctx.service.as_ref(),
        progress,
        &reference,
        poll_interval,
        &deadline,
    )
    .await?;

    progress.success(&format!("Rebase complete ({})", progress.total_time()));
    progress.status(mr.detailed_merge_status.as_str());
    Ok(())
}
