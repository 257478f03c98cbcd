//! Merge command - drive an MR through rebase and merge

use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, hyperlink, merge_status};
use anstream::println;
use dialoguer::Confirm;
use glmr::error::{Error, Result};
use glmr::merge::{MergeOptions, MergeOrchestrator};
use glmr::progress::ProgressReporter;
use glmr::types::{MergeRequest, MrRef};
use std::path::Path;
use std::time::Duration;

/// Options for the merge command
///
/// `None` falls back to the config value.
#[derive(Debug, Clone, Default)]
pub struct MergeCommandOptions {
    /// Rebase automatically when GitLab asks for it
    pub auto_rebase: bool,
    /// Maximum rebase attempts
    pub max_retries: Option<u32>,
    /// Overall time budget
    pub timeout: Option<Duration>,
    /// Delay between polls
    pub poll_interval: Option<Duration>,
    /// Preview the MR and prompt for confirmation before merging
    pub confirm: bool,
}

/// Run the merge command
pub async fn run_merge(
    config_path: Option<&Path>,
    reference: &MrRef,
    options: MergeCommandOptions,
) -> Result<()> {
    let ctx = CommandContext::new(config_path)?;
    let merge_options = resolve_options(&ctx, &options)?;

    if options.confirm {
        let mr = ctx.service.get_mr(reference).await?;
        print_merge_preview(&mr, &merge_options);
        if !Confirm::new()
            .with_prompt("Proceed with merge?")
            .default(true)
            .interact()
            .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))?
        {
            println!("{}", "Aborted".muted());
            return Ok(());
        }
        println!();
    }

    let progress = ProgressReporter::stdout();
    let orchestrator = MergeOrchestrator::new(ctx.service.clone(), &progress, merge_options);
    orchestrator.run(reference).await?;

    Ok(())
}

fn resolve_options(ctx: &CommandContext, options: &MergeCommandOptions) -> Result<MergeOptions> {
    let defaults = ctx.config.merge_options()?;
    Ok(MergeOptions {
        auto_rebase: options.auto_rebase,
        max_retries: options.max_retries.unwrap_or(defaults.max_retries),
        timeout: options.timeout.unwrap_or(defaults.timeout),
        poll_interval: options.poll_interval.unwrap_or(defaults.poll_interval),
    })
}

/// Show what is about to be merged
fn print_merge_preview(mr: &MergeRequest, options: &MergeOptions) {
    println!(
        "{} {}",
        format!("MR !{}:", mr.iid).emphasis(),
        mr.title
    );
    println!(
        "  {} → {}",
        mr.source_branch.accent(),
        mr.target_branch.accent()
    );
    println!("  Status: {}", merge_status(&mr.detailed_merge_status));
    if let Some(pipeline) = &mr.head_pipeline {
        println!("  Pipeline: {}", pipeline.status.to_string().muted());
    }
    println!("  {}", hyperlink(&mr.web_url, &mr.web_url));
    println!();

    if options.auto_rebase {
        println!(
            "{}",
            format!(
                "Auto-rebase enabled (up to {} attempt(s))",
                options.max_retries
            )
            .muted()
        );
    }
}
