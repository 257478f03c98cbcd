//! Show command - print one MR

use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, hyperlink, merge_status};
use anstream::println;
use glmr::error::{Error, Result};
use glmr::types::{MergeRequest, MrRef};
use std::path::Path;

/// Run the show command
pub async fn run_show(config_path: Option<&Path>, reference: &MrRef, json: bool) -> Result<()> {
    let ctx = CommandContext::new(config_path)?;
    let mr = ctx.service.get_mr(reference).await?;

    if json {
        let out = serde_json::to_string_pretty(&mr)
            .map_err(|e| Error::Internal(format!("failed to serialize MR: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    print_mr(&mr);
    Ok(())
}

fn print_mr(mr: &MergeRequest) {
    println!(
        "{} {}",
        format!("MR !{}:", mr.iid).emphasis(),
        mr.title.emphasis()
    );
    println!();
    println!("  {:<10} {}", "Project:", mr.project_id);
    println!("  {:<10} {}", "State:", mr.state);
    if let Some(author) = &mr.author {
        println!("  {:<10} {}", "Author:", author);
    }
    println!(
        "  {:<10} {} → {}",
        "Branches:",
        mr.source_branch.accent(),
        mr.target_branch.accent()
    );
    println!(
        "  {:<10} {}",
        "Status:",
        merge_status(&mr.detailed_merge_status)
    );
    if mr.rebase_in_progress {
        println!("  {:<10} {}", "Rebase:", "in progress".warn());
    }
    if let Some(pipeline) = &mr.head_pipeline {
        let status = if pipeline.status.is_broken() {
            pipeline.status.to_string().failure()
        } else {
            pipeline.status.to_string().muted()
        };
        println!("  {:<10} #{} {}", "Pipeline:", pipeline.id, status);
    }
    if let Some(error) = &mr.merge_error {
        println!("  {:<10} {}", "Error:", error.failure());
    }
    println!("  {:<10} {}", "URL:", hyperlink(&mr.web_url, &mr.web_url));
}
