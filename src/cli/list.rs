//! List command - open MRs visible to the token owner

use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check, merge_status, spinner_style};
use anstream::println;
use glmr::error::Result;
use glmr::types::ListQuery;
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Duration;

/// Run the list command
pub async fn run_list(config_path: Option<&Path>, query: ListQuery) -> Result<()> {
    let ctx = CommandContext::new(config_path)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message("Fetching merge requests...");
    spinner.enable_steady_tick(Duration::from_millis(80));

    let mrs = match ctx.service.list_mrs(&query).await {
        Ok(mrs) => mrs,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e);
        }
    };

    spinner.finish_with_message(format!("{} Found {} open MR(s)", check(), mrs.len()));

    if mrs.is_empty() {
        println!("{}", "No open merge requests.".muted());
        return Ok(());
    }

    println!();
    for mr in &mrs {
        println!(
            "{} {} {}",
            mr.reference().to_string().accent(),
            mr.title,
            format!("({} → {})", mr.source_branch, mr.target_branch).muted()
        );
        println!("    {}", merge_status(&mr.detailed_merge_status));
    }

    Ok(())
}
