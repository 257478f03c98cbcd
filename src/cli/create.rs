//! Create command - open a new MR

use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check, hyperlink};
use anstream::println;
use glmr::error::{Error, Result};
use glmr::types::NewMergeRequest;
use std::path::Path;

/// Run the create command
pub async fn run_create(
    config_path: Option<&Path>,
    project: &str,
    request: &NewMergeRequest,
    json: bool,
) -> Result<()> {
    let ctx = CommandContext::new(config_path)?;
    let mr = ctx.service.create_mr(project, request).await?;

    if json {
        let out = serde_json::to_string_pretty(&mr)
            .map_err(|e| Error::Internal(format!("failed to serialize MR: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    println!(
        "{} Created MR !{}: {}",
        check(),
        mr.iid,
        mr.title.emphasis()
    );
    println!("URL: {}", hyperlink(&mr.web_url, &mr.web_url));
    Ok(())
}
