//! Shared command context for CLI commands
//!
//! Extracts common setup code shared by the `mr` subcommands.

use glmr::auth::get_gitlab_auth;
use glmr::config::{Config, load_config};
use glmr::error::Result;
use glmr::platform::{GitLabService, MergeRequestService};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Shared context for CLI commands that talk to GitLab
///
/// This struct encapsulates the common setup:
/// - Loading config (file + environment)
/// - Resolving the token
/// - Validating the instance URL and creating the service
pub struct CommandContext {
    /// Effective configuration
    pub config: Config,
    /// GitLab service
    pub service: Arc<dyn MergeRequestService>,
}

impl CommandContext {
    /// Create a new command context
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config(config_path)?;
        let gitlab_url = config.gitlab_url()?;
        let auth = get_gitlab_auth(&config)?;

        debug!(url = %gitlab_url, source = ?auth.source, "connecting to GitLab");
        let service = GitLabService::new(gitlab_url.as_str(), auth.token)?;

        Ok(Self {
            config,
            service: Arc::new(service),
        })
    }
}
