//! Authentication for GitLab
//!
//! Supports the `GITLAB_TOKEN` environment variable and the config file.

use crate::config::Config;
use crate::error::{Error, Result};
use tracing::debug;

/// Environment variable holding a GitLab personal access token
pub const GITLAB_TOKEN_VAR: &str = "GITLAB_TOKEN";

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from environment variable
    EnvVar,
    /// Token from the config file
    ConfigFile,
}

/// Resolved GitLab credentials
#[derive(Clone)]
pub struct GitLabAuth {
    /// Personal access token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
}

impl std::fmt::Debug for GitLabAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabAuth")
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Get GitLab authentication from the environment or config
pub fn get_gitlab_auth(config: &Config) -> Result<GitLabAuth> {
    resolve_gitlab_auth(config, std::env::var(GITLAB_TOKEN_VAR).ok())
}

/// Pick a token, preferring `env_token` over the config file
pub fn resolve_gitlab_auth(config: &Config, env_token: Option<String>) -> Result<GitLabAuth> {
    let non_empty = |t: &String| !t.trim().is_empty();

    let auth = if let Some(token) = env_token.filter(non_empty) {
        GitLabAuth {
            token: token.trim().to_string(),
            source: AuthSource::EnvVar,
        }
    } else if let Some(token) = config.gitlab_token.clone().filter(non_empty) {
        GitLabAuth {
            token: token.trim().to_string(),
            source: AuthSource::ConfigFile,
        }
    } else {
        return Err(Error::Auth(format!(
            "no GitLab token found. Set {GITLAB_TOKEN_VAR} or gitlab_token in the config file"
        )));
    };

    debug!(source = ?auth.source, "resolved GitLab token");
    Ok(auth)
}
