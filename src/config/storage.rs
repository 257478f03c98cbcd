//! Loading `config.toml` and applying environment overrides.

use super::Config;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name for glmr within the platform config directory.
const GLMR_DIR: &str = "glmr";

/// Filename for the config file.
const CONFIG_FILE: &str = "config.toml";

/// Environment variables that override config keys.
const ENV_GITLAB_URL: &str = "GITLAB_URL";
const ENV_MAX_RETRIES: &str = "GLMR_MAX_RETRIES";
const ENV_TIMEOUT: &str = "GLMR_TIMEOUT";
const ENV_POLL_INTERVAL: &str = "GLMR_POLL_INTERVAL";

/// Get path to the default config file.
///
/// `~/.config/glmr/config.toml` on Linux, the platform equivalent elsewhere.
/// `None` when the platform has no config directory.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(GLMR_DIR).join(CONFIG_FILE))
}

/// Load config from `path` (or the default location) and the process
/// environment.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load config with a custom environment lookup.
///
/// An explicitly given file must exist. A missing default file means
/// defaults.
pub fn load_config_with_env(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Config> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => match config_path() {
            Some(path) if path.exists() => read_config(&path)?,
            _ => {
                debug!("no config file, using defaults");
                Config::default()
            }
        },
    };

    apply_env(&mut config, env)?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;

    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

fn apply_env(config: &mut Config, env: impl Fn(&str) -> Option<String>) -> Result<()> {
    let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = lookup(ENV_GITLAB_URL) {
        config.gitlab_url = Some(url);
    }
    if let Some(retries) = lookup(ENV_MAX_RETRIES) {
        config.max_retries = retries.trim().parse().map_err(|_| {
            Error::Config(format!("{ENV_MAX_RETRIES} must be a number, got '{retries}'"))
        })?;
    }
    if let Some(timeout) = lookup(ENV_TIMEOUT) {
        config.timeout = timeout;
    }
    if let Some(interval) = lookup(ENV_POLL_INTERVAL) {
        config.poll_interval = interval;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_config_path() {
        if let Some(path) = config_path() {
            assert!(path.ends_with("glmr/config.toml"));
        }
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"
            gitlab_url = "https://gitlab.example.com"
            gitlab_token = "glpat-file"
            max_retries = 5
            poll_interval = "2s"
            "#,
        );

        let config = load_config_with_env(Some(&path), no_env).unwrap();
        assert_eq!(
            config.gitlab_url.as_deref(),
            Some("https://gitlab.example.com")
        );
        assert_eq!(config.gitlab_token.as_deref(), Some("glpat-file"));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.poll_interval().unwrap(), Duration::from_secs(2));
        assert_eq!(config.timeout().unwrap(), Duration::from_secs(300));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.toml");
        let err = load_config_with_env(Some(&path), no_env).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("absent.toml")));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "max_retries = \"many\"");
        assert!(matches!(
            load_config_with_env(Some(&path), no_env),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"
            gitlab_url = "https://file.example.com"
            max_retries = 1
            timeout = "1m"
            "#,
        );
        let env: HashMap<&str, &str> = [
            ("GITLAB_URL", "https://env.example.com"),
            ("GLMR_MAX_RETRIES", "7"),
            ("GLMR_TIMEOUT", "90s"),
            ("GLMR_POLL_INTERVAL", ""),
        ]
        .into_iter()
        .collect();

        let config =
            load_config_with_env(Some(&path), |k| env.get(k).map(ToString::to_string)).unwrap();
        assert_eq!(config.gitlab_url.as_deref(), Some("https://env.example.com"));
        assert_eq!(config.max_retries, 7);
        assert_eq!(config.timeout().unwrap(), Duration::from_secs(90));
        // Empty values are ignored
        assert_eq!(config.poll_interval().unwrap(), Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_env_retries() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "");
        let err = load_config_with_env(Some(&path), |k| {
            (k == "GLMR_MAX_RETRIES").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("GLMR_MAX_RETRIES"));
    }
}
