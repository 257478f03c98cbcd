//! Configuration for glmr
//!
//! Settings come from, lowest precedence first: built-in defaults, the TOML
//! config file, environment variables, then command-line flags (applied by
//! the CLI).

mod storage;

pub use storage::{config_path, load_config, load_config_with_env};

use crate::error::{Error, Result};
use crate::merge::{DEFAULT_MAX_RETRIES, MergeOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Contents of `config.toml`
///
/// Durations stay as strings here and are parsed by [`Config::timeout`] and
/// [`Config::poll_interval`], so a bad value is reported with its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Instance root, e.g. `https://gitlab.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab_url: Option<String>,

    /// Personal access token (`GITLAB_TOKEN` takes precedence)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab_token: Option<String>,

    /// Maximum rebase attempts per merge
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Overall merge time budget, e.g. `5m`
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Delay between polls, e.g. `5s`
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,
}

const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_timeout() -> String {
    "5m".to_string()
}

fn default_poll_interval() -> String {
    "5s".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gitlab_url: None,
            gitlab_token: None,
            max_retries: default_max_retries(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

impl Config {
    /// Parsed `timeout`
    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(&self.timeout)
            .map_err(|e| Error::Config(format!("invalid timeout: {e}")))
    }

    /// Parsed `poll_interval`
    pub fn poll_interval(&self) -> Result<Duration> {
        let interval = parse_duration(&self.poll_interval)
            .map_err(|e| Error::Config(format!("invalid poll_interval: {e}")))?;
        if interval.is_zero() {
            return Err(Error::Config("poll_interval must be positive".to_string()));
        }
        Ok(interval)
    }

    /// Validated `gitlab_url`
    pub fn gitlab_url(&self) -> Result<Url> {
        let raw = self
            .gitlab_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                Error::Config("gitlab_url is required (set it in config or GITLAB_URL)".to_string())
            })?;

        let url = Url::parse(raw.trim())
            .map_err(|e| Error::Config(format!("invalid gitlab_url '{raw}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "gitlab_url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        Ok(url)
    }

    /// Merge options derived from this config
    pub fn merge_options(&self) -> Result<MergeOptions> {
        Ok(MergeOptions {
            auto_rebase: false,
            max_retries: self.max_retries,
            timeout: self.timeout()?,
            poll_interval: self.poll_interval()?,
        })
    }
}

/// Parse a duration such as `500ms`, `5s`, `5m`, `2h` or `1m30s`
///
/// Units may be combined in any order; a bare number is rejected.
pub fn parse_duration(input: &str) -> std::result::Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total = Duration::ZERO;
    let mut rest = input;

    while !rest.is_empty() {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(format!("expected a number in '{input}'"));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|_| format!("number too large in '{input}'"))?;
        rest = &rest[digits..];

        let unit_len = rest.bytes().take_while(u8::is_ascii_alphabetic).count();
        let too_large = || format!("duration too large in '{input}'");
        let part = match &rest[..unit_len] {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.checked_mul(60).ok_or_else(too_large)?),
            "h" => Duration::from_secs(value.checked_mul(3600).ok_or_else(too_large)?),
            "" => return Err(format!("missing unit in '{input}' (use ms, s, m or h)")),
            unit => return Err(format!("unknown unit '{unit}' in '{input}'")),
        };
        rest = &rest[unit_len..];
        total = total.checked_add(part).ok_or_else(too_large)?;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("5s"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_duration("5m"), Ok(Duration::from_secs(300)));
        assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(7200)));
        assert_eq!(parse_duration(" 1m30s "), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("1h1m1s500ms"), Ok(Duration::from_millis(3_661_500)));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for bad in ["", "5", "m", "5x", "1m30", "-5s", "5 s"] {
            assert!(parse_duration(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_parse_duration_rejects_overflow() {
        let err = parse_duration("99999999999999999h").unwrap_err();
        assert!(err.contains("too large"), "{err}");

        let err = parse_duration("18446744073709551615s1s").unwrap_err();
        assert!(err.contains("too large"), "{err}");
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.timeout().unwrap(), Duration::from_secs(300));
        assert_eq!(config.poll_interval().unwrap(), Duration::from_secs(5));
        assert!(config.gitlab_url.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            gitlab_url = "https://gitlab.example.com"
            timeout = "10m"
            "#,
        )
        .unwrap();
        assert_eq!(config.timeout().unwrap(), Duration::from_secs(600));
        assert_eq!(config.poll_interval().unwrap(), Duration::from_secs(5));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_gitlab_url_validation() {
        let mut config = Config::default();
        assert!(matches!(config.gitlab_url(), Err(Error::Config(_))));

        config.gitlab_url = Some("gitlab.example.com".to_string());
        assert!(matches!(config.gitlab_url(), Err(Error::Config(_))));

        config.gitlab_url = Some("ftp://gitlab.example.com".to_string());
        assert!(matches!(config.gitlab_url(), Err(Error::Config(_))));

        config.gitlab_url = Some("https://gitlab.example.com/".to_string());
        assert_eq!(
            config.gitlab_url().unwrap().as_str(),
            "https://gitlab.example.com/"
        );
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let config = Config {
            poll_interval: "0s".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.poll_interval(), Err(Error::Config(_))));
    }

    #[test]
    fn test_merge_options_from_config() {
        let config = Config {
            max_retries: 5,
            timeout: "1m".to_string(),
            poll_interval: "2s".to_string(),
            ..Config::default()
        };
        let options = config.merge_options().unwrap();
        assert_eq!(options.max_retries, 5);
        assert_eq!(options.timeout, Duration::from_secs(60));
        assert_eq!(options.poll_interval, Duration::from_secs(2));
        assert!(!options.auto_rebase);
    }
}
