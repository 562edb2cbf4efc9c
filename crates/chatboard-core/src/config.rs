//! Runtime settings and credential resolution.
//!
//! Settings come from an optional TOML file (`chatboard.toml` by default).
//! A missing file yields the built-in defaults, so a bare `chatboard collect`
//! works with only a token in the environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Environment variables consulted for the API token, in order.
pub const TOKEN_ENV_VARS: [&str; 2] = ["SLACK_TOKEN", "TOKEN"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API token: pass --token or set SLACK_TOKEN / TOKEN")]
    MissingToken,

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite file holding collected history.
    pub db_path: PathBuf,
    pub api_base_url: String,
    /// Items requested per page (the platform caps this at 1000).
    pub page_limit: u32,
    pub request_timeout_secs: u64,
    /// Message subtypes counted as posts by the reports.
    pub target_subtypes: Vec<String>,
    /// Entries shown per leaderboard.
    pub top_n: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("slack.sqlite"),
            api_base_url: "https://slack.com/api".to_string(),
            page_limit: 200,
            request_timeout_secs: 30,
            target_subtypes: vec![String::new(), "thread_broadcast".to_string()],
            top_n: 10,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, falling back to defaults when it
    /// doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=1000).contains(&self.page_limit) {
            return Err(ConfigError::Invalid {
                key: "page_limit",
                reason: format!("{} is outside 1..=1000", self.page_limit),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "request_timeout_secs",
                reason: "must be positive".to_string(),
            });
        }
        self.api_base()?;
        Ok(())
    }

    /// API base URL with a trailing slash so method names join beneath it.
    pub fn api_base(&self) -> Result<Url, ConfigError> {
        let mut base = self.api_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base).map_err(|e| ConfigError::Invalid {
            key: "api_base_url",
            reason: e.to_string(),
        })
    }
}

/// Pick the API token: explicit value first, then the environment.
pub fn resolve_token(explicit: Option<String>) -> Result<String, ConfigError> {
    resolve_token_with(explicit, |key| std::env::var(key).ok())
}

fn resolve_token_with<F>(explicit: Option<String>, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .into_iter()
        .chain(TOKEN_ENV_VARS.iter().filter_map(|key| lookup(*key)))
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
        .ok_or(ConfigError::MissingToken)
}
