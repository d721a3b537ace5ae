//! Watcher configuration loading
//!
//! Loads YAML configuration from the path given on the command line, else
//! `GOVWATCH_CONFIG`, else `./config.yaml`. Unlike optional tuning files, the
//! watcher cannot run without a config: a missing file is an error.

use crate::errors::{Result, WatchError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Deserialize, Clone)]
pub struct WatchConfig {
    /// Proposal feed
    pub api: ApiConfig,

    /// Block explorer used to build proposal links
    pub explorer: ExplorerConfig,

    /// Key-value store holding seen proposals
    #[serde(rename = "redis")]
    pub store: StoreConfig,

    /// Notification destination
    pub telegram: TelegramConfig,

    /// Polling cadence
    pub ticker: TickerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Feed URL returning `{ "proposals": [...] }`
    pub url: String,

    /// Per-request timeout shared by the feed and notifier HTTP calls
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExplorerConfig {
    /// Base URL; links are `<url>/<proposal_id>`
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// `host:port`
    pub addr: String,

    #[serde(default)]
    pub password: Option<String>,

    /// Logical database number
    #[serde(default)]
    pub db_index: i64,
}

impl StoreConfig {
    /// Connection URL in the `redis://[:password@]host:port/db` form.
    pub fn connection_url(&self) -> String {
        match self.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => format!(
                "redis://:{}@{}/{}",
                urlencoding::encode(password),
                self.addr,
                self.db_index
            ),
            None => format!("redis://{}/{}", self.addr, self.db_index),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,

    /// Destination chat (user, group, or channel id)
    pub chat_id: i64,

    /// Bot API base URL
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct TickerConfig {
    /// Sleep between the end of one cycle and the start of the next (e.g. "5m")
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl WatchConfig {
    /// Environment variable to override config path
    pub const ENV_CONFIG_PATH: &'static str = "GOVWATCH_CONFIG";

    /// Default config filename, relative to the working directory
    pub const DEFAULT_CONFIG_FILENAME: &'static str = "config.yaml";

    /// Load configuration.
    ///
    /// Resolution order:
    /// 1. `explicit` (the `--config` flag)
    /// 2. `GOVWATCH_CONFIG` environment variable
    /// 3. `./config.yaml`
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit);
        Self::load_from_path(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            WatchError::config_with_source(
                format!("failed to read config at {}", path.display()),
                e,
            )
        })?;

        Self::parse(&contents).map_err(|e| match e {
            WatchError::Config { message, source } => WatchError::Config {
                message: format!("{message} (in {})", path.display()),
                source,
            },
            other => other,
        })
    }

    /// Parse configuration from a YAML string
    pub fn parse(contents: &str) -> Result<Self> {
        let cfg: WatchConfig = serde_yaml::from_str(contents)
            .map_err(|e| WatchError::config_with_source("failed to parse config", e))?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }

        if let Ok(path) = std::env::var(Self::ENV_CONFIG_PATH)
            && !path.is_empty()
        {
            return PathBuf::from(path);
        }

        PathBuf::from(Self::DEFAULT_CONFIG_FILENAME)
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("api.url", &self.api.url),
            ("explorer.url", &self.explorer.url),
            ("redis.addr", &self.store.addr),
            ("telegram.bot_token", &self.telegram.bot_token),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(WatchError::config(format!("{field} must not be empty")));
            }
        }

        if self.ticker.interval.is_zero() {
            return Err(WatchError::config("ticker.interval must be greater than zero"));
        }

        if self.explorer.url.ends_with('/') {
            tracing::warn!(
                explorer_url = %self.explorer.url,
                "explorer.url ends with '/', links will contain a double slash"
            );
        }

        Ok(())
    }
}

mod humantime_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
