use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Webhook the alerts are posted to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Relay RSS API endpoint, without query string
    #[serde(default = "default_feed_base_url")]
    pub feed_base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Fast cadence: how often active entities are evaluated
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Slow cadence: how often the feeds are re-fetched
    #[serde(default = "default_refresh_interval_minutes")]
    pub refresh_interval_minutes: i64,

    /// How long announcements are remembered
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    #[serde(default = "default_state_path")]
    pub state_path: String,

    /// Alerts only go to the log when no webhook is configured
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_feed_base_url() -> String {
    "https://mars.nasa.gov/rss/api/".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 mrn-bot/1.0".to_string()
}

fn default_tick_interval_secs() -> u64 {
    10
}

fn default_refresh_interval_minutes() -> i64 {
    10
}

fn default_retention_days() -> i64 {
    7
}

fn default_state_path() -> String {
    "data/seen_state.json".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            feed_base_url: default_feed_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            tick_interval_secs: default_tick_interval_secs(),
            refresh_interval_minutes: default_refresh_interval_minutes(),
            retention_days: default_retention_days(),
            state_path: default_state_path(),
            webhook: None,
        }
    }
}

impl BackendConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: BackendConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

pub static CONFIG: OnceLock<BackendConfig> = OnceLock::new();

pub const CONFIG_PATH: &str = "config.toml";

/// Read [`CONFIG_PATH`] into [`CONFIG`]; a missing file means defaults
pub fn read_config() -> anyhow::Result<&'static BackendConfig> {
    read_config_from(CONFIG_PATH)
}

pub fn read_config_from(path: impl AsRef<Path>) -> anyhow::Result<&'static BackendConfig> {
    let path = path.as_ref();
    let config = if path.exists() {
        BackendConfig::from_file(path)?
    } else {
        BackendConfig::default()
    };

    Ok(CONFIG.get_or_init(|| config))
}
