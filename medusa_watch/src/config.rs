use crate::{notifications::ReconnectPolicy, poller::PollSettings, view::Theme};
use anyhow::Context;
use medusa_api::commands::ScopeParams;
use serde::{Deserialize, Serialize};
use std::{fs, time::Duration};

pub const DEFAULT_PAGE: &str = "home/index";

#[derive(Deserialize, Serialize, Debug, PartialEq, Eq)]
pub struct Config {
    pub log_level: Option<String>,
    /// Base URL of the web interface, including the web root
    pub url: String,
    pub api_key: String,
    #[serde(default)]
    pub auth: AuthStyle,
    /// Page to open when none is given on the command line, as `controller/action`
    pub page: Option<String>,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// How the API key is sent to the server
#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum AuthStyle {
    /// `X-Api-Key: <key>`
    #[default]
    Header,
    /// `Authorization: Bearer <key>`
    Bearer,
}

#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Eq, Clone)]
pub struct PollConfig {
    pub status_path: Option<String>,
    pub scope_params: Option<ScopeParams>,
    pub active_interval_ms: Option<u64>,
    pub idle_interval_ms: Option<u64>,
    pub failure_backoff_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    /// How long a snatched row stays on pages that remove them
    pub row_removal_delay_ms: Option<u64>,
    /// How long settled rows and removed episodes are remembered once the server stops reporting them
    pub row_retention_ms: Option<u64>,
}

#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Eq, Clone)]
pub struct NotificationConfig {
    pub enabled: Option<bool>,
    pub reconnect_initial_ms: Option<u64>,
    pub reconnect_max_ms: Option<u64>,
}

impl Config {
    pub fn from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML in: {}", path.display()))?;

        Ok(config)
    }

    pub fn page(&self) -> &str {
        self.page.as_deref().unwrap_or(DEFAULT_PAGE)
    }
}

impl PollConfig {
    pub fn settings(&self) -> PollSettings {
        let defaults = PollSettings::default();
        let or = |ms: Option<u64>, default: Duration| ms.map(Duration::from_millis).unwrap_or(default);
        PollSettings {
            active_interval: or(self.active_interval_ms, defaults.active_interval),
            idle_interval: or(self.idle_interval_ms, defaults.idle_interval),
            failure_backoff: or(self.failure_backoff_ms, defaults.failure_backoff),
            request_timeout: or(self.request_timeout_ms, defaults.request_timeout),
        }
    }

    pub fn row_removal_delay(&self) -> Duration {
        Duration::from_millis(self.row_removal_delay_ms.unwrap_or(3000))
    }

    pub fn row_retention(&self) -> Duration {
        Duration::from_millis(self.row_retention_ms.unwrap_or(600_000))
    }
}

impl NotificationConfig {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        let defaults = ReconnectPolicy::default();
        ReconnectPolicy {
            initial_delay: self
                .reconnect_initial_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_delay),
            max_delay: self
                .reconnect_max_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_delay),
            ..defaults
        }
    }
}
