use anyhow::Result;
use aptwise_oauth::{CoordinatorSettings, PopupFeatures};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub oauth: OAuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Origin the provider redirects back to; only messages from it are trusted.
    pub origin: String,
    pub poll_interval_ms: u64,
    pub close_delay_ms: u64,
    pub popup_width: u32,
    pub popup_height: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: aptwise_api::client::DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 20,
        }
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:5174".to_string(),
            poll_interval_ms: 1000,
            close_delay_ms: 1500,
            popup_width: 600,
            popup_height: 600,
        }
    }
}

impl Config {
    pub fn load(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default(path: &PathBuf) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Applies `APTWISE_API_BASE_URL` / `APTWISE_ORIGIN` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base_url) = lookup("APTWISE_API_BASE_URL").filter(|v| !v.is_empty()) {
            self.api.base_url = base_url;
        }
        if let Some(origin) = lookup("APTWISE_ORIGIN").filter(|v| !v.is_empty()) {
            self.oauth.origin = origin;
        }
        self
    }

    /// The configured origin in `scheme://host[:port]` form.
    pub fn origin(&self) -> Result<String> {
        Ok(Url::parse(&self.oauth.origin)?.origin().ascii_serialization())
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }

    pub fn close_delay(&self) -> Duration {
        Duration::from_millis(self.oauth.close_delay_ms)
    }

    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            poll_interval: Duration::from_millis(self.oauth.poll_interval_ms.max(1)),
            features: PopupFeatures {
                width: self.oauth.popup_width,
                height: self.oauth.popup_height,
                ..PopupFeatures::default()
            },
        }
    }
}
