//! Client configuration.
//!
//! Loaded from a TOML file with one environment override:
//! `STOREFRONT_API_URL` replaces `api.base_url`, so the same config file can
//! point at staging or production. Credentials never live in the config;
//! `credentials.path` only names where the store persists them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

fn default_timeout_secs() -> u64 {
    30
}

/// Root configuration for the storefront client.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Storefront API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL all request paths are joined onto.
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Credential persistence settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    /// Credential file path. The store stays in-memory when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Config {
    /// In-code configuration with defaults, for embedding without a file.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                base_url: base_url.into(),
                timeout_secs: default_timeout_secs(),
            },
            credentials: CredentialsConfig::default(),
        }
    }

    /// Load configuration from a TOML file and apply environment overrides.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        // Environment wins over the file.
        if let Ok(url) = std::env::var("STOREFRONT_API_URL") {
            let url = url.trim();
            if !url.is_empty() {
                config.api.base_url = url.to_string();
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "api.base_url must start with http:// or https://, got '{}'",
                self.api.base_url
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "api.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Base URL without a trailing slash, so joining constant paths never
    /// produces `//`.
    pub fn normalized_base_url(&self) -> String {
        self.api.base_url.trim_end_matches('/').to_string()
    }
}
