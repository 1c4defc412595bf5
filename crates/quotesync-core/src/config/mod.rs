//! Sync configuration shared by every client.
//!
//! Settings live in a JSON file; unknown keys are rejected so typos surface
//! instead of silently falling back to defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Environment variable overriding [`SyncSettings::remote_base_url`].
pub const REMOTE_URL_ENV: &str = "QUOTESYNC_REMOTE_URL";

const DEFAULT_REMOTE_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
const DEFAULT_FETCH_LIMIT: usize = 10;
const DEFAULT_INTERVAL_SECS: u64 = 30;
const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_CATEGORY_PREFIX: &str = "ServerCat-";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SyncSettings {
    /// Base URL of the remote quote store
    #[serde(default = "default_remote_base_url")]
    pub remote_base_url: String,
    /// Maximum number of remote items fetched per cycle
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
    /// Seconds between automatic sync cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Seconds before an in-flight cycle is treated as failed
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Prefix for categories derived from the remote grouping key
    #[serde(default = "default_category_prefix")]
    pub category_prefix: String,
}

fn default_remote_base_url() -> String {
    DEFAULT_REMOTE_BASE_URL.to_string()
}

const fn default_fetch_limit() -> usize {
    DEFAULT_FETCH_LIMIT
}

const fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_category_prefix() -> String {
    DEFAULT_CATEGORY_PREFIX.to_string()
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            remote_base_url: default_remote_base_url(),
            fetch_limit: DEFAULT_FETCH_LIMIT,
            interval_secs: DEFAULT_INTERVAL_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            category_prefix: default_category_prefix(),
        }
    }
}

impl SyncSettings {
    /// Load settings from `path`, returning defaults when the file is absent.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Parse and validate a JSON settings document.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut settings = serde_json::from_str::<Self>(raw)?;
        settings.normalize();
        settings.validate()?;
        Ok(settings)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        normalized.validate()?;
        std::fs::write(path, serde_json::to_string_pretty(&normalized)?)?;
        Ok(())
    }

    /// Apply [`REMOTE_URL_ENV`] when set.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = normalize_text_option(std::env::var(REMOTE_URL_ENV).ok()) {
            self.remote_base_url = url;
            self.normalize();
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !is_http_url(&self.remote_base_url) {
            return Err(Error::InvalidInput(
                "remote_base_url must include http:// or https://".to_string(),
            ));
        }
        if self.fetch_limit == 0 {
            return Err(Error::InvalidInput("fetch_limit must be at least 1".into()));
        }
        if self.interval_secs == 0 {
            return Err(Error::InvalidInput(
                "interval_secs must be at least 1".into(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::InvalidInput("timeout_secs must be at least 1".into()));
        }
        Ok(())
    }

    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn normalize(&mut self) {
        self.remote_base_url = self.remote_base_url.trim().trim_end_matches('/').to_string();
        self.category_prefix = self.category_prefix.trim().to_string();
    }
}
