//! Client and cache configuration.
//!
//! `ClientConfig` is read from the environment; `CacheOptions` is built in
//! code by whoever owns the cache.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

const ENV_BASE_URL: &str = "TODO_API_URL";
const ENV_TIMEOUT_MS: &str = "TODO_API_TIMEOUT_MS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be an http(s) URL, got {value:?}")]
    InvalidUrl { key: &'static str, value: String },

    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidTimeout { key: &'static str, value: String },
}

/// Where the todo service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `TODO_API_URL` and `TODO_API_TIMEOUT_MS`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL) {
            let url = url.trim().to_string();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl {
                    key: ENV_BASE_URL,
                    value: url,
                });
            }
            config.base_url = url;
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout {
                    key: ENV_TIMEOUT_MS,
                    value: raw.clone(),
                })?;
            config.timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }
}

/// Behaviour switches for `TodoCache`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// When false (the default), a second drag-reorder while one is pending
    /// fails with `ApiError::Busy` instead of reaching the server.
    pub allow_concurrent_reorders: bool,
}
