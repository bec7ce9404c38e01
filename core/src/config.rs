//! Client configuration.
//!
//! Defaults target the public v8 endpoint. `from_env` reads:
//!
//! - `TODOIST_API_URL` (optional) - base URL, e.g. a local mock server
//! - `TODOIST_TIMEOUT_SECS` (optional) - per-request timeout in whole seconds, at least 1

use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.todoist.com/API/v8";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ENV_API_URL: &str = "TODOIST_API_URL";
const ENV_TIMEOUT_SECS: &str = "TODOIST_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Upper bound for one request, connect to last body byte.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("todoist-core/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_API_URL).filter(|url| !url.trim().is_empty()) {
            config.base_url = url;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| Error::invalid(format!("{ENV_TIMEOUT_SECS} must be a number of seconds, got {secs:?}")))?;
            if secs == 0 {
                return Err(Error::invalid(format!("{ENV_TIMEOUT_SECS} must be at least 1 second")));
            }
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
