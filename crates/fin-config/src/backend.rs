//! Finance backend connection settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_base_url() -> String {
    "http://127.0.0.1:8000/app/".into()
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "finsight/0.1".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Root URL the REST endpoints are resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout. Sync jobs run synchronously on the server, so
    /// this needs to be generous.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl BackendConfig {
    pub fn is_configured(&self) -> bool {
        self.base_url.starts_with("http://") || self.base_url.starts_with("https://")
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL with exactly one trailing slash, so relative endpoint paths
    /// join under it rather than replacing its last segment.
    #[must_use]
    pub fn normalized_base_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !self.is_configured() {
            return Err(ConfigError::invalid(
                "backend.base_url",
                format!("expected an http(s) URL, got '{}'", self.base_url),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "backend.timeout_secs",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}
