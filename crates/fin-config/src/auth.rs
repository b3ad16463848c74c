//! Identity credential storage configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_keyring_service() -> String {
    "finsight-cli".into()
}

const fn default_expiry_buffer_secs() -> i64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// OS keychain service name the ID token is stored under.
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,

    /// Override for the credentials fallback file
    /// (default `~/.finsight/credentials`).
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,

    /// Tokens expiring within this many seconds are treated as expired.
    #[serde(default = "default_expiry_buffer_secs")]
    pub expiry_buffer_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            keyring_service: default_keyring_service(),
            credentials_file: None,
            expiry_buffer_secs: default_expiry_buffer_secs(),
        }
    }
}

impl AuthConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.keyring_service.trim().is_empty() {
            return Err(ConfigError::invalid("auth.keyring_service", "must not be empty"));
        }
        if self.expiry_buffer_secs < 0 {
            return Err(ConfigError::invalid("auth.expiry_buffer_secs", "must not be negative"));
        }
        Ok(())
    }
}
