//! General application configuration.

use serde::{Deserialize, Serialize};

fn default_format() -> String {
    "json".into()
}

const fn default_connect_wait_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Output format used when `--format` is not given (json, table, raw).
    #[serde(default = "default_format")]
    pub default_format: String,

    /// How long `finsight connect` polls the profile for the account to show
    /// up as connected.
    #[serde(default = "default_connect_wait_secs")]
    pub connect_wait_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            connect_wait_secs: default_connect_wait_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = GeneralConfig::default();
        assert_eq!(config.default_format, "json");
        assert_eq!(config.connect_wait_secs, 120);
    }
}
