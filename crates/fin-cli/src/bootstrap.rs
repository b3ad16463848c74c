use anyhow::Context;
use fin_config::FinConfig;

/// Load `.env` (if any) and the layered configuration.
pub fn load_config() -> anyhow::Result<FinConfig> {
    FinConfig::load_with_dotenv().context("failed to load finsight configuration")
}
