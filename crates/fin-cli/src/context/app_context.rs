use std::sync::Arc;

use anyhow::Context;
use fin_api::BackendClient;
use fin_auth::{StoredIdentityProvider, TokenStore};
use fin_config::FinConfig;
use fin_core::SubjectId;
use fin_sync::FinanceClient;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub config: FinConfig,
    pub provider: Arc<StoredIdentityProvider>,
    pub backend: Arc<BackendClient>,
    pub client: FinanceClient,
}

impl AppContext {
    pub fn init(config: FinConfig) -> anyhow::Result<Self> {
        let store = TokenStore::new(
            &config.auth.keyring_service,
            config.auth.credentials_file.clone(),
        )
        .context("failed to open credential store")?;
        let provider = Arc::new(StoredIdentityProvider::new(
            store,
            config.auth.expiry_buffer_secs,
        ));

        let backend = Arc::new(
            BackendClient::new(
                &config.backend.normalized_base_url(),
                config.backend.timeout(),
                &config.backend.user_agent,
            )
            .context("failed to build backend client")?,
        );

        let client = FinanceClient::new(provider.clone(), backend.clone());
        tracing::debug!(session = ?client.session(), "client ready");

        Ok(Self {
            config,
            provider,
            backend,
            client,
        })
    }

    /// The signed-in subject, or an error telling the user how to sign in.
    pub fn require_subject(&self) -> anyhow::Result<SubjectId> {
        if let Some(subject) = self.client.session().subject() {
            return Ok(subject.clone());
        }
        match self.client.session_store().diagnostic() {
            Some(reason) => anyhow::bail!(
                "not signed in ({reason}). Run 'finsight auth login --token <ID_TOKEN>'"
            ),
            None => anyhow::bail!("not signed in. Run 'finsight auth login --token <ID_TOKEN>'"),
        }
    }
}
