use fin_core::Identity;

use crate::claims::IdTokenClaims;
use crate::error::AuthError;
use crate::provider::{
    ChannelIdentityProvider, IdentityCallback, IdentityEvent, IdentityProvider,
    ProviderSubscription,
};
use crate::token_store::{TokenSource, TokenStore};

/// Identity provider backed by a persisted ID token.
///
/// The stored token is read once at construction (and again on
/// [`refresh`](Self::refresh)); expired or undecodable tokens are reported as
/// provider errors rather than as "signed out", so the session layer can
/// surface a diagnostic.
pub struct StoredIdentityProvider {
    store: TokenStore,
    expiry_buffer_secs: i64,
    channel: ChannelIdentityProvider,
}

impl StoredIdentityProvider {
    #[must_use]
    pub fn new(store: TokenStore, expiry_buffer_secs: i64) -> Self {
        let initial = resolve(&store, expiry_buffer_secs);
        Self {
            store,
            expiry_buffer_secs,
            channel: ChannelIdentityProvider::with_initial(initial),
        }
    }

    /// Validate and persist a fresh ID token, then notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` / `AuthError::TokenExpired` if the
    /// token is unusable, or `AuthError::TokenStoreError` if it cannot be
    /// persisted. Nothing is stored or published on error.
    pub fn sign_in(&self, id_token: &str) -> Result<Identity, AuthError> {
        let claims = IdTokenClaims::decode(id_token)?;
        if claims.is_near_expiry(self.expiry_buffer_secs) {
            return Err(AuthError::TokenExpired);
        }
        let identity = claims.to_identity()?;
        self.store.store(id_token.trim())?;
        tracing::info!(subject = %identity.subject, "signed in");
        self.channel.sign_in(identity.clone());
        Ok(identity)
    }

    /// Re-read the store and publish whatever it now holds.
    pub fn refresh(&self) {
        self.channel
            .publish(resolve(&self.store, self.expiry_buffer_secs));
    }

    #[must_use]
    pub fn current(&self) -> IdentityEvent {
        self.channel.current()
    }

    #[must_use]
    pub fn token_source(&self) -> Option<TokenSource> {
        self.store.load().map(|(_, source)| source)
    }

    /// Claims of the stored token, if one decodes.
    #[must_use]
    pub fn stored_claims(&self) -> Option<IdTokenClaims> {
        let (jwt, _) = self.store.load()?;
        IdTokenClaims::decode(&jwt).ok()
    }
}

impl IdentityProvider for StoredIdentityProvider {
    fn subscribe(&self, callback: IdentityCallback) -> ProviderSubscription {
        self.channel.subscribe(callback)
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        self.store.delete()?;
        tracing::info!("signed out");
        self.channel.sign_out_now();
        Ok(())
    }
}

fn resolve(store: &TokenStore, expiry_buffer_secs: i64) -> IdentityEvent {
    let Some((jwt, source)) = store.load() else {
        return Ok(None);
    };
    let claims = IdTokenClaims::decode(&jwt)?;
    if claims.is_near_expiry(expiry_buffer_secs) {
        tracing::warn!(
            %source,
            expires_at = %claims.expires_at,
            "stored ID token is expired or about to expire"
        );
        return Err(AuthError::TokenExpired);
    }
    claims.to_identity().map(Some)
}
