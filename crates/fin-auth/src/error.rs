use thiserror::Error;

/// Identity provider and credential failures.
///
/// `Clone` because provider events fan out to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("not signed in; run `finsight auth login`")]
    NotAuthenticated,

    #[error("ID token expired; run `finsight auth login` again")]
    TokenExpired,

    #[error("invalid ID token: {0}")]
    InvalidToken(String),

    #[error("keyring error: {0}")]
    KeyringError(String),

    #[error("token store error: {0}")]
    TokenStoreError(String),

    /// Provider could not verify the session (e.g. network loss).
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),
}
