//! # fin-auth
//!
//! Identity provider plumbing for finsight.
//!
//! The synchronization core only sees identities through the
//! [`IdentityProvider`] capability: `subscribe(callback) -> subscription`,
//! firing once immediately with the current state and again on every change,
//! plus `sign_out()`. This crate provides:
//!
//! - [`ChannelIdentityProvider`]: an in-memory provider driven by explicit
//!   `sign_in`/`sign_out`/`fail` calls
//! - [`StoredIdentityProvider`]: a provider backed by a persisted ID token
//!   (OS keychain → env var → credentials file)
//! - ID token claim decoding ([`IdTokenClaims`])

pub mod claims;
pub mod error;
pub mod provider;
pub mod stored;
pub mod token_store;

pub use claims::IdTokenClaims;
pub use error::AuthError;
pub use provider::{
    ChannelIdentityProvider, IdentityCallback, IdentityEvent, IdentityProvider,
    ProviderSubscription,
};
pub use stored::StoredIdentityProvider;
pub use token_store::{TokenSource, TokenStore};
