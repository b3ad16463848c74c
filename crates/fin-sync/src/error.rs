//! Error taxonomy of the synchronization core.
//!
//! None of these escape a component's public contract as a failure of the
//! operation itself: profile, sync, and analysis failures are recorded as
//! state (`ProfileSlot::Failed`, `SyncState::Failed`, `AnalysisStatus::Error`)
//! and the error values here supply the message.

use fin_api::ApiError;
use fin_auth::AuthError;
use fin_core::CoreError;
use thiserror::Error;

/// Shown when a failed sync carries no server-reported reason.
pub(crate) const GENERIC_SYNC_FAILURE: &str = "Sync failed. Please try again.";

/// Shown when a failed analysis carries no server-reported reason.
pub(crate) const GENERIC_ANALYSIS_FAILURE: &str = "Failed to fetch analysis data.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileFetchError {
    #[error("profile request failed: {0}")]
    Network(String),

    #[error("profile response could not be parsed: {0}")]
    Parse(String),

    /// The backend has no profile for this identity.
    #[error("no profile for this identity: {0}")]
    NotFound(String),

    #[error("profile not available: {0}")]
    Rejected(String),

    /// The identity changed or the slot was invalidated before the fetch
    /// settled; its result was discarded.
    #[error("profile fetch abandoned")]
    Abandoned,
}

impl From<ApiError> for ProfileFetchError {
    fn from(error: ApiError) -> Self {
        if error.status() == Some(404) {
            let reason = error.server_message().unwrap_or("not found").to_string();
            return Self::NotFound(reason);
        }
        match error {
            ApiError::Parse(message) => Self::Parse(message),
            ApiError::Api { message, .. } => Self::Rejected(message),
            other => Self::Network(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The server ran the request and reported why it failed.
    #[error("sync rejected: {reason}")]
    Rejected { reason: String },

    /// Transport or parse failure with no server-reported reason.
    #[error("sync request failed: {0}")]
    Unavailable(String),
}

impl SyncError {
    /// Message recorded in `SyncState::Failed`.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { reason } => reason.clone(),
            Self::Unavailable(_) => GENERIC_SYNC_FAILURE.to_string(),
        }
    }
}

impl From<ApiError> for SyncError {
    fn from(error: ApiError) -> Self {
        match error.server_message() {
            Some(reason) => Self::Rejected {
                reason: reason.to_string(),
            },
            None => Self::Unavailable(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisQueryError {
    #[error("{0}")]
    Rejected(String),

    #[error("analysis request failed: {0}")]
    Unavailable(String),
}

impl AnalysisQueryError {
    /// Message recorded in `AnalysisStatus::Error`.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(reason) => reason.clone(),
            Self::Unavailable(_) => GENERIC_ANALYSIS_FAILURE.to_string(),
        }
    }
}

impl From<ApiError> for AnalysisQueryError {
    fn from(error: ApiError) -> Self {
        match error.server_message() {
            Some(reason) => Self::Rejected(reason.to_string()),
            None => Self::Unavailable(error.to_string()),
        }
    }
}

/// Failures of the [`FinanceClient`](crate::FinanceClient) facade's own
/// preconditions.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no signed-in identity")]
    NotAuthenticated,

    #[error(transparent)]
    InvalidQuery(#[from] CoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Profile(#[from] ProfileFetchError),

    /// The query was built for an identity that is no longer signed in.
    #[error("signed-in identity changed; query discarded")]
    IdentityChanged,

    #[error("external connect failed: {0}")]
    Connect(String),
}
