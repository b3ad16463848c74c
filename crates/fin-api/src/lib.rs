//! # fin-api
//!
//! HTTP client for the finance backend.
//!
//! Canonical endpoint set (relative to the configured base URL):
//! - `POST api/get-user`: profile lookup by subject id
//! - `POST api/manual-sync/`: run the mail ingestion job for one subject
//! - `POST api/get-analysis/`: monthly analysis
//! - `POST api/create-profile/`: registration
//! - `GET google/connect/`: external account connect (browser redirect)
//!
//! The synchronization core consumes the backend through the
//! [`FinanceBackend`] trait so tests can substitute a scripted backend.

mod analysis;
mod error;
mod http;
mod profile;
mod sync;

pub use error::ApiError;
pub use profile::NewProfile;
pub use sync::SyncReceipt;

use std::time::Duration;

use async_trait::async_trait;
use fin_core::{AnalysisPayload, AnalysisQuery, SubjectId, UserProfile};
use reqwest::Url;

// ── Capability ─────────────────────────────────────────────────────

/// Backend operations the synchronization core depends on.
#[async_trait]
pub trait FinanceBackend: Send + Sync {
    /// Fetch the server-held profile for `subject`.
    async fn fetch_profile(&self, subject: &SubjectId) -> Result<UserProfile, ApiError>;

    /// Run the manual sync job for `subject` and wait for it to finish.
    async fn trigger_sync(&self, subject: &SubjectId) -> Result<SyncReceipt, ApiError>;

    /// Compute the analysis for `query`.
    async fn fetch_analysis(&self, query: &AnalysisQuery) -> Result<AnalysisPayload, ApiError>;

    /// URL that starts the external account connect flow.
    fn connect_url(&self) -> Result<String, ApiError>;
}

// ── Client ─────────────────────────────────────────────────────────

/// reqwest-backed [`FinanceBackend`].
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base: Url,
}

impl BackendClient {
    /// Create a client rooted at `base_url`.
    ///
    /// A missing trailing slash is added so relative endpoint paths nest
    /// under the base rather than replacing its last segment.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if `base_url` does not parse, or
    /// [`ApiError::Http`] if the underlying `reqwest::Client` fails to build.
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self, ApiError> {
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base = Url::parse(&normalized)
            .map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { http, base })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }
}

#[async_trait]
impl FinanceBackend for BackendClient {
    async fn fetch_profile(&self, subject: &SubjectId) -> Result<UserProfile, ApiError> {
        self.get_user(subject).await
    }

    async fn trigger_sync(&self, subject: &SubjectId) -> Result<SyncReceipt, ApiError> {
        self.manual_sync(subject).await
    }

    async fn fetch_analysis(&self, query: &AnalysisQuery) -> Result<AnalysisPayload, ApiError> {
        self.get_analysis(query).await
    }

    fn connect_url(&self) -> Result<String, ApiError> {
        self.endpoint("google/connect/").map(String::from)
    }
}
