//! The assembled client: session, profile, sync, and analysis wired together.

use std::sync::Arc;

use fin_api::FinanceBackend;
use fin_auth::IdentityProvider;
use fin_core::{
    AnalysisQuery, AnalysisResult, ClientEvent, ProfileSlot, Session, SubjectId, SyncState,
    UserProfile,
};

use crate::analysis_controller::{AnalysisQueryController, QueryTicket};
use crate::error::ClientError;
use crate::events::{EventBus, EventFeed};
use crate::profile_repository::ProfileRepository;
use crate::session_store::{SessionStore, SessionSubscription};
use crate::sync_controller::{SyncController, SyncTicket};

/// Opens the backend's account-connection flow somewhere the user can finish
/// it (a browser, a webview).
pub trait ConnectLauncher: Send + Sync {
    /// # Errors
    ///
    /// Returns a description of why the flow could not be opened.
    fn launch(&self, url: &str) -> Result<(), String>;
}

/// Entry point for presentation layers.
///
/// Views read state through this type and never mutate the components
/// directly. Identity changes reset profile and analysis state; sync state
/// stays keyed by the identity it was started for.
pub struct FinanceClient {
    backend: Arc<dyn FinanceBackend>,
    session: Arc<SessionStore>,
    profiles: Arc<ProfileRepository>,
    sync: Arc<SyncController>,
    analysis: Arc<AnalysisQueryController>,
    events: EventBus,
    _wiring: SessionSubscription,
}

impl FinanceClient {
    /// Build the client and subscribe to `provider`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime and the provider reports a
    /// signed-in identity, since the initial profile fetch is spawned.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, backend: Arc<dyn FinanceBackend>) -> Self {
        let events = EventBus::default();
        let profiles = Arc::new(ProfileRepository::new(Arc::clone(&backend), events.clone()));
        let sync = Arc::new(SyncController::new(
            Arc::clone(&backend),
            Arc::clone(&profiles),
            events.clone(),
        ));
        let analysis = Arc::new(AnalysisQueryController::new(
            Arc::clone(&backend),
            events.clone(),
        ));
        let session = SessionStore::connect(provider);

        let wiring = {
            let profiles = Arc::downgrade(&profiles);
            let analysis = Arc::downgrade(&analysis);
            let events = events.clone();
            session.on_change(move |session| {
                if let Some(profiles) = profiles.upgrade() {
                    profiles.on_session_change(session);
                }
                if let Some(analysis) = analysis.upgrade() {
                    analysis.on_session_change(session);
                }
                events.emit(ClientEvent::SessionChanged {
                    session: session.clone(),
                });
            })
        };

        Self {
            backend,
            session,
            profiles,
            sync,
            analysis,
            events,
            _wiring: wiring,
        }
    }

    #[must_use]
    pub fn session(&self) -> Session {
        self.session.current()
    }

    #[must_use]
    pub fn session_store(&self) -> &Arc<SessionStore> {
        &self.session
    }

    #[must_use]
    pub fn profiles(&self) -> &Arc<ProfileRepository> {
        &self.profiles
    }

    #[must_use]
    pub fn sync_controller(&self) -> &Arc<SyncController> {
        &self.sync
    }

    #[must_use]
    pub fn analysis_controller(&self) -> &Arc<AnalysisQueryController> {
        &self.analysis
    }

    fn subject(&self) -> Result<SubjectId, ClientError> {
        self.session
            .current()
            .subject()
            .cloned()
            .ok_or(ClientError::NotAuthenticated)
    }

    /// Profile slot for the signed-in identity.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] when nobody is signed in.
    pub fn profile(&self) -> Result<ProfileSlot, ClientError> {
        Ok(self.profiles.get_profile(&self.subject()?))
    }

    /// Wait for the signed-in identity's profile.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] when nobody is signed in, or
    /// [`ClientError::Profile`] if the fetch fails or is abandoned.
    pub async fn load_profile(&self) -> Result<UserProfile, ClientError> {
        let subject = self.subject()?;
        Ok(self.profiles.load_profile(&subject).await?)
    }

    /// Drop the cached profile and fetch it again.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] when nobody is signed in, or
    /// [`ClientError::Profile`] if the fetch fails.
    pub async fn reload_profile(&self) -> Result<UserProfile, ClientError> {
        let subject = self.subject()?;
        self.profiles.invalidate(&subject);
        Ok(self.profiles.load_profile(&subject).await?)
    }

    /// Trigger a manual sync for the signed-in identity.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] when nobody is signed in.
    pub fn trigger_sync(&self) -> Result<SyncTicket, ClientError> {
        Ok(self.sync.trigger(&self.subject()?))
    }

    /// Sync state of the signed-in identity; `Idle` when signed out.
    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        self.session
            .current()
            .subject()
            .map(|subject| self.sync.state(subject))
            .unwrap_or_default()
    }

    /// Query the signed-in identity's analysis for `month`/`year`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] when nobody is signed in, or
    /// [`ClientError::InvalidQuery`] for a month outside 1..=12, or
    /// [`ClientError::IdentityChanged`] if the identity switched while the
    /// query was being built.
    pub fn request_analysis(&self, month: u32, year: i32) -> Result<QueryTicket, ClientError> {
        let query = AnalysisQuery::new(self.subject()?, month, year)?;
        self.analysis.request(query).ok_or(ClientError::IdentityChanged)
    }

    #[must_use]
    pub fn analysis(&self) -> Option<AnalysisResult> {
        self.analysis.current()
    }

    /// Open the backend's account-connection flow and invalidate the cached
    /// profile so its connection flag is refetched. Returns the URL opened.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] when nobody is signed in, or
    /// [`ClientError::Connect`] if the URL cannot be built or opened.
    pub fn begin_external_connect(
        &self,
        launcher: &dyn ConnectLauncher,
    ) -> Result<String, ClientError> {
        let subject = self.subject()?;
        let url = self
            .backend
            .connect_url()
            .map_err(|error| ClientError::Connect(error.to_string()))?;
        launcher.launch(&url).map_err(ClientError::Connect)?;
        tracing::info!(subject = subject.as_str(), "external connect flow opened");
        self.profiles.invalidate(&subject);
        Ok(url)
    }

    /// Events for the displayed identity only.
    #[must_use]
    pub fn events(&self) -> EventFeed {
        self.events.feed(self.session.watch())
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Auth`] if the provider cannot clear credentials.
    pub fn sign_out(&self) -> Result<(), ClientError> {
        Ok(self.session.sign_out()?)
    }
}

impl std::fmt::Debug for FinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinanceClient")
            .field("session", &self.session.current())
            .finish_non_exhaustive()
    }
}
