//! Scripted in-memory backend: every call parks until the test resolves it.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use fin_api::{ApiError, FinanceBackend, SyncReceipt};
use fin_auth::ChannelIdentityProvider;
use fin_core::{AnalysisPayload, AnalysisQuery, Identity, SubjectId, UserProfile};
use tokio::sync::{mpsc, oneshot};

pub const CONNECT_URL: &str = "http://backend.test/app/google/connect/";

/// A backend call waiting for its response.
pub struct Parked<T> {
    pub key: String,
    reply: oneshot::Sender<Result<T, ApiError>>,
}

impl<T> Parked<T> {
    pub fn resolve(self, result: Result<T, ApiError>) {
        let _ = self.reply.send(result);
    }
}

pub struct ScriptedBackend {
    profile_calls: AtomicUsize,
    sync_calls: AtomicUsize,
    analysis_calls: AtomicUsize,
    profiles: mpsc::UnboundedSender<Parked<UserProfile>>,
    syncs: mpsc::UnboundedSender<Parked<SyncReceipt>>,
    analyses: mpsc::UnboundedSender<Parked<AnalysisPayload>>,
}

/// Test side of a [`ScriptedBackend`].
pub struct Controls {
    pub profiles: mpsc::UnboundedReceiver<Parked<UserProfile>>,
    pub syncs: mpsc::UnboundedReceiver<Parked<SyncReceipt>>,
    pub analyses: mpsc::UnboundedReceiver<Parked<AnalysisPayload>>,
}

impl Controls {
    pub async fn next_profile(&mut self) -> Parked<UserProfile> {
        self.profiles.recv().await.expect("profile call")
    }

    pub async fn next_sync(&mut self) -> Parked<SyncReceipt> {
        self.syncs.recv().await.expect("sync call")
    }

    pub async fn next_analysis(&mut self) -> Parked<AnalysisPayload> {
        self.analyses.recv().await.expect("analysis call")
    }
}

pub fn scripted() -> (Arc<ScriptedBackend>, Controls) {
    let (profiles_tx, profiles) = mpsc::unbounded_channel();
    let (syncs_tx, syncs) = mpsc::unbounded_channel();
    let (analyses_tx, analyses) = mpsc::unbounded_channel();
    let backend = ScriptedBackend {
        profile_calls: AtomicUsize::new(0),
        sync_calls: AtomicUsize::new(0),
        analysis_calls: AtomicUsize::new(0),
        profiles: profiles_tx,
        syncs: syncs_tx,
        analyses: analyses_tx,
    };
    (
        Arc::new(backend),
        Controls {
            profiles,
            syncs,
            analyses,
        },
    )
}

async fn park<T>(
    tx: &mpsc::UnboundedSender<Parked<T>>,
    key: String,
) -> Result<T, ApiError> {
    let (reply, rx) = oneshot::channel();
    tx.send(Parked { key, reply })
        .map_err(|_| ApiError::Parse("test dropped controls".into()))?;
    rx.await
        .unwrap_or_else(|_| Err(ApiError::Parse("test dropped parked call".into())))
}

impl ScriptedBackend {
    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    pub fn sync_calls(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }

    pub fn analysis_calls(&self) -> usize {
        self.analysis_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FinanceBackend for ScriptedBackend {
    async fn fetch_profile(&self, subject: &SubjectId) -> Result<UserProfile, ApiError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        park(&self.profiles, subject.as_str().to_string()).await
    }

    async fn trigger_sync(&self, subject: &SubjectId) -> Result<SyncReceipt, ApiError> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        park(&self.syncs, subject.as_str().to_string()).await
    }

    async fn fetch_analysis(&self, query: &AnalysisQuery) -> Result<AnalysisPayload, ApiError> {
        self.analysis_calls.fetch_add(1, Ordering::SeqCst);
        let key = format!(
            "{}:{}-{:02}",
            query.subject.as_str(),
            query.year(),
            query.month()
        );
        park(&self.analyses, key).await
    }

    fn connect_url(&self) -> Result<String, ApiError> {
        Ok(CONNECT_URL.to_string())
    }
}

/// Delegates to a [`ScriptedBackend`], except that the next profile or sync
/// call can be made to panic instead of returning.
pub struct PanickingBackend {
    inner: Arc<ScriptedBackend>,
    panic_profile: AtomicBool,
    panic_sync: AtomicBool,
}

impl PanickingBackend {
    pub fn new(inner: Arc<ScriptedBackend>) -> Self {
        Self {
            inner,
            panic_profile: AtomicBool::new(false),
            panic_sync: AtomicBool::new(false),
        }
    }

    pub fn panic_next_profile(self) -> Self {
        self.panic_profile.store(true, Ordering::SeqCst);
        self
    }

    pub fn panic_next_sync(self) -> Self {
        self.panic_sync.store(true, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl FinanceBackend for PanickingBackend {
    async fn fetch_profile(&self, subject: &SubjectId) -> Result<UserProfile, ApiError> {
        assert!(
            !self.panic_profile.swap(false, Ordering::SeqCst),
            "profile backend blew up"
        );
        self.inner.fetch_profile(subject).await
    }

    async fn trigger_sync(&self, subject: &SubjectId) -> Result<SyncReceipt, ApiError> {
        assert!(
            !self.panic_sync.swap(false, Ordering::SeqCst),
            "sync backend blew up"
        );
        self.inner.trigger_sync(subject).await
    }

    async fn fetch_analysis(&self, query: &AnalysisQuery) -> Result<AnalysisPayload, ApiError> {
        self.inner.fetch_analysis(query).await
    }

    fn connect_url(&self) -> Result<String, ApiError> {
        self.inner.connect_url()
    }
}

pub fn subject(raw: &str) -> SubjectId {
    SubjectId::new(raw).expect("subject")
}

pub fn identity(raw: &str) -> Identity {
    Identity::new(subject(raw), Some(format!("{raw}@example.com")))
}

pub fn signed_in(raw: &str) -> ChannelIdentityProvider {
    ChannelIdentityProvider::with_initial(Ok(Some(identity(raw))))
}

pub fn profile(raw: &str) -> UserProfile {
    UserProfile {
        subject: subject(raw),
        full_name: format!("User {raw}"),
        email: format!("{raw}@example.com"),
        occupation: None,
        salary: None,
        marital_status: None,
        gender: None,
        google_connected: true,
        last_email_sync: None,
    }
}

pub fn receipt(message: &str) -> SyncReceipt {
    SyncReceipt {
        status: Some("success".into()),
        message: message.into(),
    }
}

pub fn rejected(message: &str) -> ApiError {
    ApiError::Api {
        status: 400,
        message: message.into(),
    }
}
