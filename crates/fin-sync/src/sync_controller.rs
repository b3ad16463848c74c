//! Manual sync jobs, at most one in flight per identity.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fin_api::FinanceBackend;
use fin_core::{ClientEvent, SubjectId, SyncState};
use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error::{GENERIC_SYNC_FAILURE, SyncError};
use crate::events::EventBus;
use crate::profile_repository::ProfileRepository;

type SyncJob = Shared<BoxFuture<'static, SyncState>>;

const DEFAULT_SUCCESS: &str = "Sync complete.";

#[derive(Default)]
struct SyncTable {
    states: HashMap<SubjectId, SyncState>,
    in_flight: HashMap<SubjectId, SyncJob>,
}

/// Handle on a sync job started (or joined) by [`SyncController::trigger`].
#[must_use = "a sync ticket does nothing unless awaited; the job runs regardless"]
pub struct SyncTicket {
    subject: SubjectId,
    joined: bool,
    job: SyncJob,
}

impl SyncTicket {
    /// Identity the job runs for.
    pub const fn subject(&self) -> &SubjectId {
        &self.subject
    }

    /// `true` when this trigger attached to a job that was already running.
    pub const fn joined(&self) -> bool {
        self.joined
    }

    /// Wait for the job to settle.
    pub async fn outcome(self) -> SyncState {
        self.job.await
    }
}

impl std::fmt::Debug for SyncTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncTicket")
            .field("subject", &self.subject)
            .field("joined", &self.joined)
            .finish_non_exhaustive()
    }
}

/// Runs the backend's manual sync for an identity.
///
/// The outcome is recorded against the identity the job was started for,
/// even if the session has moved on by the time it settles. On settle the
/// identity's cached profile is invalidated so the last-synced timestamp is
/// refetched.
pub struct SyncController {
    backend: Arc<dyn FinanceBackend>,
    profiles: Arc<ProfileRepository>,
    events: EventBus,
    table: Arc<Mutex<SyncTable>>,
}

impl SyncController {
    #[must_use]
    pub fn new(
        backend: Arc<dyn FinanceBackend>,
        profiles: Arc<ProfileRepository>,
        events: EventBus,
    ) -> Self {
        Self {
            backend,
            profiles,
            events,
            table: Arc::new(Mutex::new(SyncTable::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SyncTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a sync for `subject`, or join the one already running.
    pub fn trigger(&self, subject: &SubjectId) -> SyncTicket {
        let mut table = self.lock();
        if let Some(job) = table.in_flight.get(subject) {
            tracing::debug!(subject = subject.as_str(), "sync already in progress; joining");
            return SyncTicket {
                subject: subject.clone(),
                joined: true,
                job: job.clone(),
            };
        }

        tracing::info!(subject = subject.as_str(), "starting manual sync");
        table.states.insert(subject.clone(), SyncState::InProgress);
        self.events.emit(ClientEvent::SyncStateChanged {
            subject: subject.clone(),
            state: SyncState::InProgress,
        });

        let backend = Arc::clone(&self.backend);
        let guard = JobGuard {
            table: Arc::clone(&self.table),
            profiles: Arc::clone(&self.profiles),
            events: self.events.clone(),
            subject: subject.clone(),
            outcome: None,
        };
        let task = tokio::spawn(async move {
            let state = match backend.trigger_sync(&guard.subject).await {
                Ok(receipt) if receipt.message.trim().is_empty() => {
                    SyncState::Succeeded(DEFAULT_SUCCESS.to_string())
                }
                Ok(receipt) => SyncState::Succeeded(receipt.message),
                Err(error) => {
                    let error = SyncError::from(error);
                    tracing::warn!(subject = guard.subject.as_str(), %error, "manual sync failed");
                    SyncState::Failed(error.user_message())
                }
            };
            guard.finish(state.clone());
            state
        });

        let job = async move {
            task.await.unwrap_or_else(|error| {
                tracing::error!(%error, "sync task aborted");
                SyncState::Failed(GENERIC_SYNC_FAILURE.to_string())
            })
        }
        .boxed()
        .shared();
        table.in_flight.insert(subject.clone(), job.clone());

        SyncTicket {
            subject: subject.clone(),
            joined: false,
            job,
        }
    }

    /// Latest state for `subject`; `Idle` if it never synced.
    #[must_use]
    pub fn state(&self, subject: &SubjectId) -> SyncState {
        self.lock().states.get(subject).cloned().unwrap_or_default()
    }
}

/// Settles a sync job when dropped: records the outcome, releases the
/// in-flight slot, invalidates the identity's profile and emits the change.
/// A job that panics or is aborted is dropped without an outcome and
/// settles as failed.
struct JobGuard {
    table: Arc<Mutex<SyncTable>>,
    profiles: Arc<ProfileRepository>,
    events: EventBus,
    subject: SubjectId,
    outcome: Option<SyncState>,
}

impl JobGuard {
    fn finish(mut self, state: SyncState) {
        self.outcome = Some(state);
    }
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        let state = self.outcome.take().unwrap_or_else(|| {
            tracing::error!(subject = self.subject.as_str(), "sync job ended without an outcome");
            SyncState::Failed(GENERIC_SYNC_FAILURE.to_string())
        });
        {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table.states.insert(self.subject.clone(), state.clone());
            table.in_flight.remove(&self.subject);
        }
        self.profiles.invalidate(&self.subject);
        tracing::info!(subject = self.subject.as_str(), ?state, "manual sync settled");
        self.events.emit(ClientEvent::SyncStateChanged {
            subject: self.subject.clone(),
            state,
        });
    }
}
