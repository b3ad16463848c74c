//! Per-identity profile cache with request coalescing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fin_api::FinanceBackend;
use fin_core::{ClientEvent, ProfileSlot, Session, SubjectId, UserProfile};
use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error::ProfileFetchError;
use crate::events::EventBus;

type ProfileFetch = Shared<BoxFuture<'static, Result<UserProfile, ProfileFetchError>>>;

struct InFlight {
    ticket: u64,
    fetch: ProfileFetch,
}

#[derive(Default)]
struct Slot {
    state: ProfileSlot,
    in_flight: Option<InFlight>,
}

#[derive(Default)]
struct RepoState {
    active: Option<SubjectId>,
    /// Bumped on every identity change.
    epoch: u64,
    next_ticket: u64,
    slots: HashMap<SubjectId, Slot>,
}

/// Holds at most one [`ProfileSlot`] per identity.
///
/// Concurrent requests for the same identity share one backend call. A fetch
/// carries a ticket; if the slot's ticket has moved on by the time the
/// response arrives (identity changed, slot invalidated) the response is
/// discarded.
pub struct ProfileRepository {
    backend: Arc<dyn FinanceBackend>,
    events: EventBus,
    state: Arc<Mutex<RepoState>>,
}

impl ProfileRepository {
    #[must_use]
    pub fn new(backend: Arc<dyn FinanceBackend>, events: EventBus) -> Self {
        Self {
            backend,
            events,
            state: Arc::new(Mutex::new(RepoState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RepoState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current slot for `subject`, starting a fetch when there is nothing
    /// usable. A `Failed` slot is cleared and refetched.
    ///
    /// Never blocks on the network; watch for `ProfileUpdated` events or use
    /// [`load_profile`](Self::load_profile) to wait.
    #[must_use]
    pub fn get_profile(&self, subject: &SubjectId) -> ProfileSlot {
        let mut state = self.lock();
        match state.slots.get(subject) {
            Some(Slot {
                state: ready @ ProfileSlot::Ready(_),
                ..
            }) => return ready.clone(),
            Some(Slot {
                in_flight: Some(_), ..
            }) => return ProfileSlot::Pending,
            _ => {}
        }
        let _ = self.start_fetch(&mut state, subject);
        ProfileSlot::Pending
    }

    /// Resolve the profile for `subject`, joining an in-flight fetch if one
    /// exists.
    ///
    /// A fetch abandoned by [`invalidate`](Self::invalidate) is followed by
    /// the replacement fetch; only an identity change abandons the caller.
    ///
    /// # Errors
    ///
    /// Returns the [`ProfileFetchError`] that failed the fetch, or
    /// [`ProfileFetchError::Abandoned`] if the identity changed before it
    /// settled.
    pub async fn load_profile(
        &self,
        subject: &SubjectId,
    ) -> Result<UserProfile, ProfileFetchError> {
        let epoch = self.lock().epoch;
        loop {
            let fetch = {
                let mut state = self.lock();
                if state.epoch != epoch {
                    return Err(ProfileFetchError::Abandoned);
                }
                match state.slots.get(subject) {
                    Some(Slot {
                        state: ProfileSlot::Ready(profile),
                        ..
                    }) => return Ok(profile.clone()),
                    Some(Slot {
                        in_flight: Some(in_flight),
                        ..
                    }) => in_flight.fetch.clone(),
                    _ => self.start_fetch(&mut state, subject),
                }
            };
            match fetch.await {
                Err(ProfileFetchError::Abandoned) => {
                    tracing::debug!(
                        subject = subject.as_str(),
                        "profile fetch abandoned; rejoining"
                    );
                }
                settled => return settled,
            }
        }
    }

    /// Current slot for `subject` without side effects.
    #[must_use]
    pub fn peek(&self, subject: &SubjectId) -> ProfileSlot {
        self.lock()
            .slots
            .get(subject)
            .map(|slot| slot.state.clone())
            .unwrap_or_default()
    }

    /// Drop the cached profile for `subject` and abandon any in-flight fetch,
    /// so the next [`get_profile`](Self::get_profile) refetches.
    pub fn invalidate(&self, subject: &SubjectId) {
        let mut state = self.lock();
        if state.slots.remove(subject).is_some() {
            tracing::debug!(subject = subject.as_str(), "profile invalidated");
            self.events.emit(ClientEvent::ProfileUpdated {
                subject: subject.clone(),
                slot: ProfileSlot::Empty,
            });
        }
    }

    /// Invalidate and immediately start a fresh fetch.
    #[must_use]
    pub fn refresh(&self, subject: &SubjectId) -> ProfileSlot {
        self.invalidate(subject);
        self.get_profile(subject)
    }

    /// React to a session change. When the identity differs from the one
    /// being served, every slot is dropped (abandoning in-flight fetches)
    /// and the new identity's profile is fetched fresh.
    pub fn on_session_change(&self, session: &Session) {
        let mut state = self.lock();
        let next = session.subject().cloned();
        if state.active == next {
            return;
        }
        let abandoned = state
            .slots
            .values()
            .filter(|slot| slot.in_flight.is_some())
            .count();
        tracing::debug!(
            from = state.active.as_ref().map(SubjectId::as_str),
            to = next.as_ref().map(SubjectId::as_str),
            abandoned,
            "identity changed; dropping cached profiles"
        );
        state.slots.clear();
        state.active.clone_from(&next);
        state.epoch += 1;
        if let Some(subject) = next {
            let _ = self.start_fetch(&mut state, &subject);
        }
    }

    /// The identity whose profile this repository is currently serving.
    #[must_use]
    pub fn active_subject(&self) -> Option<SubjectId> {
        self.lock().active.clone()
    }

    fn start_fetch(&self, state: &mut RepoState, subject: &SubjectId) -> ProfileFetch {
        let ticket = state.next_ticket;
        state.next_ticket += 1;

        let backend = Arc::clone(&self.backend);
        let guard = FetchGuard {
            state: Arc::clone(&self.state),
            events: self.events.clone(),
            subject: subject.clone(),
            ticket,
            armed: true,
        };
        let task = tokio::spawn(async move {
            let result = backend
                .fetch_profile(&guard.subject)
                .await
                .map_err(ProfileFetchError::from);
            guard.finish(result)
        });
        let fetch = async move {
            task.await
                .unwrap_or_else(|error| Err(ProfileFetchError::Network(error.to_string())))
        }
        .boxed()
        .shared();

        tracing::debug!(subject = subject.as_str(), ticket, "fetching profile");
        let slot = state.slots.entry(subject.clone()).or_default();
        slot.state = ProfileSlot::Pending;
        slot.in_flight = Some(InFlight {
            ticket,
            fetch: fetch.clone(),
        });
        self.events.emit(ClientEvent::ProfileUpdated {
            subject: subject.clone(),
            slot: ProfileSlot::Pending,
        });
        fetch
    }
}

/// Settles a fetch's slot. Dropped while still armed (the fetch panicked or
/// was aborted) it settles the slot as failed so the next request refetches.
struct FetchGuard {
    state: Arc<Mutex<RepoState>>,
    events: EventBus,
    subject: SubjectId,
    ticket: u64,
    armed: bool,
}

impl FetchGuard {
    fn finish(
        mut self,
        result: Result<UserProfile, ProfileFetchError>,
    ) -> Result<UserProfile, ProfileFetchError> {
        self.armed = false;
        settle(&self.state, &self.events, &self.subject, self.ticket, result)
    }
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        if self.armed {
            let error = ProfileFetchError::Network("profile fetch ended unexpectedly".into());
            let _ = settle(&self.state, &self.events, &self.subject, self.ticket, Err(error));
        }
    }
}

fn settle(
    state: &Mutex<RepoState>,
    events: &EventBus,
    subject: &SubjectId,
    ticket: u64,
    result: Result<UserProfile, ProfileFetchError>,
) -> Result<UserProfile, ProfileFetchError> {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(slot) = state
        .slots
        .get_mut(subject)
        .filter(|slot| slot.in_flight.as_ref().is_some_and(|f| f.ticket == ticket))
    else {
        tracing::debug!(subject = subject.as_str(), ticket, "discarding abandoned profile fetch");
        return Err(ProfileFetchError::Abandoned);
    };

    slot.in_flight = None;
    slot.state = match &result {
        Ok(profile) => ProfileSlot::Ready(profile.clone()),
        Err(error) => {
            tracing::warn!(subject = subject.as_str(), %error, "profile fetch failed");
            ProfileSlot::Failed(error.to_string())
        }
    };
    events.emit(ClientEvent::ProfileUpdated {
        subject: subject.clone(),
        slot: slot.state.clone(),
    });
    result
}
