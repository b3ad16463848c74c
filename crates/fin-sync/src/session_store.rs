//! Projection of identity provider events into [`Session`] values.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use fin_auth::{AuthError, IdentityEvent, IdentityProvider, ProviderSubscription};
use fin_core::Session;
use tokio::sync::watch;

/// Handler invoked with every new [`Session`].
pub type SessionHandler = Arc<dyn Fn(&Session) + Send + Sync>;

struct HandlerEntry {
    id: u64,
    active: Arc<AtomicBool>,
    handler: SessionHandler,
}

struct StoreState {
    diagnostic: Option<String>,
    next_handler: u64,
    handlers: Vec<HandlerEntry>,
}

struct StoreInner {
    state: Mutex<StoreState>,
    session: watch::Sender<Session>,
}

impl StoreInner {
    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, event: IdentityEvent) {
        let (session, handlers) = {
            let mut state = self.lock();
            let revision = self.session.borrow().revision + 1;
            let session = match event {
                Ok(Some(identity)) => {
                    state.diagnostic = None;
                    Session::authenticated(identity, revision)
                }
                Ok(None) => {
                    state.diagnostic = None;
                    Session::unauthenticated(revision)
                }
                Err(error) => {
                    tracing::warn!(%error, "identity provider failed; treating as signed out");
                    state.diagnostic = Some(error.to_string());
                    Session::unauthenticated(revision)
                }
            };
            // Replace under the lock so concurrent provider events apply in order.
            self.session.send_replace(session.clone());
            let handlers: Vec<_> = state
                .handlers
                .iter()
                .map(|entry| (Arc::clone(&entry.active), Arc::clone(&entry.handler)))
                .collect();
            (session, handlers)
        };

        tracing::debug!(
            revision = session.revision,
            status = ?session.status,
            subject = session.subject().map(fin_core::SubjectId::as_str),
            "session changed"
        );

        for (active, handler) in handlers {
            if active.load(Ordering::Acquire) {
                handler(&session);
            }
        }
    }
}

/// Single source of "who is logged in".
///
/// Starts `Initializing` and moves to `Authenticated` or `Unauthenticated`
/// once the provider delivers its first event, which it does from within
/// [`connect`](Self::connect). Each provider event bumps
/// [`Session::revision`]. Provider failures become `Unauthenticated`, with the
/// failure kept on the side as [`diagnostic`](Self::diagnostic).
pub struct SessionStore {
    inner: Arc<StoreInner>,
    provider: Arc<dyn IdentityProvider>,
    _provider_subscription: ProviderSubscription,
}

impl SessionStore {
    /// Subscribe to `provider` and start tracking its identity.
    ///
    /// The provider subscription lives as long as the returned store.
    #[must_use]
    pub fn connect(provider: Arc<dyn IdentityProvider>) -> Arc<Self> {
        let (session, _rx) = watch::channel(Session::initializing());
        let inner = Arc::new(StoreInner {
            state: Mutex::new(StoreState {
                diagnostic: None,
                next_handler: 0,
                handlers: Vec::new(),
            }),
            session,
        });

        let weak: Weak<StoreInner> = Arc::downgrade(&inner);
        let subscription = provider.subscribe(Arc::new(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.apply(event);
            }
        }));

        Arc::new(Self {
            inner,
            provider,
            _provider_subscription: subscription,
        })
    }

    /// The latest session.
    #[must_use]
    pub fn current(&self) -> Session {
        self.inner.session.borrow().clone()
    }

    /// A receiver that always holds the latest session.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Session> {
        self.inner.session.subscribe()
    }

    /// The provider failure behind the current `Unauthenticated` session,
    /// if that is why it is unauthenticated.
    #[must_use]
    pub fn diagnostic(&self) -> Option<String> {
        self.inner.lock().diagnostic.clone()
    }

    /// Register `handler` for every session change.
    ///
    /// The handler is invoked once immediately with the current session.
    /// After the returned subscription is disposed (or dropped) it is never
    /// invoked again.
    pub fn on_change(
        &self,
        handler: impl Fn(&Session) + Send + Sync + 'static,
    ) -> SessionSubscription {
        let handler: SessionHandler = Arc::new(handler);
        let active = Arc::new(AtomicBool::new(true));
        let id = {
            let mut state = self.inner.lock();
            let id = state.next_handler;
            state.next_handler += 1;
            state.handlers.push(HandlerEntry {
                id,
                active: Arc::clone(&active),
                handler: Arc::clone(&handler),
            });
            id
        };

        let current = self.current();
        handler(&current);

        SessionSubscription {
            id,
            active,
            store: Arc::downgrade(&self.inner),
        }
    }

    /// Number of live handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.inner.lock().handlers.len()
    }

    /// Ask the provider to end the session. The resulting `Unauthenticated`
    /// session arrives through the usual change path.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the provider cannot clear its credentials.
    pub fn sign_out(&self) -> Result<(), AuthError> {
        self.provider.sign_out()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.inner.session.borrow())
            .finish_non_exhaustive()
    }
}

/// Scoped registration returned by [`SessionStore::on_change`].
#[must_use = "dropping the subscription disposes the handler immediately"]
pub struct SessionSubscription {
    id: u64,
    active: Arc<AtomicBool>,
    store: Weak<StoreInner>,
}

impl SessionSubscription {
    /// Detach the handler. Idempotent.
    pub fn dispose(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(inner) = self.store.upgrade() {
            inner.lock().handlers.retain(|entry| entry.id != self.id);
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for SessionSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSubscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use fin_auth::ChannelIdentityProvider;
    use fin_core::{Identity, SessionStatus, SubjectId};
    use pretty_assertions::assert_eq;

    use super::*;

    fn identity(raw: &str) -> Identity {
        Identity::new(SubjectId::new(raw).expect("subject"), None)
    }

    #[test]
    fn first_provider_event_resolves_initializing() {
        let provider = ChannelIdentityProvider::with_initial(Ok(Some(identity("alice"))));
        let store = SessionStore::connect(Arc::new(provider));
        let session = store.current();
        assert_eq!(session.status, SessionStatus::Authenticated);
        assert_eq!(session.subject().map(SubjectId::as_str), Some("alice"));
        assert_eq!(session.revision, 1);
    }

    #[test]
    fn each_event_bumps_revision() {
        let provider = ChannelIdentityProvider::new();
        let store = SessionStore::connect(Arc::new(provider.clone()));
        assert_eq!(store.current().status, SessionStatus::Unauthenticated);

        provider.sign_in(identity("a"));
        provider.sign_in(identity("b"));
        provider.sign_out_now();
        let session = store.current();
        assert_eq!(session.status, SessionStatus::Unauthenticated);
        assert_eq!(session.revision, 4);
    }

    #[test]
    fn provider_failure_is_unauthenticated_with_diagnostic() {
        let provider = ChannelIdentityProvider::with_initial(Ok(Some(identity("a"))));
        let store = SessionStore::connect(Arc::new(provider.clone()));
        provider.fail(AuthError::ProviderUnavailable("offline".into()));

        assert_eq!(store.current().status, SessionStatus::Unauthenticated);
        assert!(store.diagnostic().is_some_and(|d| d.contains("offline")));

        provider.sign_in(identity("a"));
        assert!(store.diagnostic().is_none());
    }

    #[test]
    fn handler_fires_immediately_and_on_change() {
        let provider = ChannelIdentityProvider::new();
        let store = SessionStore::connect(Arc::new(provider.clone()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = store.on_change(move |session| {
            sink.lock()
                .unwrap()
                .push(session.subject().map(|s| s.as_str().to_string()));
        });

        provider.sign_in(identity("a"));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("a".to_string())]
        );
    }

    #[test]
    fn disposed_handler_is_never_invoked() {
        let provider = ChannelIdentityProvider::new();
        let store = SessionStore::connect(Arc::new(provider.clone()));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sub = store.on_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(store.handler_count(), 1);

        sub.dispose();
        sub.dispose();
        provider.sign_in(identity("a"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.handler_count(), 0);
    }

    #[test]
    fn dropping_store_detaches_from_provider() {
        let provider = ChannelIdentityProvider::new();
        let store = SessionStore::connect(Arc::new(provider.clone()));
        assert_eq!(provider.subscriber_count(), 1);
        drop(store);
        assert_eq!(provider.subscriber_count(), 0);
    }

    #[test]
    fn sign_out_goes_through_provider() {
        let provider = ChannelIdentityProvider::with_initial(Ok(Some(identity("a"))));
        let store = SessionStore::connect(Arc::new(provider));
        store.sign_out().expect("sign out");
        assert!(!store.current().is_authenticated());
    }
}
