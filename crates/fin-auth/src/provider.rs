//! The identity provider capability and an in-memory implementation.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use fin_core::Identity;

use crate::error::AuthError;

/// One provider event: the current identity, `None` when signed out, or a
/// provider-level failure.
pub type IdentityEvent = Result<Option<Identity>, AuthError>;

/// Callback invoked with every provider event.
pub type IdentityCallback = Arc<dyn Fn(IdentityEvent) + Send + Sync>;

/// Source of "who is logged in".
///
/// Implementations must invoke the callback once, synchronously, from within
/// `subscribe` with the current state, then again on every change until the
/// returned subscription is dropped or unsubscribed.
pub trait IdentityProvider: Send + Sync {
    fn subscribe(&self, callback: IdentityCallback) -> ProviderSubscription;

    /// End the current session. Subscribers observe `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if stored credentials cannot be cleared.
    fn sign_out(&self) -> Result<(), AuthError>;
}

/// Disposer returned by [`IdentityProvider::subscribe`]. Detaches on drop.
#[must_use = "dropping the subscription detaches the callback immediately"]
pub struct ProviderSubscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl ProviderSubscription {
    pub fn new(detach: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Detach now. Idempotent.
    pub fn unsubscribe(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for ProviderSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for ProviderSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSubscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

// ── ChannelIdentityProvider ────────────────────────────────────────

struct ChannelState {
    current: IdentityEvent,
    next_id: u64,
    subscribers: Vec<(u64, IdentityCallback)>,
}

/// In-memory identity provider driven by explicit calls.
///
/// Cloning yields another handle onto the same provider.
#[derive(Clone)]
pub struct ChannelIdentityProvider {
    state: Arc<Mutex<ChannelState>>,
}

impl Default for ChannelIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelIdentityProvider {
    /// A provider that starts signed out.
    #[must_use]
    pub fn new() -> Self {
        Self::with_initial(Ok(None))
    }

    #[must_use]
    pub fn with_initial(initial: IdentityEvent) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChannelState {
                current: initial,
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    pub fn sign_in(&self, identity: Identity) {
        self.publish(Ok(Some(identity)));
    }

    pub fn sign_out_now(&self) {
        self.publish(Ok(None));
    }

    /// Report a provider-level failure (e.g. token verification lost network).
    pub fn fail(&self, error: AuthError) {
        self.publish(Err(error));
    }

    #[must_use]
    pub fn current(&self) -> IdentityEvent {
        self.lock().current.clone()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Replace the current state and deliver it to every subscriber.
    ///
    /// Callbacks run after the lock is released, so they may call back into
    /// the provider.
    pub fn publish(&self, event: IdentityEvent) {
        let subscribers = {
            let mut state = self.lock();
            state.current = event.clone();
            state
                .subscribers
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect::<Vec<_>>()
        };
        for callback in subscribers {
            callback(event.clone());
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IdentityProvider for ChannelIdentityProvider {
    fn subscribe(&self, callback: IdentityCallback) -> ProviderSubscription {
        let (id, current) = {
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.subscribers.push((id, Arc::clone(&callback)));
            (id, state.current.clone())
        };
        callback(current);

        let weak: Weak<Mutex<ChannelState>> = Arc::downgrade(&self.state);
        ProviderSubscription::new(move || {
            if let Some(state) = weak.upgrade() {
                state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .subscribers
                    .retain(|(sub_id, _)| *sub_id != id);
            }
        })
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_out_now();
        Ok(())
    }
}
