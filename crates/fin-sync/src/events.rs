//! Typed publish/subscribe for client state changes.

use fin_core::{ClientEvent, Session};
use tokio::sync::{broadcast, watch};

const DEFAULT_CAPACITY: usize = 256;

/// Broadcasts [`ClientEvent`]s to any number of feeds.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn emit(&self, event: ClientEvent) {
        let _ = self.tx.send(event);
    }

    /// Raw, unfiltered receiver.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    /// Receiver that only yields events for the displayed identity.
    #[must_use]
    pub fn feed(&self, session: watch::Receiver<Session>) -> EventFeed {
        EventFeed {
            rx: self.tx.subscribe(),
            session,
        }
    }
}

/// Event stream scoped to whichever identity the session currently shows.
///
/// Identity-attributed events (profile, sync, analysis) for any other
/// subject are skipped, so a sync that settles for a previous identity never
/// reaches a view rendering the current one.
#[derive(Debug)]
pub struct EventFeed {
    rx: broadcast::Receiver<ClientEvent>,
    session: watch::Receiver<Session>,
}

impl EventFeed {
    /// Next displayable event, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<ClientEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.is_displayed(&event) => return Some(event),
                Ok(event) => {
                    tracing::trace!(?event, "skipping event for non-displayed identity");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event feed lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<ClientEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.is_displayed(&event) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event feed lagged; events dropped");
                }
                Err(_) => return None,
            }
        }
    }

    fn is_displayed(&self, event: &ClientEvent) -> bool {
        event
            .subject()
            .is_none_or(|subject| self.session.borrow().subject() == Some(subject))
    }
}
