//! Monthly analysis queries with superseded-response discard.

use std::sync::{Arc, Mutex, PoisonError};

use fin_api::FinanceBackend;
use fin_core::{AnalysisQuery, AnalysisResult, AnalysisStatus, ClientEvent, Session, SubjectId};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::AnalysisQueryError;
use crate::events::EventBus;

/// What happened to a query's response.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The response was the latest and is now displayed.
    Applied(AnalysisResult),
    /// A newer query (or an identity change) superseded it; discarded.
    Superseded,
}

/// Handle on an issued analysis query.
#[derive(Debug)]
#[must_use = "a query ticket does nothing unless awaited; the query runs regardless"]
pub struct QueryTicket {
    seq: u64,
    task: JoinHandle<QueryOutcome>,
}

impl QueryTicket {
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Wait for the response to arrive and be applied or discarded.
    pub async fn settled(self) -> QueryOutcome {
        self.task.await.unwrap_or_else(|error| {
            tracing::error!(%error, "analysis task aborted");
            QueryOutcome::Superseded
        })
    }
}

struct QueryState {
    latest_seq: u64,
    subject: Option<SubjectId>,
}

/// Issues analysis queries and keeps exactly one displayed result.
///
/// Every query gets a strictly increasing sequence number. The displayed
/// result becomes `Pending` as soon as a query is issued; a response is
/// applied only if its sequence number is still the latest when it arrives.
/// Queries are only accepted for the identity last seen through
/// [`on_session_change`](Self::on_session_change).
pub struct AnalysisQueryController {
    backend: Arc<dyn FinanceBackend>,
    events: EventBus,
    state: Arc<Mutex<QueryState>>,
    displayed: Arc<watch::Sender<Option<AnalysisResult>>>,
}

impl AnalysisQueryController {
    #[must_use]
    pub fn new(backend: Arc<dyn FinanceBackend>, events: EventBus) -> Self {
        let (displayed, _rx) = watch::channel(None);
        Self {
            backend,
            events,
            state: Arc::new(Mutex::new(QueryState {
                latest_seq: 0,
                subject: None,
            })),
            displayed: Arc::new(displayed),
        }
    }

    /// Issue `query`, superseding any query still in flight.
    ///
    /// Returns `None`, without touching the displayed result or the
    /// backend, when `query` belongs to an identity other than the signed-in
    /// one.
    pub fn request(&self, query: AnalysisQuery) -> Option<QueryTicket> {
        let seq = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.subject.as_ref() != Some(&query.subject) {
                tracing::debug!(
                    subject = query.subject.as_str(),
                    "ignoring analysis query for an identity that is not signed in"
                );
                return None;
            }
            state.latest_seq += 1;
            let seq = state.latest_seq;
            let pending = AnalysisResult::pending(query.clone(), seq);
            self.displayed.send_replace(Some(pending.clone()));
            self.events.emit(ClientEvent::AnalysisUpdated { result: pending });
            seq
        };
        tracing::debug!(
            subject = query.subject.as_str(),
            month = query.month(),
            year = query.year(),
            seq,
            "requesting analysis"
        );

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let state = Arc::clone(&self.state);
        let displayed = Arc::clone(&self.displayed);
        let task = tokio::spawn(async move {
            let status = match backend.fetch_analysis(&query).await {
                Ok(payload) => AnalysisStatus::Ready(payload),
                Err(error) => {
                    let error = AnalysisQueryError::from(error);
                    tracing::warn!(%error, seq, "analysis query failed");
                    AnalysisStatus::Error(error.user_message())
                }
            };

            let state = state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.latest_seq != seq {
                tracing::debug!(seq, latest = state.latest_seq, "discarding superseded analysis");
                return QueryOutcome::Superseded;
            }
            let result = AnalysisResult { query, seq, status };
            displayed.send_replace(Some(result.clone()));
            events.emit(ClientEvent::AnalysisUpdated {
                result: result.clone(),
            });
            QueryOutcome::Applied(result)
        });

        Some(QueryTicket { seq, task })
    }

    /// The displayed result, if any query has been issued since the last
    /// identity change.
    #[must_use]
    pub fn current(&self) -> Option<AnalysisResult> {
        self.displayed.borrow().clone()
    }

    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Option<AnalysisResult>> {
        self.displayed.subscribe()
    }

    /// Supersede everything in flight and clear the displayed result.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.supersede_all(&mut state);
    }

    /// Reset when the session's identity differs from the one last seen.
    pub fn on_session_change(&self, session: &Session) {
        let next = session.subject().cloned();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.subject != next {
            tracing::debug!("identity changed; clearing analysis");
            state.subject = next;
            self.supersede_all(&mut state);
        }
    }

    fn supersede_all(&self, state: &mut QueryState) {
        state.latest_seq += 1;
        self.displayed.send_replace(None);
    }
}
