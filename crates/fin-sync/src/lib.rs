//! # fin-sync
//!
//! The session-aware data synchronization core of finsight.
//!
//! Components, leaf-first:
//! - [`SessionStore`]: projects identity provider events into [`Session`]
//!   values and fans them out to scoped subscribers
//! - [`ProfileRepository`]: per-identity profile cache with request
//!   coalescing and abandonment of fetches for superseded identities
//! - [`SyncController`]: at-most-one manual sync job per identity
//! - [`AnalysisQueryController`]: monthly analysis with superseded-response
//!   discard
//! - [`FinanceClient`]: wires the above together and exposes a filtered
//!   [`EventFeed`]
//!
//! Staleness is handled with generation counters (fetch tickets, query
//! sequence numbers) rather than "is latest" flags. Discarded results are
//! dropped silently apart from a `debug` log line.
//!
//! Everything that starts network work spawns onto the ambient Tokio
//! runtime, so these types must be driven from within one.
//!
//! [`Session`]: fin_core::Session

mod analysis_controller;
mod client;
mod error;
mod events;
mod profile_repository;
mod session_store;
mod sync_controller;

pub use analysis_controller::{AnalysisQueryController, QueryOutcome, QueryTicket};
pub use client::{ConnectLauncher, FinanceClient};
pub use error::{AnalysisQueryError, ClientError, ProfileFetchError, SyncError};
pub use events::{EventBus, EventFeed};
pub use profile_repository::ProfileRepository;
pub use session_store::{SessionHandler, SessionStore, SessionSubscription};
pub use sync_controller::{SyncController, SyncTicket};
