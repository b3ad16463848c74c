//! # fin-core
//!
//! Core types and error types for finsight.
//!
//! This crate provides the foundational types shared across all finsight crates:
//! - Identity and session values projected from the identity provider
//! - The server-held user profile and its per-identity cache slot
//! - Sync job state machine
//! - Analysis query/result values and the analysis payload
//! - Typed client events published by the synchronization core
//! - Cross-cutting error types

pub mod analysis;
pub mod errors;
pub mod events;
pub mod identity;
pub mod profile;
pub mod session;
pub mod sync_state;

pub use analysis::{
    AnalysisPayload, AnalysisQuery, AnalysisResult, AnalysisStatus, CategoryTotal, Totals,
    Transaction, TransactionType,
};
pub use errors::CoreError;
pub use events::ClientEvent;
pub use identity::{Identity, SubjectId};
pub use profile::{ConnectionStatus, ProfileSlot, UserProfile};
pub use session::{Session, SessionStatus};
pub use sync_state::SyncState;
