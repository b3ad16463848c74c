//! Typed events published by the synchronization core.

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::identity::SubjectId;
use crate::profile::ProfileSlot;
use crate::session::Session;
use crate::sync_state::SyncState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum ClientEvent {
    SessionChanged {
        session: Session,
    },
    ProfileUpdated {
        subject: SubjectId,
        slot: ProfileSlot,
    },
    SyncStateChanged {
        subject: SubjectId,
        state: SyncState,
    },
    AnalysisUpdated {
        result: AnalysisResult,
    },
}

impl ClientEvent {
    /// The identity an event is attributed to, if any.
    ///
    /// Session changes are global and return `None`.
    #[must_use]
    pub const fn subject(&self) -> Option<&SubjectId> {
        match self {
            Self::SessionChanged { .. } => None,
            Self::ProfileUpdated { subject, .. } | Self::SyncStateChanged { subject, .. } => {
                Some(subject)
            }
            Self::AnalysisUpdated { result } => Some(&result.query.subject),
        }
    }
}
