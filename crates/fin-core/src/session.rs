use serde::{Deserialize, Serialize};

use crate::identity::{Identity, SubjectId};

/// Lifecycle of the process-wide session.
///
/// ```text
/// initializing → authenticated ⇄ unauthenticated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Initializing,
    Authenticated,
    Unauthenticated,
}

/// Snapshot of "who is logged in".
///
/// `revision` increases by one on every identity provider event, so two
/// snapshots with the same subject but different revisions still compare as
/// distinct observations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Option<Identity>,
    pub status: SessionStatus,
    pub revision: u64,
}

impl Session {
    /// The state every process starts in, before the provider has reported.
    #[must_use]
    pub const fn initializing() -> Self {
        Self {
            identity: None,
            status: SessionStatus::Initializing,
            revision: 0,
        }
    }

    #[must_use]
    pub const fn authenticated(identity: Identity, revision: u64) -> Self {
        Self {
            identity: Some(identity),
            status: SessionStatus::Authenticated,
            revision,
        }
    }

    #[must_use]
    pub const fn unauthenticated(revision: u64) -> Self {
        Self {
            identity: None,
            status: SessionStatus::Unauthenticated,
            revision,
        }
    }

    #[must_use]
    pub fn subject(&self) -> Option<&SubjectId> {
        self.identity.as_ref().map(|identity| &identity.subject)
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.status, SessionStatus::Authenticated)
    }
}
