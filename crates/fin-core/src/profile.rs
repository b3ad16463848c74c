use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::SubjectId;

/// Server-held user record, distinct from the identity provider's record.
///
/// The external-account access token is never carried on the client; only
/// whether one is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub subject: SubjectId,
    pub full_name: String,
    pub email: String,
    pub occupation: Option<String>,
    pub salary: Option<i64>,
    pub marital_status: Option<String>,
    pub gender: Option<String>,
    /// Whether the mail account used for transaction ingestion is connected.
    pub google_connected: bool,
    pub last_email_sync: Option<DateTime<Utc>>,
}

/// Derived connection state of the mail account behind the sync job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ConnectionStatus {
    Disconnected,
    ConnectedNeverSynced,
    Synced { at: DateTime<Utc> },
}

impl UserProfile {
    #[must_use]
    pub fn connection_status(&self) -> ConnectionStatus {
        match (self.google_connected, self.last_email_sync) {
            (false, _) => ConnectionStatus::Disconnected,
            (true, None) => ConnectionStatus::ConnectedNeverSynced,
            (true, Some(at)) => ConnectionStatus::Synced { at },
        }
    }
}

/// Per-identity profile cache slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "value")]
pub enum ProfileSlot {
    /// Nothing fetched yet (or invalidated).
    #[default]
    Empty,
    /// A fetch is in flight.
    Pending,
    Ready(UserProfile),
    /// Terminal until the next explicit `get_profile` call.
    Failed(String),
}

impl ProfileSlot {
    #[must_use]
    pub const fn profile(&self) -> Option<&UserProfile> {
        match self {
            Self::Ready(profile) => Some(profile),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}
