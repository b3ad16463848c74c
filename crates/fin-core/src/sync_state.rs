use serde::{Deserialize, Serialize};

/// State of the manual sync job for one identity.
///
/// ```text
/// idle → in_progress → succeeded(message)
///                    → failed(message)
/// succeeded | failed → in_progress   (a new trigger is always accepted)
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "message")]
pub enum SyncState {
    #[default]
    Idle,
    InProgress,
    Succeeded(String),
    Failed(String),
}

impl SyncState {
    /// The success or failure message of a settled job.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Succeeded(message) | Self::Failed(message) => Some(message),
            Self::Idle | Self::InProgress => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_settled_states_carry_a_message() {
        assert_eq!(SyncState::Idle.message(), None);
        assert_eq!(SyncState::InProgress.message(), None);
        assert_eq!(SyncState::Succeeded("ok".into()).message(), Some("ok"));
        assert_eq!(SyncState::Failed("no".into()).message(), Some("no"));
    }

    #[test]
    fn serializes_with_tag_and_message() {
        let json = serde_json::to_value(SyncState::Failed("not connected".into()))
            .expect("serialize");
        assert_eq!(json["state"], "failed");
        assert_eq!(json["message"], "not connected");
    }
}
