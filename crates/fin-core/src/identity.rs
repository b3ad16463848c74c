use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Opaque, stable identifier of an authenticated subject (the identity
/// provider's `sub` claim).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Wrap a raw subject id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptySubject`] if `raw` is empty or whitespace.
    pub fn new(raw: impl Into<String>) -> Result<Self, CoreError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(CoreError::EmptySubject);
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lightweight authenticated identity for cross-crate passing.
///
/// Produced by `fin-auth` identity providers, keyed on by every per-identity
/// slot in `fin-sync`. Contains only data fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Identity provider subject id.
    pub subject: SubjectId,
    /// Email address reported by the identity provider, if any.
    pub email: Option<String>,
}

impl Identity {
    #[must_use]
    pub const fn new(subject: SubjectId, email: Option<String>) -> Self {
        Self { subject, email }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_rejects_blank() {
        assert_eq!(SubjectId::new("  "), Err(CoreError::EmptySubject));
        assert_eq!(SubjectId::new(""), Err(CoreError::EmptySubject));
    }

    #[test]
    fn subject_serializes_as_plain_string() {
        let subject = SubjectId::new("uid_42").expect("valid subject");
        let json = serde_json::to_string(&subject).expect("serialize");
        assert_eq!(json, r#""uid_42""#);
        assert_eq!(subject.to_string(), "uid_42");
    }
}
