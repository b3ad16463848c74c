//! Cross-cutting error types for finsight.
//!
//! Component errors (`AuthError`, `ApiError`, `SyncError`, ...) live in their
//! respective crates. This module only covers value validation.

use thiserror::Error;

/// Errors raised while constructing core values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Month outside `1..=12`.
    #[error("invalid month {0}: expected a value between 1 and 12")]
    InvalidMonth(u32),

    /// Subject identifiers must be non-empty.
    #[error("subject id must not be empty")]
    EmptySubject,

    /// Data failed validation (format, constraints).
    #[error("validation error: {0}")]
    Validation(String),
}
