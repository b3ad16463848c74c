//! Backend error types.

use thiserror::Error;

/// Errors that can occur when talking to the finance backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status code, or an explicit
    /// `"status": "error"` body.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Server-reported reason, or the raw body when none is reported.
        message: String,
    },

    /// Failed to parse a backend response.
    #[error("parse error: {0}")]
    Parse(String),

    /// An endpoint URL could not be built from the configured base URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The backend returned a 429 Too Many Requests response.
    #[error("rate limited; retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },
}

impl ApiError {
    /// The reason the server gave for the failure, if it gave one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_only_for_non_empty_api_errors() {
        let err = ApiError::Api {
            status: 400,
            message: "Google account not connected.".into(),
        };
        assert_eq!(err.server_message(), Some("Google account not connected."));

        let blank = ApiError::Api {
            status: 500,
            message: "  ".into(),
        };
        assert!(blank.server_message().is_none());
        assert!(ApiError::Parse("bad".into()).server_message().is_none());
    }
}
