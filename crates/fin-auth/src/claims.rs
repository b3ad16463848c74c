use base64::Engine as _;
use chrono::{DateTime, Utc};
use fin_core::{Identity, SubjectId};

use crate::error::AuthError;

/// Claims read from an identity provider ID token.
///
/// The signature is NOT verified here: the token is only ever presented back
/// to the identity provider and the backend, which do their own
/// verification. Decoding exists to learn who is signed in and when the
/// token lapses.
#[derive(Debug, Clone)]
pub struct IdTokenClaims {
    /// Subject id (`sub` claim).
    pub subject: String,
    /// `email` claim, if present.
    pub email: Option<String>,
    /// Token expiration time (from `exp` claim).
    pub expires_at: DateTime<Utc>,
}

impl IdTokenClaims {
    /// Decode the payload segment of a compact JWT.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is not three
    /// dot-separated segments, the payload is not base64url JSON, or the
    /// `sub`/`exp` claims are missing.
    pub fn decode(jwt: &str) -> Result<Self, AuthError> {
        let mut parts = jwt.trim().split('.');
        let (Some(_header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken("invalid JWT format".into()));
        };

        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AuthError::InvalidToken(format!("base64 decode failed: {e}")))?;
        let value: serde_json::Value = serde_json::from_slice(&payload)
            .map_err(|e| AuthError::InvalidToken(format!("JSON parse failed: {e}")))?;

        let subject = value["sub"]
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::InvalidToken("missing sub claim".into()))?
            .to_string();
        let exp = value["exp"]
            .as_i64()
            .ok_or_else(|| AuthError::InvalidToken("missing exp claim".into()))?;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| AuthError::InvalidToken("invalid exp timestamp".into()))?;
        let email = value["email"].as_str().map(str::to_string);

        Ok(Self {
            subject,
            email,
            expires_at,
        })
    }

    /// Convert to the cross-crate `Identity` value.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the subject is blank.
    pub fn to_identity(&self) -> Result<Identity, AuthError> {
        let subject = SubjectId::new(self.subject.clone())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(Identity::new(subject, self.email.clone()))
    }

    /// Check if the token is expired or expires within `buffer_secs`.
    #[must_use]
    pub fn is_near_expiry(&self, buffer_secs: i64) -> bool {
        let threshold = Utc::now() + chrono::TimeDelta::seconds(buffer_secs);
        self.expires_at <= threshold
    }
}

#[cfg(test)]
pub(crate) mod test_tokens {
    use base64::Engine as _;

    /// Build an unsigned compact JWT with the given payload JSON.
    pub fn jwt(payload: &str) -> String {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let header = engine.encode(r#"{"alg":"RS256"}"#);
        let payload = engine.encode(payload);
        let signature = engine.encode("fake_sig");
        format!("{header}.{payload}.{signature}")
    }

    pub fn jwt_for(sub: &str, email: &str, exp: i64) -> String {
        jwt(&format!(r#"{{"sub":"{sub}","email":"{email}","exp":{exp}}}"#))
    }
}

#[cfg(test)]
mod tests {
    use super::test_tokens::{jwt, jwt_for};
    use super::*;

    #[test]
    fn decode_valid_token() {
        let exp = Utc::now().timestamp() + 3600;
        let claims = IdTokenClaims::decode(&jwt_for("uid_1", "a@example.com", exp))
            .expect("should decode");
        assert_eq!(claims.subject, "uid_1");
        assert_eq!(claims.email.as_deref(), Some("a@example.com"));
        assert_eq!(claims.expires_at.timestamp(), exp);
        assert!(!claims.is_near_expiry(60));
    }

    #[test]
    fn decode_expired_token_is_near_expiry() {
        let exp = Utc::now().timestamp() - 10;
        let claims = IdTokenClaims::decode(&jwt_for("uid_1", "a@example.com", exp))
            .expect("should decode");
        assert!(claims.is_near_expiry(0));
    }

    #[test]
    fn decode_rejects_wrong_segment_count() {
        let err = IdTokenClaims::decode("not-a-jwt").unwrap_err();
        assert!(err.to_string().contains("invalid JWT format"));
        let err = IdTokenClaims::decode("a.b.c.d").unwrap_err();
        assert!(err.to_string().contains("invalid JWT format"));
    }

    #[test]
    fn decode_rejects_missing_sub() {
        let err = IdTokenClaims::decode(&jwt(r#"{"exp":1}"#)).unwrap_err();
        assert!(err.to_string().contains("missing sub claim"));
    }

    #[test]
    fn decode_rejects_missing_exp() {
        let err = IdTokenClaims::decode(&jwt(r#"{"sub":"x"}"#)).unwrap_err();
        assert!(err.to_string().contains("missing exp claim"));
    }

    #[test]
    fn decode_rejects_bad_base64() {
        let err = IdTokenClaims::decode("header.!!!invalid!!!.signature").unwrap_err();
        assert!(err.to_string().contains("base64 decode failed"));
    }

    #[test]
    fn to_identity_maps_fields() {
        let claims = IdTokenClaims {
            subject: "uid_9".into(),
            email: None,
            expires_at: Utc::now(),
        };
        let identity = claims.to_identity().expect("identity");
        assert_eq!(identity.subject.as_str(), "uid_9");
        assert!(identity.email.is_none());
    }
}
