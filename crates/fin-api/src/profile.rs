//! Profile endpoints: lookup and registration.

use chrono::{DateTime, Utc};
use fin_core::{SubjectId, UserProfile};
use serde::{Deserialize, Serialize};

use crate::{BackendClient, error::ApiError, http::check_response};

#[derive(Serialize)]
struct UidRequest<'a> {
    uid: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct UserResponse {
    full_name: String,
    email: String,
    #[serde(default)]
    occupation: Option<String>,
    #[serde(default)]
    salary: Option<i64>,
    #[serde(default)]
    marital_status: Option<String>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    google_access_token: Option<String>,
    #[serde(default)]
    last_email_sync: Option<DateTime<Utc>>,
}

impl UserResponse {
    /// Map onto the domain profile. The access token is reduced to a flag.
    pub(crate) fn into_profile(self, subject: SubjectId) -> UserProfile {
        UserProfile {
            subject,
            full_name: self.full_name,
            email: self.email,
            occupation: self.occupation,
            salary: self.salary,
            marital_status: self.marital_status,
            gender: self.gender,
            google_connected: self
                .google_access_token
                .is_some_and(|token| !token.trim().is_empty()),
            last_email_sync: self.last_email_sync,
        }
    }
}

/// Registration payload for `create-profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProfile {
    #[serde(rename = "firebase_uid")]
    pub subject: SubjectId,
    pub full_name: String,
    pub email: String,
    pub occupation: String,
    pub salary: i64,
    pub marital_status: String,
    pub gender: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl BackendClient {
    /// Fetch the profile for `subject`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails, the backend returns a
    /// non-success status (404 for unknown subjects), or the body cannot be
    /// parsed.
    pub async fn get_user(&self, subject: &SubjectId) -> Result<UserProfile, ApiError> {
        let url = self.endpoint("api/get-user")?;
        tracing::debug!(%subject, "fetching profile");
        let resp = check_response(
            self.http
                .post(url)
                .json(&UidRequest {
                    uid: subject.as_str(),
                })
                .send()
                .await?,
        )
        .await?;

        let body = resp.text().await?;
        let data: UserResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Parse(format!("get-user: {e}")))?;
        Ok(data.into_profile(subject.clone()))
    }

    /// Register a profile for a freshly signed-up identity.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails or the backend rejects the
    /// profile (e.g. duplicate email).
    pub async fn create_profile(&self, profile: &NewProfile) -> Result<String, ApiError> {
        let url = self.endpoint("api/create-profile/")?;
        let resp = check_response(self.http.post(url).json(profile).send().await?).await?;
        let data: StatusResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::Parse(format!("create-profile: {e}")))?;
        if data.status.as_deref() == Some("error") {
            return Err(ApiError::Api {
                status: 200,
                message: data.message.unwrap_or_default(),
            });
        }
        Ok(data
            .message
            .unwrap_or_else(|| "Profile created successfully.".into()))
    }
}
