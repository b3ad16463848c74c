//! Manual sync endpoint.

use fin_core::SubjectId;
use serde::{Deserialize, Serialize};

use crate::{BackendClient, error::ApiError, http::check_response};

#[derive(Serialize)]
struct SyncRequest<'a> {
    uid: &'a str,
}

/// Outcome reported by a completed sync job.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncReceipt {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl SyncReceipt {
    pub(crate) fn into_result(self) -> Result<Self, ApiError> {
        if self.status.as_deref() == Some("error") {
            return Err(ApiError::Api {
                status: 200,
                message: self.message,
            });
        }
        Ok(self)
    }
}

impl BackendClient {
    /// Run the ingestion job for `subject`. The backend responds only once
    /// the job has finished.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`] with the server's reason (e.g. account not
    /// connected) on rejection, or a transport/parse error.
    pub async fn manual_sync(&self, subject: &SubjectId) -> Result<SyncReceipt, ApiError> {
        let url = self.endpoint("api/manual-sync/")?;
        tracing::debug!(%subject, "starting manual sync");
        let resp = check_response(
            self.http
                .post(url)
                .json(&SyncRequest {
                    uid: subject.as_str(),
                })
                .send()
                .await?,
        )
        .await?;

        let receipt: SyncReceipt = resp
            .json()
            .await
            .map_err(|e| ApiError::Parse(format!("manual-sync: {e}")))?;
        receipt.into_result()
    }
}
