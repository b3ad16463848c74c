use fin_core::{ConnectionStatus, UserProfile};
use fin_sync::{ClientError, ProfileFetchError};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ProfileArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
pub(crate) struct ProfileView {
    subject: String,
    full_name: String,
    email: String,
    occupation: Option<String>,
    salary: Option<i64>,
    marital_status: Option<String>,
    gender: Option<String>,
    connection: &'static str,
    last_email_sync: Option<String>,
}

impl From<&UserProfile> for ProfileView {
    fn from(profile: &UserProfile) -> Self {
        Self {
            subject: profile.subject.to_string(),
            full_name: profile.full_name.clone(),
            email: profile.email.clone(),
            occupation: profile.occupation.clone(),
            salary: profile.salary,
            marital_status: profile.marital_status.clone(),
            gender: profile.gender.clone(),
            connection: connection_label(profile.connection_status()),
            last_email_sync: profile.last_email_sync.map(|at| at.to_rfc3339()),
        }
    }
}

pub(crate) const fn connection_label(status: ConnectionStatus) -> &'static str {
    match status {
        ConnectionStatus::Disconnected => "disconnected",
        ConnectionStatus::ConnectedNeverSynced => "never_synced",
        ConnectionStatus::Synced { .. } => "synced",
    }
}

/// Turn a profile failure into a message with a next step where one exists.
pub(crate) fn explain(error: ClientError) -> anyhow::Error {
    match error {
        ClientError::Profile(ProfileFetchError::NotFound(reason)) => anyhow::anyhow!(
            "no profile yet ({reason}). Run 'finsight register' to create it"
        ),
        other => other.into(),
    }
}

pub async fn handle(
    args: &ProfileArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    ctx.require_subject()?;
    let profile = if args.refresh {
        ctx.client.reload_profile().await
    } else {
        ctx.client.load_profile().await
    }
    .map_err(explain)?;

    output(&ProfileView::from(&profile), flags.format)
}
