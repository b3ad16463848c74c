use fin_core::SyncState;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SyncArgs;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Spinner;

#[derive(Serialize)]
struct SyncResponse {
    subject: String,
    state: &'static str,
    message: Option<String>,
    joined_running_job: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_email_sync: Option<String>,
}

const fn state_label(state: &SyncState) -> &'static str {
    match state {
        SyncState::Idle => "idle",
        SyncState::InProgress => "in_progress",
        SyncState::Succeeded(_) => "succeeded",
        SyncState::Failed(_) => "failed",
    }
}

pub async fn handle(args: &SyncArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let subject = ctx.require_subject()?;

    let spinner = Spinner::start("Syncing transactions from email…");
    let ticket = ctx.client.trigger_sync()?;
    let joined = ticket.joined();
    let state = ticket.outcome().await;
    match &state {
        SyncState::Succeeded(message) => spinner.finish_ok(message),
        SyncState::Failed(message) => spinner.finish_err(message),
        SyncState::Idle | SyncState::InProgress => spinner.finish_clear(),
    }

    // The settled job invalidated the cached profile; this fetch is fresh.
    let last_email_sync = if args.show_profile && !matches!(state, SyncState::Failed(_)) {
        match ctx.client.load_profile().await {
            Ok(profile) => profile.last_email_sync.map(|at| at.to_rfc3339()),
            Err(error) => {
                tracing::warn!(%error, "could not refresh profile after sync");
                None
            }
        }
    } else {
        None
    };

    output(
        &SyncResponse {
            subject: subject.to_string(),
            state: state_label(&state),
            message: state.message().map(str::to_string),
            joined_running_job: joined,
            last_email_sync,
        },
        flags.format,
    )?;

    if let SyncState::Failed(message) = state {
        anyhow::bail!("sync failed: {message}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::state_label;
    use fin_core::SyncState;

    #[test]
    fn labels_match_table_colors() {
        assert_eq!(state_label(&SyncState::Idle), "idle");
        assert_eq!(state_label(&SyncState::InProgress), "in_progress");
        assert_eq!(state_label(&SyncState::Succeeded("ok".into())), "succeeded");
        assert_eq!(state_label(&SyncState::Failed("no".into())), "failed");
    }
}
