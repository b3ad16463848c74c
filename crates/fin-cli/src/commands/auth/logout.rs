use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct AuthLogoutResponse {
    cleared: bool,
    /// Set when `FINSIGHT_AUTH__TOKEN` still supplies a valid identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let previous = ctx.client.session().subject().cloned();
    ctx.client.sign_out()?;

    // Keyring and file are gone; an env-supplied token is not.
    ctx.provider.refresh();
    let note = ctx.client.session().subject().map(|subject| {
        format!("FINSIGHT_AUTH__TOKEN is set and still signs in as {subject}; unset it to sign out")
    });
    tracing::debug!(?previous, still_signed_in = note.is_some(), "logout finished");

    output(
        &AuthLogoutResponse {
            cleared: true,
            note,
        },
        flags.format,
    )
}
