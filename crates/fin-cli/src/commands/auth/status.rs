use fin_core::SessionStatus;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct AuthStatusResponse {
    authenticated: bool,
    status: SessionStatus,
    subject: Option<String>,
    email: Option<String>,
    expires_at: Option<String>,
    token_source: Option<String>,
    note: Option<String>,
}

pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let session = ctx.client.session();
    let identity = session.identity.as_ref();
    let note = ctx
        .client
        .session_store()
        .diagnostic()
        .or_else(|| (!session.is_authenticated()).then(|| "no valid token found".to_string()));

    output(
        &AuthStatusResponse {
            authenticated: session.is_authenticated(),
            status: session.status,
            subject: identity.map(|identity| identity.subject.to_string()),
            email: identity.and_then(|identity| identity.email.clone()),
            expires_at: ctx
                .provider
                .stored_claims()
                .map(|claims| claims.expires_at.to_rfc3339()),
            token_source: ctx.provider.token_source().map(|source| source.to_string()),
            note,
        },
        flags.format,
    )
}
