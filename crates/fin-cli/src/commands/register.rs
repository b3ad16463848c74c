use anyhow::Context;
use fin_api::NewProfile;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RegisterArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct RegisterResponse {
    created: bool,
    subject: String,
    message: String,
}

pub async fn handle(
    args: &RegisterArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let subject = ctx.require_subject()?;
    let email = match &args.email {
        Some(email) => email.clone(),
        None => ctx
            .client
            .session()
            .identity
            .and_then(|identity| identity.email)
            .context("register: the signed-in identity has no email; pass --email")?,
    };

    let profile = NewProfile {
        subject: subject.clone(),
        full_name: args.full_name.trim().to_string(),
        email,
        occupation: args.occupation.clone(),
        salary: args.salary,
        marital_status: args.marital_status.clone(),
        gender: args.gender.clone(),
    };
    let message = ctx
        .backend
        .create_profile(&profile)
        .await
        .context("register")?;

    // Any "not found" result cached before registration is stale now.
    ctx.client.profiles().invalidate(&subject);

    output(
        &RegisterResponse {
            created: true,
            subject: subject.to_string(),
            message,
        },
        flags.format,
    )
}
