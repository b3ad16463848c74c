use std::io::{BufRead, IsTerminal};

use anyhow::Context;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuthLoginArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct AuthLoginResponse {
    authenticated: bool,
    subject: String,
    email: Option<String>,
    expires_at: Option<String>,
    token_source: Option<String>,
}

pub async fn handle(
    args: &AuthLoginArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let token = match &args.token {
        Some(token) => token.clone(),
        None => read_token(std::io::stdin().lock())?,
    };

    let identity = ctx.provider.sign_in(&token).context("auth login")?;

    output(
        &AuthLoginResponse {
            authenticated: true,
            subject: identity.subject.to_string(),
            email: identity.email,
            expires_at: ctx
                .provider
                .stored_claims()
                .map(|claims| claims.expires_at.to_rfc3339()),
            token_source: ctx.provider.token_source().map(|source| source.to_string()),
        },
        flags.format,
    )
}

fn read_token(mut input: impl BufRead) -> anyhow::Result<String> {
    if std::io::stdin().is_terminal() {
        eprintln!("Paste the ID token, then press Enter:");
    }
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read ID token from stdin")?;
    let token = line.trim();
    if token.is_empty() {
        anyhow::bail!("auth login: no token given (use --token or pipe it on stdin)");
    }
    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::read_token;

    #[test]
    fn reads_trimmed_token() {
        let token = read_token("  a.b.c \n".as_bytes()).expect("token");
        assert_eq!(token, "a.b.c");
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(read_token("\n".as_bytes()).is_err());
    }
}
