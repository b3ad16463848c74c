use std::time::Duration;

use fin_sync::ConnectLauncher;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ConnectArgs;
use crate::commands::profile::connection_label;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Spinner;

const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Opens the connect URL in the system browser.
struct BrowserLauncher;

impl ConnectLauncher for BrowserLauncher {
    fn launch(&self, url: &str) -> Result<(), String> {
        eprintln!("Opening browser to: {url}");
        open::that(url).map_err(|error| format!("failed to open browser: {error}"))
    }
}

/// Prints the URL for the user to open by hand.
struct PrintLauncher;

impl ConnectLauncher for PrintLauncher {
    fn launch(&self, url: &str) -> Result<(), String> {
        eprintln!("Open this URL to connect your mail account: {url}");
        Ok(())
    }
}

#[derive(Serialize)]
struct ConnectResponse {
    url: String,
    connection: Option<&'static str>,
    waited: bool,
}

pub async fn handle(
    args: &ConnectArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    ctx.require_subject()?;

    let url = if args.no_browser {
        ctx.client.begin_external_connect(&PrintLauncher)?
    } else {
        match ctx.client.begin_external_connect(&BrowserLauncher) {
            Ok(url) => url,
            Err(error) => {
                tracing::warn!(%error, "browser launch failed; printing URL instead");
                ctx.client.begin_external_connect(&PrintLauncher)?
            }
        }
    };

    if args.no_wait {
        return output(
            &ConnectResponse {
                url,
                connection: None,
                waited: false,
            },
            flags.format,
        );
    }

    let deadline = tokio::time::Instant::now()
        + Duration::from_secs(ctx.config.general.connect_wait_secs);
    let spinner = Spinner::start("Waiting for the account to show up as connected…");
    let connection = loop {
        match ctx.client.reload_profile().await {
            Ok(profile) if profile.google_connected => {
                break Some(connection_label(profile.connection_status()));
            }
            Ok(_) => {}
            Err(error) => tracing::debug!(%error, "profile poll failed"),
        }
        if tokio::time::Instant::now() + POLL_INTERVAL > deadline {
            break None;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    };

    match connection {
        Some(_) => spinner.finish_ok("Account connected"),
        None => spinner.finish_err("Still not connected"),
    }

    output(
        &ConnectResponse {
            url,
            connection,
            waited: true,
        },
        flags.format,
    )?;
    if connection.is_none() {
        anyhow::bail!(
            "account not connected after {}s; run 'finsight profile --refresh' once the browser flow completes",
            ctx.config.general.connect_wait_secs
        );
    }
    Ok(())
}
