#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]
#![allow(clippy::unused_async)]

use clap::Parser;

mod bootstrap;
mod cli;
mod commands;
mod context;
mod output;
mod progress;
mod ui;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("finsight error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = bootstrap::load_config()?;
    let flags = cli.global_flags(&config);
    ui::init(&flags);
    context::warn_misnamed_env();

    let ctx = context::AppContext::init(config)?;
    commands::dispatch::dispatch(&cli.command, &ctx, &flags).await
}

/// Default directives when `FINSIGHT_LOG` is unset. `--verbose` opens up
/// the finsight crates only, leaving reqwest/hyper at `warn`.
fn default_directives(quiet: bool, verbose: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "error",
        (false, true) => "warn,fin_sync=debug,fin_api=debug,fin_auth=debug,finsight=debug",
        (false, false) => "warn",
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("FINSIGHT_LOG").unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(default_directives(quiet, verbose))
    });

    // stdout carries command output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
