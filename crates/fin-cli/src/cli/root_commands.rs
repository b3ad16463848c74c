use clap::{Args, Subcommand};

use crate::cli::subcommands::AuthCommands;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Sign in, sign out, show who is signed in.
    Auth {
        #[command(subcommand)]
        action: AuthCommands,
    },
    /// Show the signed-in user's profile and mail connection.
    Profile(ProfileArgs),
    /// Pull new transactions from the connected mail account.
    Sync(SyncArgs),
    /// Monthly spending analysis.
    Analysis(AnalysisArgs),
    /// Connect the mail account used for transaction ingestion.
    Connect(ConnectArgs),
    /// Create the server-side profile for the signed-in identity.
    Register(RegisterArgs),
}

#[derive(Clone, Debug, Args)]
pub struct ProfileArgs {
    /// Bypass the cached profile and fetch again.
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Clone, Debug, Args)]
pub struct SyncArgs {
    /// Show the profile's last-synced time after the job settles.
    #[arg(long)]
    pub show_profile: bool,
}

#[derive(Clone, Debug, Args)]
pub struct AnalysisArgs {
    /// Month (1-12). Defaults to the current month.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
    /// Year. Defaults to the current year.
    #[arg(long)]
    pub year: Option<i32>,
    /// Step back one month from the selected period.
    #[arg(long)]
    pub previous: bool,
    /// Include individual transactions.
    #[arg(long)]
    pub transactions: bool,
}

#[derive(Clone, Debug, Args)]
pub struct ConnectArgs {
    /// Print the URL instead of opening a browser.
    #[arg(long)]
    pub no_browser: bool,
    /// Return immediately instead of waiting for the connection to show up.
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(Clone, Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub full_name: String,
    /// Defaults to the email on the signed-in identity.
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub occupation: String,
    #[arg(long)]
    pub salary: i64,
    #[arg(long)]
    pub marital_status: String,
    #[arg(long)]
    pub gender: String,
}
