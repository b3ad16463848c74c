use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(
    command: &Commands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Auth { action } => commands::auth::handle(action, ctx, flags).await,
        Commands::Profile(args) => commands::profile::handle(args, ctx, flags).await,
        Commands::Sync(args) => commands::sync::handle(args, ctx, flags).await,
        Commands::Analysis(args) => commands::analysis::handle(args, ctx, flags).await,
        Commands::Connect(args) => commands::connect::handle(args, ctx, flags).await,
        Commands::Register(args) => commands::register::handle(args, ctx, flags).await,
    }
}
