use clap::{Parser, ValueEnum};
use fin_config::FinConfig;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{ColorMode, GlobalFlags, OutputFormat, ProgressMode};
pub use root_commands::Commands;

/// Top-level CLI parser for the `finsight` binary.
#[derive(Debug, Parser)]
#[command(
    name = "finsight",
    version,
    about = "finsight - transactions synced from email, analysed by month"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw (defaults to `general.default_format`)
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Table coloring
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Spinner display
    #[arg(long, global = true, value_enum, default_value_t = ProgressMode::Auto)]
    pub progress: ProgressMode,
}

impl Cli {
    /// Extract ergonomic global flags, falling back to the configured format.
    #[must_use]
    pub fn global_flags(&self, config: &FinConfig) -> GlobalFlags {
        let format = self.format.unwrap_or_else(|| {
            OutputFormat::from_str(&config.general.default_format, true).unwrap_or_else(|_| {
                tracing::warn!(
                    value = %config.general.default_format,
                    "unknown general.default_format; using json"
                );
                OutputFormat::Json
            })
        });
        GlobalFlags {
            format,
            quiet: self.quiet,
            verbose: self.verbose,
            color: self.color,
            progress: self.progress,
        }
    }
}
