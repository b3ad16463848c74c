use std::io::IsTerminal;
use std::sync::OnceLock;

use crate::cli::{ColorMode, GlobalFlags, OutputFormat, ProgressMode};

const MIN_TERM_WIDTH: usize = 40;

/// Presentation settings resolved once from flags and the terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UiPrefs {
    pub table_color: bool,
    pub progress: bool,
    pub term_width: Option<usize>,
}

/// What the process can observe about where its output goes.
#[derive(Clone, Copy, Debug)]
struct Terminal {
    stdout_tty: bool,
    stderr_tty: bool,
    no_color: bool,
    columns: Option<usize>,
}

impl Terminal {
    fn detect() -> Self {
        Self {
            stdout_tty: std::io::stdout().is_terminal(),
            stderr_tty: std::io::stderr().is_terminal(),
            no_color: std::env::var_os("NO_COLOR").is_some(),
            columns: std::env::var("COLUMNS")
                .ok()
                .and_then(|value| value.parse::<usize>().ok()),
        }
    }
}

static UI_PREFS: OnceLock<UiPrefs> = OnceLock::new();

pub fn init(flags: &GlobalFlags) {
    let _ = UI_PREFS.set(resolve(flags, Terminal::detect()));
}

#[must_use]
pub fn prefs() -> UiPrefs {
    UI_PREFS.get().copied().unwrap_or_default()
}

fn resolve(flags: &GlobalFlags, terminal: Terminal) -> UiPrefs {
    let table = flags.format == OutputFormat::Table;
    let table_color = match flags.color {
        ColorMode::Always => table,
        ColorMode::Never => false,
        ColorMode::Auto => table && terminal.stdout_tty && !terminal.no_color,
    };

    // Spinners draw on stderr, so piping stdout (e.g. `--format json | jq`)
    // keeps them.
    let progress = !flags.quiet
        && match flags.progress {
            ProgressMode::On => true,
            ProgressMode::Off => false,
            ProgressMode::Auto => terminal.stderr_tty,
        };

    UiPrefs {
        table_color,
        progress,
        term_width: terminal.columns.filter(|width| *width >= MIN_TERM_WIDTH),
    }
}
