//! CLI command implementations
//!
//! Commands act on the file-backed state directly. Role changes need a
//! live auth store and app, so they are not offered here. A change that
//! cannot be written is an error, not a silently stale printout.

use std::io::{self, Write};
use std::sync::Arc;

use crate::devtools::{DevToolsConfig, DevToolsState};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::persistence::{FileBackend, PersistedStore};

use super::args::{Cli, Command};
use super::errors::CliResult;

/// Parse arguments and run
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let config = resolve_config(&cli)?;
    Logger::set_min_severity(config.log_level);

    let mut stdout = io::stdout();
    run_command(cli.command, &config, &mut stdout)
}

/// Load the config file if given, then apply command-line overrides
pub fn resolve_config(cli: &Cli) -> CliResult<DevToolsConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = DevToolsConfig::load(path)?;
            log_event_with_fields(
                Event::ConfigLoaded,
                &[("path", path.display().to_string().as_str())],
            );
            config
        }
        None => DevToolsConfig::default(),
    };

    if let Some(dir) = &cli.storage_dir {
        config.storage_dir = dir.clone();
    }

    Ok(config)
}

/// Run one command, writing its output to `out`
pub fn run_command<W: Write>(cmd: Command, config: &DevToolsConfig, out: &mut W) -> CliResult<()> {
    let store = open_store(config);

    match cmd {
        Command::Show => {}
        Command::Visible { state } => {
            store.try_update(|current| current.clone().with_visible(state.enabled()))?;
        }
        Command::Selection { state } => {
            store.try_update(|current| current.clone().with_allow_selection(state.enabled()))?;
        }
        Command::Reset => store.try_reset()?,
    }

    write_state(out, &store.get())
}

fn open_store(config: &DevToolsConfig) -> PersistedStore<DevToolsState> {
    let backend = FileBackend::new(&config.storage_dir);
    PersistedStore::new(
        config.storage_key.clone(),
        DevToolsState::default(),
        Arc::new(backend),
    )
}

fn write_state<W: Write>(out: &mut W, state: &DevToolsState) -> CliResult<()> {
    let json = serde_json::to_string_pretty(state)?;
    writeln!(out, "{}", json)?;
    out.flush()?;
    Ok(())
}
