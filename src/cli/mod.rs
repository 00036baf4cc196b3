//! CLI module
//!
//! - show: print the persisted state
//! - visible / selection: flip a panel flag
//! - reset: restore defaults

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command, Toggle};
pub use commands::{resolve_config, run, run_command};
pub use errors::{CliError, CliResult};
