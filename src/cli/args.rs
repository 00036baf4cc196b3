//! CLI argument definitions using clap
//!
//! Commands:
//! - devtools show
//! - devtools visible <on|off>
//! - devtools selection <on|off>
//! - devtools reset

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Inspect and edit persisted developer-tools panel state
#[derive(Parser, Debug)]
#[command(name = "devtools")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the storage directory from the config
    #[arg(long, global = true)]
    pub storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the persisted state as JSON
    Show,

    /// Show or hide the panel
    Visible {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Turn element-selection mode on or off
    Selection {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Restore the default state
    Reset,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        self == Toggle::On
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
