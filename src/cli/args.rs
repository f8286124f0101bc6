//! CLI argument definitions using clap
//!
//! Commands:
//! - notekeeper serve   [--config <path>]
//! - notekeeper backup  [--config <path>] [--scope <name>]
//! - notekeeper prune   [--config <path>] [--scope <name>]
//! - notekeeper count   [--config <path>] [--scope <name>]
//! - notekeeper restore [--config <path>] --archive <path> --dest <dir>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Notekeeper - local notes with versioned backups
#[derive(Parser, Debug)]
#[command(name = "notekeeper")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Serve the note store over HTTP
    Serve {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Archive a scope now and enforce retention
    Backup {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Scope to archive (whole store when omitted)
        #[arg(long)]
        scope: Option<String>,
    },

    /// Enforce retention on a scope without archiving
    Prune {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Scope to prune (whole-store collection when omitted)
        #[arg(long)]
        scope: Option<String>,
    },

    /// Print the archive count of a scope
    Count {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Scope to count (whole-store collection when omitted)
        #[arg(long)]
        scope: Option<String>,
    },

    /// Restore an archive into a directory
    Restore {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Archive to restore
        #[arg(long)]
        archive: PathBuf,

        /// Directory that receives the restored tree
        #[arg(long)]
        dest: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
