//! CLI module for notekeeper
//!
//! Provides command-line interface for:
//! - serve: HTTP note server with backup on every mutation
//! - backup: One-shot archive of a scope
//! - prune: One-shot retention pass
//! - count: Archive count of a scope
//! - restore: Rebuild a note tree from an archive

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{backup, count, load_config, prune, restore, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_response;
