//! CLI command implementations
//!
//! Every command loads the configuration first (defaults when `--config` is
//! absent), applies its log level, then does one thing.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::backup::{BackupOrchestrator, BackupReport, RetentionReport};
use crate::config::AppConfig;
use crate::http_server::HttpServer;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::restore::{restore_archive, RestoreReport};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(config.as_deref(), port),
        Command::Backup { config, scope } => {
            let report = backup(config.as_deref(), scope.as_deref())?;
            write_response(backup_json(&report))
        }
        Command::Prune { config, scope } => {
            let report = prune(config.as_deref(), scope.as_deref())?;
            write_response(retention_json(&report))
        }
        Command::Count { config, scope } => {
            let count = count(config.as_deref(), scope.as_deref())?;
            write_response(json!({ "count": count }))
        }
        Command::Restore {
            config,
            archive,
            dest,
        } => {
            let report = restore(config.as_deref(), &archive, &dest)?;
            write_response(restore_json(&report))
        }
    }
}

/// Load configuration and apply its log level
pub fn load_config(config_path: Option<&Path>) -> CliResult<Arc<AppConfig>> {
    let config = AppConfig::load_or_default(config_path)?;
    Logger::set_min_severity(config.log_severity()?);

    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("backup_root", &config.backup_root.display().to_string()),
            ("data_root", &config.data_root.display().to_string()),
            ("retention_limit", &config.retention_limit.to_string()),
        ],
    );

    Ok(Arc::new(config))
}

/// Serve the note store until the process is stopped
pub fn serve(config_path: Option<&Path>, port: Option<u16>) -> CliResult<()> {
    let mut config = (*load_config(config_path)?).clone();
    if let Some(port) = port {
        config.server.port = port;
    }

    let server = HttpServer::new(Arc::new(config));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::io_error(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server.start().await.map_err(|e| {
            log_event_with_fields(Event::ServerFailed, &[("error", &e.to_string())]);
            CliError::io_error(format!("HTTP server failed: {}", e))
        })
    })
}

/// Archive a scope now
pub fn backup(config_path: Option<&Path>, scope: Option<&str>) -> CliResult<BackupReport> {
    let config = load_config(config_path)?;
    Ok(BackupOrchestrator::new(config).backup(scope)?)
}

/// Enforce retention on a scope
pub fn prune(config_path: Option<&Path>, scope: Option<&str>) -> CliResult<RetentionReport> {
    let config = load_config(config_path)?;
    Ok(BackupOrchestrator::new(config).prune(scope)?)
}

/// Count the archives of a scope
pub fn count(config_path: Option<&Path>, scope: Option<&str>) -> CliResult<usize> {
    let config = load_config(config_path)?;
    Ok(BackupOrchestrator::new(config).archive_count(scope)?)
}

/// Restore an archive under `dest`
pub fn restore(config_path: Option<&Path>, archive: &Path, dest: &Path) -> CliResult<RestoreReport> {
    load_config(config_path)?;
    Ok(restore_archive(archive, dest)?)
}

fn backup_json(report: &BackupReport) -> Value {
    json!({
        "scope": report.scope,
        "timestamp": report.timestamp,
        "archive": report.archive.path.display().to_string(),
        "files": report.archive.files,
        "directories": report.archive.directories,
        "pruned": report.retention.pruned_count(),
    })
}

fn retention_json(report: &RetentionReport) -> Value {
    let failed: Vec<Value> = report
        .failed
        .iter()
        .map(|(path, e)| json!({ "path": path.display().to_string(), "error": e.to_string() }))
        .collect();

    json!({
        "pruned": report.pruned_count(),
        "failed": failed,
        "remaining": report.remaining,
    })
}

fn restore_json(report: &RestoreReport) -> Value {
    json!({
        "restored_dir": report.restored_dir.display().to_string(),
        "files": report.files,
    })
}
