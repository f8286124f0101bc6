//! Backup subsystem for notekeeper
//!
//! Every note mutation is followed by a snapshot of the affected scope into a
//! timestamped compressed archive, then a retention pass over that scope's
//! archive collection.
//!
//! # Layout
//!
//! ```text
//! backup/
//! ├── 20260101_120000.tar.gz      whole data/ tree (global scope)
//! ├── 20260101_120502.tar.gz
//! └── work/
//!     ├── 20260101_120000.zip     data/work/ only
//!     └── 20260101_120502_01.zip  second archive within the same second
//! ```
//!
//! # Algorithm
//!
//! 1. Validate the scope name
//! 2. Take a `YYYYMMDD_HHMMSS` timestamp from the clock
//! 3. Resolve source and backup directories; create both if missing
//! 4. Pick an archive name that does not exist yet
//! 5. Write the archive
//! 6. Prune the collection down to the retention limit
//!
//! # Failure policy
//!
//! `backup` returns a `BackupResult`. The note store reaches the orchestrator
//! only through [`MutationListener::on_note_mutated`], which logs the outcome
//! and returns nothing: a failed backup never fails the mutation that
//! triggered it.
//!
//! An archive write that fails midway leaves its partial file in place and
//! logs `ARCHIVE_PARTIAL`. Retention treats that file like any other archive.
//!
//! No lock guards a collection. Two backups of one scope may run at once; the
//! single-user deployment makes that rare, and retention degrades to
//! "file already gone" rather than corruption.

mod archive;
mod clock;
mod errors;
mod retention;

pub use archive::{write_archive, ArchiveFormat, ArchiveSummary};
pub use clock::{format_timestamp, Clock, SystemClock, TIMESTAMP_FORMAT};
pub use errors::{BackupError, BackupErrorCode, BackupResult};
pub use retention::{
    archive_count, enforce_retention, enforce_retention_with, list_archives, RetentionReport,
    DEFAULT_RETENTION_LIMIT,
};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::naming::is_valid_name;
use crate::observability::{log_event_with_fields, Event};

/// Highest `_NN` suffix tried when a timestamp is already taken
const MAX_NAME_SUFFIX: u32 = 99;

/// Notification interface implemented by the backup core.
///
/// The note store calls this synchronously after every successful mutation.
pub trait MutationListener: Send + Sync {
    /// A note in `scope` (or the global store when `None`) was mutated
    fn on_note_mutated(&self, scope: Option<&str>);
}

/// Result of one successful backup
#[derive(Debug)]
pub struct BackupReport {
    /// Scope that was backed up; `None` for the global store
    pub scope: Option<String>,
    /// Timestamp used in the archive name
    pub timestamp: String,
    /// The archive just written
    pub archive: ArchiveSummary,
    /// The retention pass that followed
    pub retention: RetentionReport,
}

/// Where one scope lives and where its archives go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeTarget {
    /// Live note directory
    pub source_dir: PathBuf,
    /// Archive collection directory
    pub backup_dir: PathBuf,
    /// Archive format of the collection
    pub format: ArchiveFormat,
}

/// Snapshots note scopes into archives and enforces retention.
pub struct BackupOrchestrator {
    config: Arc<AppConfig>,
    clock: Arc<dyn Clock>,
}

impl BackupOrchestrator {
    /// Orchestrator using the system clock
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Orchestrator using a caller-supplied clock
    pub fn with_clock(config: Arc<AppConfig>, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    /// Resolve the directories and format of a scope
    pub fn resolve(&self, scope: Option<&str>) -> BackupResult<ScopeTarget> {
        match scope {
            None => Ok(ScopeTarget {
                source_dir: self.config.data_root.clone(),
                backup_dir: self.config.backup_root.clone(),
                format: self.config.global_format,
            }),
            Some(name) if is_valid_name(name) => Ok(ScopeTarget {
                source_dir: self.config.data_root.join(name),
                backup_dir: self.config.backup_root.join(name),
                format: self.config.scope_format,
            }),
            Some(name) => Err(BackupError::invalid_scope(name)),
        }
    }

    /// Snapshot a scope into a new archive, then enforce retention on it.
    pub fn backup(&self, scope: Option<&str>) -> BackupResult<BackupReport> {
        let scope_label = scope.unwrap_or("");
        let timestamp = format_timestamp(&self.clock.now());

        log_event_with_fields(
            Event::BackupStart,
            &[("scope", scope_label), ("timestamp", &timestamp)],
        );

        let result = self.run_backup(scope, &timestamp);

        match &result {
            Ok(report) => log_event_with_fields(
                Event::BackupComplete,
                &[
                    ("archive", &report.archive.path.display().to_string()),
                    ("files", &report.archive.files.to_string()),
                    ("pruned", &report.retention.pruned_count().to_string()),
                    ("scope", scope_label),
                ],
            ),
            Err(e) => log_event_with_fields(
                Event::BackupFailed,
                &[
                    ("code", e.code().as_str()),
                    ("error", &e.to_string()),
                    ("scope", scope_label),
                ],
            ),
        }

        result
    }

    fn run_backup(&self, scope: Option<&str>, timestamp: &str) -> BackupResult<BackupReport> {
        let target = self.resolve(scope)?;

        fs::create_dir_all(&target.backup_dir).map_err(|e| {
            BackupError::io_error(
                format!(
                    "Failed to create backup directory: {}",
                    target.backup_dir.display()
                ),
                e,
            )
        })?;

        // A scope with no notes yet is archived as an empty directory.
        fs::create_dir_all(&target.source_dir).map_err(|e| {
            BackupError::io_error(
                format!(
                    "Failed to create source directory: {}",
                    target.source_dir.display()
                ),
                e,
            )
        })?;

        let archive = write_to_free_name(&target.backup_dir, timestamp, target.format, |path| {
            write_archive(&target.source_dir, path, target.format)
        })?;

        let retention = enforce_retention(
            &target.backup_dir,
            target.format,
            self.config.retention_limit,
        )?;

        Ok(BackupReport {
            scope: scope.map(str::to_string),
            timestamp: timestamp.to_string(),
            archive,
            retention,
        })
    }

    /// Number of archives currently held for a scope
    pub fn archive_count(&self, scope: Option<&str>) -> BackupResult<usize> {
        let target = self.resolve(scope)?;
        archive_count(&target.backup_dir, target.format)
    }

    /// Archives of a scope, oldest first
    pub fn list_archives(&self, scope: Option<&str>) -> BackupResult<Vec<PathBuf>> {
        let target = self.resolve(scope)?;
        list_archives(&target.backup_dir, target.format)
    }

    /// Run a retention pass on a scope without writing a new archive
    pub fn prune(&self, scope: Option<&str>) -> BackupResult<RetentionReport> {
        let target = self.resolve(scope)?;
        enforce_retention(
            &target.backup_dir,
            target.format,
            self.config.retention_limit,
        )
    }
}

impl MutationListener for BackupOrchestrator {
    fn on_note_mutated(&self, scope: Option<&str>) {
        // Outcome is logged inside `backup`; the mutation already succeeded.
        let _ = self.backup(scope);
    }
}

/// `<ts>.<ext>`, or the first free `<ts>_NN.<ext>`. Both sort after any
/// earlier timestamp and the suffixed names sort after the bare one.
fn next_archive_path(dir: &Path, timestamp: &str, format: ArchiveFormat) -> BackupResult<PathBuf> {
    let ext = format.extension();

    let bare = dir.join(format!("{}.{}", timestamp, ext));
    if !bare.exists() {
        return Ok(bare);
    }

    (1..=MAX_NAME_SUFFIX)
        .map(|n| dir.join(format!("{}_{:02}.{}", timestamp, n, ext)))
        .find(|candidate| !candidate.exists())
        .ok_or_else(|| {
            BackupError::failed(format!(
                "No free archive name for timestamp {} in {}",
                timestamp,
                dir.display()
            ))
        })
}

/// Write a new archive under the first free name for `timestamp`.
///
/// A name taken between the free-name check and the create-new open belongs
/// to a concurrent backup: move on to the next suffix and leave that file
/// alone. Any other failure that left a file behind is logged as partial.
fn write_to_free_name<F>(
    dir: &Path,
    timestamp: &str,
    format: ArchiveFormat,
    mut write: F,
) -> BackupResult<ArchiveSummary>
where
    F: FnMut(&Path) -> BackupResult<ArchiveSummary>,
{
    for _ in 0..=MAX_NAME_SUFFIX {
        let archive_path = next_archive_path(dir, timestamp, format)?;

        match write(&archive_path) {
            Ok(summary) => return Ok(summary),
            Err(e) if e.io_kind() == Some(io::ErrorKind::AlreadyExists) => continue,
            Err(e) => {
                if archive_path.exists() {
                    log_event_with_fields(
                        Event::ArchivePartial,
                        &[("path", &archive_path.display().to_string())],
                    );
                }
                return Err(e);
            }
        }
    }

    Err(BackupError::failed(format!(
        "No free archive name for timestamp {} in {}",
        timestamp,
        dir.display()
    )))
}
