//! Retention of archive collections
//!
//! One backup directory holds one collection. Archives are the directory's
//! immediate entries whose name ends in the collection's extension. Names start
//! with a fixed-width `YYYYMMDD_HHMMSS` timestamp, so ascending name order is
//! creation order.
//!
//! Pruning is best-effort: a file that cannot be removed is logged and skipped,
//! and the collection stays over the limit until a later pass succeeds. The
//! list-then-delete sequence is not locked; a concurrent pass that removed a
//! file first shows up here as a `NotFound` failure.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::observability::{log_event_with_fields, Event};

use super::archive::ArchiveFormat;
use super::errors::{BackupError, BackupResult};

/// Maximum number of archives kept per scope
pub const DEFAULT_RETENTION_LIMIT: usize = 50;

/// Outcome of one retention pass
#[derive(Debug, Default)]
pub struct RetentionReport {
    /// Archives removed, oldest first
    pub pruned: Vec<PathBuf>,
    /// Archives that should have been removed but could not be
    pub failed: Vec<(PathBuf, io::Error)>,
    /// Archives left in the collection
    pub remaining: usize,
}

impl RetentionReport {
    /// Number of archives removed
    pub fn pruned_count(&self) -> usize {
        self.pruned.len()
    }
}

/// List the archives of a collection, oldest first.
///
/// A missing directory is an empty collection.
pub fn list_archives(archive_dir: &Path, format: ArchiveFormat) -> BackupResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(archive_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(BackupError::io_error(
                format!("Failed to list archives in {}", archive_dir.display()),
                e,
            ))
        }
    };

    let mut archives = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BackupError::io_error_at_path(archive_dir, e))?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            continue;
        }
        if format.matches(&entry.file_name().to_string_lossy()) {
            archives.push(entry.path());
        }
    }

    archives.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(archives)
}

/// Count the archives of a collection. A missing directory counts as zero.
pub fn archive_count(archive_dir: &Path, format: ArchiveFormat) -> BackupResult<usize> {
    list_archives(archive_dir, format).map(|archives| archives.len())
}

/// Delete all but the newest `limit` archives.
pub fn enforce_retention(
    archive_dir: &Path,
    format: ArchiveFormat,
    limit: usize,
) -> BackupResult<RetentionReport> {
    enforce_retention_with(archive_dir, format, limit, |path| fs::remove_file(path))
}

/// [`enforce_retention`] with a caller-supplied removal function.
pub fn enforce_retention_with<F>(
    archive_dir: &Path,
    format: ArchiveFormat,
    limit: usize,
    mut remove: F,
) -> BackupResult<RetentionReport>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let archives = list_archives(archive_dir, format)?;

    let mut report = RetentionReport {
        remaining: archives.len(),
        ..Default::default()
    };

    if archives.len() <= limit {
        return Ok(report);
    }

    let excess = archives.len() - limit;
    for path in archives.into_iter().take(excess) {
        let path_str = path.display().to_string();
        match remove(&path) {
            Ok(()) => {
                log_event_with_fields(Event::ArchivePruned, &[("path", &path_str)]);
                report.remaining -= 1;
                report.pruned.push(path);
            }
            Err(e) => {
                log_event_with_fields(
                    Event::ArchivePruneFailed,
                    &[("path", &path_str), ("error", &e.to_string())],
                );
                report.failed.push((path, e));
            }
        }
    }

    Ok(report)
}
