//! Restore subsystem for notekeeper
//!
//! Rebuilds a note directory from one archive. The archive root (`data` or a
//! scope name) becomes `<dest_dir>/<root>`.
//!
//! # Algorithm
//!
//! 1. Infer the format from the archive name
//! 2. Create `<dest_dir>/.restore_tmp`
//! 3. Extract the archive there
//! 4. Check it holds exactly one root directory
//! 5. Refuse if `<dest_dir>/<root>` already exists
//! 6. Rename the root into place and remove the temp directory
//!
//! Restore never overwrites live notes. On failure the temp directory is
//! removed and `dest_dir` is left as it was.

mod errors;
mod extractor;

pub use errors::{RestoreError, RestoreErrorCode, RestoreResult};

use std::fs;
use std::path::{Path, PathBuf};

use crate::backup::ArchiveFormat;
use crate::observability::{log_event_with_fields, Event};

use extractor::{
    cleanup_temp_dir, count_files, create_temp_restore_dir, extract_archive, extracted_root,
};

/// Result of a successful restore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    /// Directory the archive was restored to
    pub restored_dir: PathBuf,
    /// Number of files restored
    pub files: usize,
}

/// Restore `archive_path` under `dest_dir`.
pub fn restore_archive(archive_path: &Path, dest_dir: &Path) -> RestoreResult<RestoreReport> {
    let archive_str = archive_path.display().to_string();
    log_event_with_fields(Event::RestoreStart, &[("archive", &archive_str)]);

    let result = run_restore(archive_path, dest_dir);

    match &result {
        Ok(report) => log_event_with_fields(
            Event::RestoreComplete,
            &[
                ("archive", &archive_str),
                ("files", &report.files.to_string()),
                ("restored_dir", &report.restored_dir.display().to_string()),
            ],
        ),
        Err(e) => log_event_with_fields(
            Event::RestoreFailed,
            &[("archive", &archive_str), ("error", &e.to_string())],
        ),
    }

    result
}

fn run_restore(archive_path: &Path, dest_dir: &Path) -> RestoreResult<RestoreReport> {
    let format = ArchiveFormat::from_path(archive_path).ok_or_else(|| {
        RestoreError::invalid_archive(format!(
            "Unknown archive format: {}",
            archive_path.display()
        ))
    })?;

    if !archive_path.is_file() {
        return Err(RestoreError::failed(format!(
            "Archive not found: {}",
            archive_path.display()
        )));
    }

    fs::create_dir_all(dest_dir).map_err(|e| RestoreError::io_error_at_path(dest_dir, e))?;

    let temp_dir = create_temp_restore_dir(dest_dir)?;
    let result = (|| -> RestoreResult<RestoreReport> {
        extract_archive(archive_path, format, &temp_dir)?;

        let root = extracted_root(&temp_dir)?;
        let root_name = root
            .file_name()
            .ok_or_else(|| RestoreError::invalid_archive("Archive root has no name"))?;

        let restored_dir = dest_dir.join(root_name);
        if restored_dir.exists() {
            return Err(RestoreError::target_exists(&restored_dir));
        }

        let files = count_files(&root)?;

        fs::rename(&root, &restored_dir).map_err(|e| {
            RestoreError::io_error(
                format!("Failed to move restored tree to {}", restored_dir.display()),
                e,
            )
        })?;

        Ok(RestoreReport {
            restored_dir,
            files,
        })
    })();

    cleanup_temp_dir(&temp_dir);
    result
}
