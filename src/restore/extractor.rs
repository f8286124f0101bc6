//! Archive extraction for restore

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use zip::ZipArchive;

use crate::backup::ArchiveFormat;

use super::errors::{RestoreError, RestoreResult};

const TEMP_DIR_NAME: &str = ".restore_tmp";

/// Create `<dest_dir>/.restore_tmp`, clearing leftovers of a failed restore
pub fn create_temp_restore_dir(dest_dir: &Path) -> RestoreResult<PathBuf> {
    let temp_dir = dest_dir.join(TEMP_DIR_NAME);

    if temp_dir.exists() {
        fs::remove_dir_all(&temp_dir).map_err(|e| {
            RestoreError::io_error(
                format!("Failed to clean up existing temp directory: {}", temp_dir.display()),
                e,
            )
        })?;
    }

    fs::create_dir_all(&temp_dir).map_err(|e| {
        RestoreError::io_error(
            format!("Failed to create temp restore directory: {}", temp_dir.display()),
            e,
        )
    })?;

    Ok(temp_dir)
}

/// Unpack an archive into `dest_dir`
pub fn extract_archive(archive_path: &Path, format: ArchiveFormat, dest_dir: &Path) -> RestoreResult<()> {
    let file = File::open(archive_path).map_err(|e| {
        RestoreError::io_error(
            format!("Failed to open archive: {}", archive_path.display()),
            e,
        )
    })?;

    let unpacked = match format {
        ArchiveFormat::TarGz => Archive::new(GzDecoder::new(file)).unpack(dest_dir),
        ArchiveFormat::Zip => ZipArchive::new(file)
            .and_then(|mut archive| archive.extract(dest_dir))
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e)),
    };

    unpacked.map_err(|e| {
        RestoreError::invalid_archive_with_source(
            format!("Failed to extract archive: {}", archive_path.display()),
            e,
        )
    })
}

/// The single top-level directory of an extracted archive
pub fn extracted_root(temp_dir: &Path) -> RestoreResult<PathBuf> {
    let mut roots: Vec<PathBuf> = fs::read_dir(temp_dir)
        .map_err(|e| RestoreError::io_error_at_path(temp_dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .map_err(|e| RestoreError::io_error_at_path(temp_dir, e))?;

    match (roots.pop(), roots.is_empty()) {
        (Some(root), true) if root.is_dir() => Ok(root),
        _ => Err(RestoreError::invalid_archive(
            "Archive must contain exactly one root directory",
        )),
    }
}

/// Count regular files below a directory
pub fn count_files(dir: &Path) -> RestoreResult<usize> {
    let mut count = 0;
    for entry in fs::read_dir(dir).map_err(|e| RestoreError::io_error_at_path(dir, e))? {
        let path = entry.map_err(|e| RestoreError::io_error_at_path(dir, e))?.path();
        if path.is_dir() {
            count += count_files(&path)?;
        } else {
            count += 1;
        }
    }
    Ok(count)
}

/// Remove the temp directory, ignoring errors
pub fn cleanup_temp_dir(temp_dir: &Path) {
    if temp_dir.exists() {
        let _ = fs::remove_dir_all(temp_dir);
    }
}
