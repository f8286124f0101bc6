//! Archive writer
//!
//! Serializes a note directory into one compressed archive:
//! - Entry names are relative to the *parent* of the source directory, so the
//!   archive root is the source's basename (`data`, or the scope name)
//! - Deterministic entry order: pre-order walk, siblings sorted by name
//! - Directory entries carry no content, file entries carry the full bytes
//! - The target file is created with create-new semantics; an existing file is
//!   never overwritten
//!
//! A failure midway leaves whatever was written at the target path. Removing
//! or quarantining that file is the caller's decision.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tar::Builder;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::errors::{BackupError, BackupResult};

/// Archive container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveFormat {
    /// tar stream wrapped in gzip
    #[serde(rename = "tar.gz")]
    TarGz,
    /// zip with deflated entries
    #[serde(rename = "zip")]
    Zip,
}

impl ArchiveFormat {
    /// File extension, without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Zip => "zip",
        }
    }

    /// Whether a file name belongs to this format
    pub fn matches(&self, file_name: &str) -> bool {
        file_name
            .strip_suffix(self.extension())
            .and_then(|stem| stem.strip_suffix('.'))
            .is_some_and(|stem| !stem.is_empty())
    }

    /// Infer the format from an archive path
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        [ArchiveFormat::TarGz, ArchiveFormat::Zip]
            .into_iter()
            .find(|format| format.matches(name))
    }
}

/// What a successful archive write produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Path of the archive file
    pub path: PathBuf,
    /// Number of regular file entries
    pub files: usize,
    /// Number of directory entries, root included
    pub directories: usize,
}

#[derive(Debug)]
struct ArchiveEntry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// Write `source_dir` into a new archive at `target`.
///
/// The parent of `target` is created if missing. Fails if `target` exists.
pub fn write_archive(
    source_dir: &Path,
    target: &Path,
    format: ArchiveFormat,
) -> BackupResult<ArchiveSummary> {
    if !source_dir.is_dir() {
        return Err(BackupError::failed(format!(
            "Source directory does not exist: {}",
            source_dir.display()
        )));
    }

    let root_name = source_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            BackupError::failed(format!(
                "Source directory has no base name: {}",
                source_dir.display()
            ))
        })?;

    let entries = collect_entries(source_dir, &root_name)?;

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                BackupError::io_error(
                    format!("Failed to create archive directory: {}", parent.display()),
                    e,
                )
            })?;
        }
    }

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .map_err(|e| {
            BackupError::io_error(
                format!("Failed to create archive file: {}", target.display()),
                e,
            )
        })?;

    match format {
        ArchiveFormat::TarGz => write_tar_gz(file, &entries, target)?,
        ArchiveFormat::Zip => write_zip(file, &entries, target)?,
    }

    let directories = entries.iter().filter(|e| e.is_dir).count();
    Ok(ArchiveSummary {
        path: target.to_path_buf(),
        files: entries.len() - directories,
        directories,
    })
}

fn collect_entries(source_dir: &Path, root_name: &str) -> BackupResult<Vec<ArchiveEntry>> {
    let mut entries = vec![ArchiveEntry {
        name: root_name.to_string(),
        path: source_dir.to_path_buf(),
        is_dir: true,
    }];
    collect_entries_recursive(source_dir, root_name, &mut entries)?;
    Ok(entries)
}

fn collect_entries_recursive(
    current_dir: &Path,
    prefix: &str,
    entries: &mut Vec<ArchiveEntry>,
) -> BackupResult<()> {
    let mut dir_entries: Vec<_> = fs::read_dir(current_dir)
        .map_err(|e| BackupError::io_error_at_path(current_dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| BackupError::io_error_at_path(current_dir, e))?;

    dir_entries.sort_by_key(|entry| entry.file_name());

    for entry in dir_entries {
        let fs_path = entry.path();
        let name = format!("{}/{}", prefix, entry.file_name().to_string_lossy());
        let is_dir = fs_path.is_dir();

        entries.push(ArchiveEntry {
            name: name.clone(),
            path: fs_path.clone(),
            is_dir,
        });

        if is_dir {
            collect_entries_recursive(&fs_path, &name, entries)?;
        }
    }

    Ok(())
}

fn write_tar_gz(file: File, entries: &[ArchiveEntry], target: &Path) -> BackupResult<()> {
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = Builder::new(encoder);

    for entry in entries {
        if entry.is_dir {
            builder.append_dir(&entry.name, &entry.path).map_err(|e| {
                BackupError::io_error(
                    format!("Failed to add directory to archive: {}", entry.name),
                    e,
                )
            })?;
        } else {
            let mut source =
                File::open(&entry.path).map_err(|e| BackupError::io_error_at_path(&entry.path, e))?;
            builder.append_file(&entry.name, &mut source).map_err(|e| {
                BackupError::io_error(format!("Failed to add file to archive: {}", entry.name), e)
            })?;
        }
    }

    let encoder = builder
        .into_inner()
        .map_err(|e| BackupError::io_error("Failed to finish tar stream", e))?;
    let writer = encoder
        .finish()
        .map_err(|e| BackupError::io_error("Failed to finish gzip stream", e))?;
    let file = writer
        .into_inner()
        .map_err(|e| BackupError::io_error("Failed to flush archive buffer", e.into_error()))?;

    file.sync_all().map_err(|e| {
        BackupError::io_error(format!("Failed to fsync archive: {}", target.display()), e)
    })
}

fn write_zip(file: File, entries: &[ArchiveEntry], target: &Path) -> BackupResult<()> {
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        if entry.is_dir {
            zip.add_directory(entry.name.as_str(), options)
                .map_err(|e| {
                    BackupError::io_error(
                        format!("Failed to add directory to archive: {}", entry.name),
                        io::Error::new(io::ErrorKind::Other, e),
                    )
                })?;
        } else {
            let mut source =
                File::open(&entry.path).map_err(|e| BackupError::io_error_at_path(&entry.path, e))?;
            zip.start_file(entry.name.as_str(), options).map_err(|e| {
                BackupError::io_error(
                    format!("Failed to add file to archive: {}", entry.name),
                    io::Error::new(io::ErrorKind::Other, e),
                )
            })?;
            io::copy(&mut source, &mut zip)
                .map_err(|e| BackupError::io_error_at_path(&entry.path, e))?;
        }
    }

    let mut writer = zip.finish().map_err(|e| {
        BackupError::io_error(
            "Failed to finish zip archive",
            io::Error::new(io::ErrorKind::Other, e),
        )
    })?;
    writer
        .flush()
        .map_err(|e| BackupError::io_error("Failed to flush archive buffer", e))?;
    let file = writer
        .into_inner()
        .map_err(|e| BackupError::io_error("Failed to flush archive buffer", e.into_error()))?;

    file.sync_all().map_err(|e| {
        BackupError::io_error(format!("Failed to fsync archive: {}", target.display()), e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tar::Archive;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn create_note_tree(root: &Path) {
        fs::create_dir_all(root.join("work")).unwrap();
        fs::write(root.join("todo.txt"), "buy milk").unwrap();
        fs::write(root.join("work").join("plan.txt"), "ship it").unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
    }

    fn tar_gz_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
        let mut archive = Archive::new(GzDecoder::new(File::open(path).unwrap()));
        archive
            .entries()
            .unwrap()
            .map(|e| {
                let mut e = e.unwrap();
                let name = e
                    .path()
                    .unwrap()
                    .to_string_lossy()
                    .trim_end_matches('/')
                    .to_string();
                let mut body = Vec::new();
                e.read_to_end(&mut body).unwrap();
                (name, body)
            })
            .collect()
    }

    fn zip_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut e = archive.by_index(i).unwrap();
                let name = e.name().trim_end_matches('/').to_string();
                let mut body = Vec::new();
                e.read_to_end(&mut body).unwrap();
                (name, body)
            })
            .collect()
    }

    #[test]
    fn test_format_extension_matching() {
        assert!(ArchiveFormat::TarGz.matches("20260101_120000.tar.gz"));
        assert!(!ArchiveFormat::TarGz.matches("20260101_120000.zip"));
        assert!(!ArchiveFormat::TarGz.matches(".tar.gz"));
        assert!(ArchiveFormat::Zip.matches("20260101_120000_01.zip"));
        assert!(!ArchiveFormat::Zip.matches("notes.zipx"));
        assert!(!ArchiveFormat::Zip.matches("backupzip"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ArchiveFormat::from_path(Path::new("backup/20260101_120000.tar.gz")),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(
            ArchiveFormat::from_path(Path::new("backup/work/20260101_120000.zip")),
            Some(ArchiveFormat::Zip)
        );
        assert_eq!(ArchiveFormat::from_path(Path::new("backup/notes.txt")), None);
    }

    #[test]
    fn test_tar_gz_rooted_at_source_basename() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("data");
        create_note_tree(&source);

        let target = temp.path().join("backup").join("20260101_120000.tar.gz");
        let summary = write_archive(&source, &target, ArchiveFormat::TarGz).unwrap();

        assert_eq!(summary.files, 2);
        assert_eq!(summary.directories, 3);

        let entries = tar_gz_entries(&target);
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["data", "data/empty", "data/todo.txt", "data/work", "data/work/plan.txt"]
        );

        let todo = entries.iter().find(|(n, _)| n == "data/todo.txt").unwrap();
        assert_eq!(todo.1, b"buy milk");
    }

    #[test]
    fn test_zip_rooted_at_scope_name() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("data").join("work");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("todo.txt"), "buy milk").unwrap();

        let target = temp.path().join("backup").join("work").join("20260101_120000.zip");
        write_archive(&source, &target, ArchiveFormat::Zip).unwrap();

        let entries = zip_entries(&target);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "work");
        assert_eq!(entries[1], ("work/todo.txt".to_string(), b"buy milk".to_vec()));
    }

    #[test]
    fn test_empty_source_has_only_root() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("x");
        fs::create_dir_all(&source).unwrap();

        let target = temp.path().join("empty.zip");
        let summary = write_archive(&source, &target, ArchiveFormat::Zip).unwrap();

        assert_eq!(summary.files, 0);
        assert_eq!(summary.directories, 1);
        let entries = zip_entries(&target);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "x");
    }

    #[test]
    fn test_entry_order_deterministic() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("data");
        create_note_tree(&source);

        let first = temp.path().join("a.tar.gz");
        let second = temp.path().join("b.tar.gz");
        write_archive(&source, &first, ArchiveFormat::TarGz).unwrap();
        write_archive(&source, &second, ArchiveFormat::TarGz).unwrap();

        assert_eq!(tar_gz_entries(&first), tar_gz_entries(&second));
    }

    #[test]
    fn test_existing_target_not_overwritten() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("data");
        create_note_tree(&source);

        let target = temp.path().join("taken.zip");
        fs::write(&target, b"keep me").unwrap();

        let err = write_archive(&source, &target, ArchiveFormat::Zip).unwrap_err();
        assert_eq!(err.io_kind(), Some(io::ErrorKind::AlreadyExists));
        assert_eq!(fs::read(&target).unwrap(), b"keep me");
    }

    #[test]
    fn test_missing_source_fails_without_creating_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out.tar.gz");

        let result = write_archive(&temp.path().join("missing"), &target, ArchiveFormat::TarGz);

        assert!(result.is_err());
        assert!(!target.exists());
    }
}
