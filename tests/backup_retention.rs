//! Backup and Retention Tests
//!
//! End-to-end behavior of the backup core through the public API:
//! - every backup adds exactly one archive whose tree equals the live tree
//! - each scope keeps its newest archives up to the retention limit
//! - retention is idempotent and survives individual deletion failures

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use notekeeper::backup::{
    enforce_retention, enforce_retention_with, list_archives, ArchiveFormat, BackupOrchestrator,
    Clock, MutationListener,
};
use notekeeper::config::AppConfig;
use notekeeper::notes::NoteStore;
use notekeeper::restore::restore_archive;
use tempfile::TempDir;
use zip::ZipArchive;

// =============================================================================
// Test Utilities
// =============================================================================

/// Clock that advances one second per reading
struct SteppingClock {
    next: Mutex<NaiveDateTime>,
}

impl SteppingClock {
    fn starting_at(hour: u32) -> Arc<Self> {
        let start = NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        Arc::new(Self {
            next: Mutex::new(start),
        })
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> NaiveDateTime {
        let mut next = self.next.lock().unwrap();
        let now = *next;
        *next = now + Duration::seconds(1);
        now
    }
}

struct Fixture {
    temp: TempDir,
    orchestrator: Arc<BackupOrchestrator>,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let config = AppConfig::with_roots(temp.path().join("data"), temp.path().join("backup"));
        let orchestrator = Arc::new(BackupOrchestrator::with_clock(
            Arc::new(config),
            SteppingClock::starting_at(9),
        ));
        Self { temp, orchestrator }
    }

    fn data(&self) -> PathBuf {
        self.temp.path().join("data")
    }

    fn backup(&self) -> PathBuf {
        self.temp.path().join("backup")
    }

    fn store(&self) -> NoteStore {
        NoteStore::new(self.data(), self.orchestrator.clone())
    }
}

/// Relative path -> bytes for every file below `root`
fn snapshot_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    fn walk(base: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                let rel = path.strip_prefix(base).unwrap().to_string_lossy().into_owned();
                out.insert(rel, fs::read(&path).unwrap());
            }
        }
    }

    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

fn names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

fn touch_archives(dir: &Path, count: usize, ext: &str) {
    fs::create_dir_all(dir).unwrap();
    for i in 0..count {
        let name = format!("20260314_{:02}{:02}00.{}", 8 + i / 60, i % 60, ext);
        fs::write(dir.join(name), b"archive").unwrap();
    }
}

// =============================================================================
// Archive content
// =============================================================================

#[test]
fn test_empty_scope_restores_to_empty_note_set() {
    let fx = Fixture::new();

    let report = fx.orchestrator.backup(Some("empty")).unwrap();
    assert_eq!(report.archive.files, 0);
    assert_eq!(report.archive.directories, 1);

    let dest = fx.temp.path().join("restored");
    let restored = restore_archive(&report.archive.path, &dest).unwrap();

    assert_eq!(restored.restored_dir, dest.join("empty"));
    assert_eq!(restored.files, 0);
    assert_eq!(fs::read_dir(dest.join("empty")).unwrap().count(), 0);
}

#[test]
fn test_scoped_note_lands_in_scope_zip() {
    let fx = Fixture::new();

    fx.store().create(Some("work"), "todo", "buy milk").unwrap();

    let archives = list_archives(&fx.backup().join("work"), ArchiveFormat::Zip).unwrap();
    assert_eq!(names(&archives), vec!["20260314_090000.zip"]);

    let mut zip = ZipArchive::new(File::open(&archives[0]).unwrap()).unwrap();
    let mut body = String::new();
    zip.by_name("work/todo.txt")
        .unwrap()
        .read_to_string(&mut body)
        .unwrap();
    assert_eq!(body, "buy milk");
}

#[test]
fn test_global_restore_is_byte_identical() {
    let fx = Fixture::new();
    let store = fx.store();
    store.create(None, "inbox", "loose note").unwrap();
    store.create(Some("work"), "plan", "ship it\n").unwrap();
    fs::write(fx.data().join("work").join("blob.txt"), [0u8, 159, 146, 150]).unwrap();

    let report = fx.orchestrator.backup(None).unwrap();
    assert_eq!(
        report.archive.path.extension().and_then(|e| e.to_str()),
        Some("gz")
    );

    let dest = fx.temp.path().join("restored");
    restore_archive(&report.archive.path, &dest).unwrap();

    assert_eq!(snapshot_tree(&dest.join("data")), snapshot_tree(&fx.data()));
}

#[test]
fn test_archive_reflects_tree_at_backup_time() {
    let fx = Fixture::new();
    let store = fx.store();

    store.create(Some("work"), "todo", "v1").unwrap();
    store.edit(Some("work"), "todo", "todo", "v2").unwrap();

    let archives = list_archives(&fx.backup().join("work"), ArchiveFormat::Zip).unwrap();
    assert_eq!(archives.len(), 2);

    let dest = fx.temp.path().join("first");
    restore_archive(&archives[0], &dest).unwrap();
    assert_eq!(
        fs::read_to_string(dest.join("work").join("todo.txt")).unwrap(),
        "v1"
    );
}

// =============================================================================
// Retention
// =============================================================================

#[test]
fn test_52_backups_keep_newest_50() {
    let fx = Fixture::new();
    let mut created = Vec::new();

    for _ in 0..52 {
        created.push(fx.orchestrator.backup(Some("x")).unwrap().archive.path);
    }

    let kept = list_archives(&fx.backup().join("x"), ArchiveFormat::Zip).unwrap();
    assert_eq!(kept.len(), 50);
    assert_eq!(kept, created[2..].to_vec());
    assert!(!created[0].exists());
    assert!(!created[1].exists());
}

#[test]
fn test_fifty_plus_one_removes_only_oldest() {
    let fx = Fixture::new();
    let dir = fx.backup().join("x");
    touch_archives(&dir, 50, "zip");
    let oldest = list_archives(&dir, ArchiveFormat::Zip).unwrap()[0].clone();

    let report = fx.orchestrator.backup(Some("x")).unwrap();

    assert_eq!(report.retention.pruned, vec![oldest]);
    assert_eq!(report.retention.remaining, 50);
    assert_eq!(fx.orchestrator.archive_count(Some("x")).unwrap(), 50);
}

#[test]
fn test_retention_is_idempotent() {
    let temp = TempDir::new().unwrap();
    touch_archives(temp.path(), 55, "tar.gz");

    let first = enforce_retention(temp.path(), ArchiveFormat::TarGz, 50).unwrap();
    let second = enforce_retention(temp.path(), ArchiveFormat::TarGz, 50).unwrap();

    assert_eq!(first.pruned_count(), 5);
    assert_eq!(second.pruned_count(), 0);
    assert_eq!(second.remaining, 50);
}

#[test]
fn test_failed_deletion_does_not_stop_pruning() {
    let temp = TempDir::new().unwrap();
    touch_archives(temp.path(), 53, "zip");
    let before = list_archives(temp.path(), ArchiveFormat::Zip).unwrap();
    let locked = before[1].clone();

    let report = enforce_retention_with(temp.path(), ArchiveFormat::Zip, 50, |path| {
        if path == locked {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
        } else {
            fs::remove_file(path)
        }
    })
    .unwrap();

    assert_eq!(report.pruned, vec![before[0].clone(), before[2].clone()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, locked);
    assert!(locked.exists());
    assert_eq!(list_archives(temp.path(), ArchiveFormat::Zip).unwrap().len(), 51);
}

#[test]
fn test_scopes_have_independent_collections() {
    let fx = Fixture::new();
    touch_archives(&fx.backup().join("a"), 50, "zip");

    fx.orchestrator.backup(Some("b")).unwrap();
    fx.orchestrator.backup(None).unwrap();

    assert_eq!(fx.orchestrator.archive_count(Some("a")).unwrap(), 50);
    assert_eq!(fx.orchestrator.archive_count(Some("b")).unwrap(), 1);
    // Global collection ignores scope subdirectories
    assert_eq!(fx.orchestrator.archive_count(None).unwrap(), 1);
}

// =============================================================================
// Mutation notifications
// =============================================================================

#[test]
fn test_each_mutation_adds_one_archive() {
    let fx = Fixture::new();
    let store = fx.store();

    store.create(None, "a", "1").unwrap();
    store.edit(None, "a", "b", "2").unwrap();
    store.delete(None, "b").unwrap();
    store.delete_all(None).unwrap();

    assert_eq!(fx.orchestrator.archive_count(None).unwrap(), 4);
}

#[test]
fn test_failed_backup_does_not_fail_mutation() {
    let temp = TempDir::new().unwrap();
    // backup_root is a file, so the backup directory cannot be created
    let blocker = temp.path().join("backup");
    fs::write(&blocker, b"not a dir").unwrap();
    let config = AppConfig::with_roots(temp.path().join("data"), &blocker);
    let orchestrator = Arc::new(BackupOrchestrator::new(Arc::new(config)));
    let store = NoteStore::new(temp.path().join("data"), orchestrator.clone());

    store.create(None, "todo", "buy milk").unwrap();

    assert_eq!(store.read(None, "todo").unwrap(), "buy milk");
    assert!(orchestrator.backup(None).is_err());
    orchestrator.on_note_mutated(None);
}
