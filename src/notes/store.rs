//! File-backed note store
//!
//! A note is `<data_root>/[<scope>/]<title>.txt`. Every successful mutation
//! notifies the mutation listener synchronously before returning.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backup::MutationListener;
use crate::naming::is_valid_name;
use crate::observability::{log_event_with_fields, Event};

use super::errors::{NoteError, NoteResult};

const NOTE_EXTENSION: &str = "txt";

/// Plain-file note store
pub struct NoteStore {
    data_root: PathBuf,
    listener: Arc<dyn MutationListener>,
}

impl NoteStore {
    pub fn new(data_root: impl Into<PathBuf>, listener: Arc<dyn MutationListener>) -> Self {
        Self {
            data_root: data_root.into(),
            listener,
        }
    }

    /// Root directory of the store
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    fn scope_dir(&self, scope: Option<&str>) -> NoteResult<PathBuf> {
        match scope {
            None => Ok(self.data_root.clone()),
            Some(name) if is_valid_name(name) => Ok(self.data_root.join(name)),
            Some(name) => Err(NoteError::InvalidName(name.to_string())),
        }
    }

    fn note_path(&self, scope: Option<&str>, title: &str) -> NoteResult<PathBuf> {
        if !is_valid_name(title) {
            return Err(NoteError::InvalidName(title.to_string()));
        }
        Ok(self
            .scope_dir(scope)?
            .join(format!("{}.{}", title, NOTE_EXTENSION)))
    }

    fn notify(&self, scope: Option<&str>) {
        self.listener.on_note_mutated(scope);
    }

    /// Note files of a scope, sorted by title. A missing scope is empty.
    fn note_files(&self, scope: Option<&str>) -> NoteResult<Vec<(String, PathBuf)>> {
        let dir = self.scope_dir(scope)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(NoteError::io(dir.display(), e)),
        };

        let mut notes = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| NoteError::io(dir.display(), e))?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(NOTE_EXTENSION) {
                continue;
            }
            if let Some(title) = path.file_stem().and_then(|s| s.to_str()) {
                notes.push((title.to_string(), path.clone()));
            }
        }

        notes.sort();
        Ok(notes)
    }

    /// Titles in a scope
    pub fn list(&self, scope: Option<&str>) -> NoteResult<Vec<String>> {
        Ok(self
            .note_files(scope)?
            .into_iter()
            .map(|(title, _)| title)
            .collect())
    }

    /// Named scopes: subdirectories of the data root
    pub fn list_scopes(&self) -> NoteResult<Vec<String>> {
        let entries = match fs::read_dir(&self.data_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(NoteError::io(self.data_root.display(), e)),
        };

        let mut scopes = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| NoteError::io(self.data_root.display(), e))?
                .path();
            if !path.is_dir() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if is_valid_name(name) {
                    scopes.push(name.to_string());
                }
            }
        }

        scopes.sort();
        Ok(scopes)
    }

    /// Body of a note
    pub fn read(&self, scope: Option<&str>, title: &str) -> NoteResult<String> {
        let title = title.trim();
        let path = self.note_path(scope, title)?;
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => NoteError::NotFound(title.to_string()),
            _ => NoteError::io(path.display(), e),
        })
    }

    /// Create a new note. Fails if the title is taken.
    pub fn create(&self, scope: Option<&str>, title: &str, body: &str) -> NoteResult<()> {
        let title = title.trim();
        let path = self.note_path(scope, title)?;

        let dir = self.scope_dir(scope)?;
        fs::create_dir_all(&dir).map_err(|e| NoteError::io(dir.display(), e))?;

        write_new(&path, body).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => NoteError::AlreadyExists(title.to_string()),
            _ => NoteError::io(path.display(), e),
        })?;

        log_event_with_fields(
            Event::NoteCreated,
            &[("scope", scope.unwrap_or("")), ("title", title)],
        );
        self.notify(scope);
        Ok(())
    }

    /// Update a note's body, renaming it when `new_title` differs.
    ///
    /// A rename writes the new file first, then removes the old one; failing
    /// to remove the old file is logged and does not fail the edit.
    pub fn edit(
        &self,
        scope: Option<&str>,
        old_title: &str,
        new_title: &str,
        body: &str,
    ) -> NoteResult<()> {
        let old_title = old_title.trim();
        let new_title = new_title.trim();
        let new_path = self.note_path(scope, new_title)?;

        if old_title == new_title {
            fs::write(&new_path, body).map_err(|e| NoteError::io(new_path.display(), e))?;
        } else {
            let old_path = self.note_path(scope, old_title)?;

            write_new(&new_path, body).map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => NoteError::AlreadyExists(new_title.to_string()),
                _ => NoteError::io(new_path.display(), e),
            })?;

            if let Err(e) = fs::remove_file(&old_path) {
                log_event_with_fields(
                    Event::NoteFailed,
                    &[
                        ("error", &e.to_string()),
                        ("op", "remove_old_title"),
                        ("path", &old_path.display().to_string()),
                    ],
                );
            }
        }

        log_event_with_fields(
            Event::NoteEdited,
            &[
                ("from", old_title),
                ("scope", scope.unwrap_or("")),
                ("title", new_title),
            ],
        );
        self.notify(scope);
        Ok(())
    }

    /// Delete one note.
    ///
    /// A failed removal is logged, and the scope is still backed up. Returns
    /// whether a file was removed.
    pub fn delete(&self, scope: Option<&str>, title: &str) -> NoteResult<bool> {
        let title = title.trim();
        let path = self.note_path(scope, title)?;

        let removed = match fs::remove_file(&path) {
            Ok(()) => {
                log_event_with_fields(
                    Event::NoteDeleted,
                    &[("scope", scope.unwrap_or("")), ("title", title)],
                );
                true
            }
            Err(e) => {
                log_event_with_fields(
                    Event::NoteFailed,
                    &[
                        ("error", &e.to_string()),
                        ("op", "delete"),
                        ("path", &path.display().to_string()),
                    ],
                );
                false
            }
        };

        self.notify(scope);
        Ok(removed)
    }

    /// Delete every note in a scope. Stops at the first failure, without a
    /// backup. Returns the number of notes removed.
    pub fn delete_all(&self, scope: Option<&str>) -> NoteResult<usize> {
        let notes = self.note_files(scope)?;

        for (_, path) in &notes {
            fs::remove_file(path).map_err(|e| NoteError::io(path.display(), e))?;
        }

        log_event_with_fields(
            Event::NotesCleared,
            &[
                ("count", &notes.len().to_string()),
                ("scope", scope.unwrap_or("")),
            ],
        );
        self.notify(scope);
        Ok(notes.len())
    }

    /// Titles of notes whose body contains `query`. Unreadable notes are skipped.
    pub fn search(&self, scope: Option<&str>, query: &str) -> NoteResult<Vec<String>> {
        let mut results = Vec::new();
        for (title, path) in self.note_files(scope)? {
            match fs::read_to_string(&path) {
                Ok(body) if body.contains(query) => results.push(title),
                Ok(_) => {}
                Err(e) => log_event_with_fields(
                    Event::NoteFailed,
                    &[
                        ("error", &e.to_string()),
                        ("op", "search"),
                        ("path", &path.display().to_string()),
                    ],
                ),
            }
        }
        Ok(results)
    }
}

fn write_new(path: &Path, body: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(body.as_bytes())
}
