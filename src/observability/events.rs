//! Observable events
//!
//! Every log line the application emits names one of these events.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded
    ConfigLoaded,
    /// HTTP server bound and serving
    ServerStart,
    /// HTTP server failed to bind or crashed
    ServerFailed,

    // Note store
    /// Note created
    NoteCreated,
    /// Note content updated or renamed
    NoteEdited,
    /// Note deleted
    NoteDeleted,
    /// Every note of a scope deleted
    NotesCleared,
    /// Note store operation failed
    NoteFailed,

    // Backup
    /// Backup started
    BackupStart,
    /// Backup complete
    BackupComplete,
    /// Backup failed
    BackupFailed,
    /// A partially written archive was left behind
    ArchivePartial,
    /// An old archive was removed by retention
    ArchivePruned,
    /// Retention could not remove an old archive
    ArchivePruneFailed,

    // Restore
    /// Restore started
    RestoreStart,
    /// Restore complete
    RestoreComplete,
    /// Restore aborted
    RestoreFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ServerStart => "SERVER_START",
            Event::ServerFailed => "SERVER_FAILED",

            Event::NoteCreated => "NOTE_CREATED",
            Event::NoteEdited => "NOTE_EDITED",
            Event::NoteDeleted => "NOTE_DELETED",
            Event::NotesCleared => "NOTES_CLEARED",
            Event::NoteFailed => "NOTE_FAILED",

            Event::BackupStart => "BACKUP_START",
            Event::BackupComplete => "BACKUP_COMPLETE",
            Event::BackupFailed => "BACKUP_FAILED",
            Event::ArchivePartial => "ARCHIVE_PARTIAL",
            Event::ArchivePruned => "ARCHIVE_PRUNED",
            Event::ArchivePruneFailed => "ARCHIVE_PRUNE_FAILED",

            Event::RestoreStart => "RESTORE_START",
            Event::RestoreComplete => "RESTORE_COMPLETE",
            Event::RestoreFailed => "RESTORE_FAILED",
        }
    }

    /// Returns true if this event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::ServerFailed
                | Event::NoteFailed
                | Event::BackupFailed
                | Event::ArchivePruneFailed
                | Event::RestoreFailed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
