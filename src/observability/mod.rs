//! Observability for notekeeper
//!
//! Structured JSON-line logging keyed by typed lifecycle events.
//!
//! # Usage
//!
//! ```ignore
//! use notekeeper::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::BackupComplete, &[("scope", "work")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event with fields
///
/// Failure events are logged at ERROR, everything else at INFO.
/// `ArchivePartial` is a WARN: the backup already failed and was logged.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_failure() {
        Severity::Error
    } else if event == Event::ArchivePartial {
        Severity::Warn
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}
