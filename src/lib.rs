//! notekeeper - a local note store with versioned, retention-bounded backups
//!
//! Every note mutation snapshots the affected scope into a timestamped
//! archive; each scope keeps its newest archives up to a fixed limit.

pub mod backup;
pub mod cli;
pub mod config;
pub mod http_server;
pub mod naming;
pub mod notes;
pub mod observability;
pub mod restore;
