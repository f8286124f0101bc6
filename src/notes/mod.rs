//! Note store
//!
//! The CRUD collaborator of the backup core: plain text files, one per note,
//! optionally grouped in scope directories. Each successful mutation calls
//! [`MutationListener::on_note_mutated`](crate::backup::MutationListener).

mod errors;
mod store;

pub use errors::{NoteError, NoteResult};
pub use store::NoteStore;
