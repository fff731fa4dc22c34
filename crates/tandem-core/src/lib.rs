//! tandem-core - Core library for Tandem
//!
//! Local-first note synchronization: a structural differencer for merging
//! diverged note contents, a classifier for remote and conflict change events,
//! a per-note write coalescing queue, and the manager tying them to a local
//! store and a remote channel.

pub mod config;
pub mod db;
pub mod error;
pub mod merge;
pub mod models;
pub mod store;
pub mod sync;
pub mod util;

pub use config::SyncSettings;
pub use db::LibSqlNoteStore;
pub use error::{Error, RemoteError, Result};
pub use models::{ChangeEvent, ContentKind, Note, NoteId, Notice, WriteOrigin};
pub use sync::{SyncManager, SyncSignal, UpsertOutcome};
