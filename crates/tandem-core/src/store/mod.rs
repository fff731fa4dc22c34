//! Interfaces to the local store and the remote sync channel
//!
//! Both are collaborators of the sync subsystem rather than part of it: the
//! local store is assumed durable, and the remote channel owns its transport.
//! Queuing and conflict handling live above these traits.

mod memory;

pub use memory::{Forwarded, MemoryRemote, MemoryStore};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::models::{ChangeEvent, Note, NoteId};

/// Durable local note storage
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Get a note by ID
    async fn get_note(&self, id: &NoteId) -> Result<Option<Note>>;

    /// Insert or replace a note, returning what was stored
    async fn put_note(&self, note: &Note) -> Result<Note>;

    /// Remove a note; missing notes are not an error
    async fn delete_note(&self, id: &NoteId) -> Result<()>;

    /// List notes, latest date first
    async fn list_notes(&self, limit: usize, offset: usize) -> Result<Vec<Note>>;
}

/// Channel to the shared remote store
#[async_trait]
pub trait RemoteChannel: Send + Sync {
    /// Send a local upsert to the remote store
    async fn forward_upsert(&self, note: &Note) -> Result<()>;

    /// Send a local deletion to the remote store
    async fn forward_delete(&self, id: &NoteId) -> Result<()>;

    /// Stream of change events, delivered independently of local calls
    ///
    /// Dropping the receiver unsubscribes.
    async fn subscribe(&self) -> mpsc::UnboundedReceiver<ChangeEvent>;
}
