//! In-memory store and remote channel

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use super::{LocalStore, RemoteChannel};
use crate::error::{Error, RemoteError, Result};
use crate::models::{ChangeEvent, Note, NoteId};

/// `LocalStore` kept in a map, recording every physical write.
#[derive(Default)]
pub struct MemoryStore {
    notes: Mutex<HashMap<NoteId, Note>>,
    writes: Mutex<Vec<Note>>,
    write_delay: Option<Duration>,
    fail_writes: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `put_note` take at least `delay`.
    #[must_use]
    pub const fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Make subsequent writes fail (or succeed again).
    pub async fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().await = fail;
    }

    /// Every note passed to `put_note`, in order.
    pub async fn writes(&self) -> Vec<Note> {
        self.writes.lock().await.clone()
    }

    /// Physical writes recorded for one id.
    pub async fn writes_for(&self, id: &NoteId) -> Vec<Note> {
        self.writes
            .lock()
            .await
            .iter()
            .filter(|note| note.id == *id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn get_note(&self, id: &NoteId) -> Result<Option<Note>> {
        Ok(self.notes.lock().await.get(id).cloned())
    }

    async fn put_note(&self, note: &Note) -> Result<Note> {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_writes.lock().await {
            return Err(Error::Database(format!("write rejected for {}", note.id)));
        }
        self.writes.lock().await.push(note.clone());
        self.notes.lock().await.insert(note.id, note.clone());
        Ok(note.clone())
    }

    async fn delete_note(&self, id: &NoteId) -> Result<()> {
        self.notes.lock().await.remove(id);
        Ok(())
    }

    async fn list_notes(&self, limit: usize, offset: usize) -> Result<Vec<Note>> {
        let mut notes = self
            .notes
            .lock()
            .await
            .values()
            .cloned()
            .collect::<Vec<_>>();
        notes.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
        Ok(notes.into_iter().skip(offset).take(limit).collect())
    }
}

/// A call received by `MemoryRemote`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Forwarded {
    Upsert(Note),
    Delete(NoteId),
}

/// `RemoteChannel` that records forwards and lets callers inject events.
#[derive(Default)]
pub struct MemoryRemote {
    forwarded: Mutex<Vec<Forwarded>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ChangeEvent>>>,
    failure: Mutex<Option<RemoteError>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every live subscriber.
    ///
    /// Returns how many subscribers received it.
    pub async fn emit(&self, event: ChangeEvent) -> usize {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
        subscribers.len()
    }

    /// Make subsequent forwards fail with `error` (or succeed with `None`).
    pub async fn set_failure(&self, error: Option<RemoteError>) {
        *self.failure.lock().await = error;
    }

    pub async fn forwarded(&self) -> Vec<Forwarded> {
        self.forwarded.lock().await.clone()
    }

    async fn record(&self, call: Forwarded) -> Result<()> {
        if let Some(error) = self.failure.lock().await.clone() {
            return Err(error.into());
        }
        self.forwarded.lock().await.push(call);
        Ok(())
    }
}

#[async_trait]
impl RemoteChannel for MemoryRemote {
    async fn forward_upsert(&self, note: &Note) -> Result<()> {
        self.record(Forwarded::Upsert(note.clone())).await
    }

    async fn forward_delete(&self, id: &NoteId) -> Result<()> {
        self.record(Forwarded::Delete(*id)).await
    }

    async fn subscribe(&self) -> mpsc::UnboundedReceiver<ChangeEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.lock().await.push(sender);
        receiver
    }
}
