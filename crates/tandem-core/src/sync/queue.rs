//! Per-note write coalescing
//!
//! Each note id has at most one pending write and at most one active drain.
//! A new upsert overwrites the pending write instead of queuing behind it, so a
//! burst of edits costs at most two physical writes: the one already in flight
//! and one carrying the final state, issued after the cooldown.

use std::collections::{HashMap, HashSet};
use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{oneshot, Notify};

use super::notifier::Notifier;
use crate::config::SyncSettings;
use crate::error::{Error, Result};
use crate::models::{Note, NoteId, NoteSummary, WriteOrigin};
use crate::store::{LocalStore, RemoteChannel};

/// What happened to an upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// This call drained the note and it is now stored locally
    Persisted(NoteSummary),
    /// A drain was already active; the value will be written after its cooldown
    Coalesced(NoteId),
}

#[derive(Debug)]
struct PendingWrite {
    note: Note,
    origin: WriteOrigin,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: HashMap<NoteId, PendingWrite>,
    draining: HashSet<NoteId>,
}

struct QueueInner {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteChannel>,
    notifier: Notifier,
    settings: SyncSettings,
    state: Mutex<QueueState>,
    idle: Notify,
}

/// Coalescing write queue keyed by note id.
///
/// Cloning shares the same queue.
#[derive(Clone)]
pub struct WriteQueue {
    inner: Arc<QueueInner>,
}

impl WriteQueue {
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteChannel>,
        notifier: Notifier,
        settings: SyncSettings,
    ) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                store,
                remote,
                notifier,
                settings,
                state: Mutex::new(QueueState::default()),
                idle: Notify::new(),
            }),
        }
    }

    /// Queue a write of `note`.
    ///
    /// Validation failures are returned before anything is queued. When this
    /// call starts the drain, it waits for the local write and returns its
    /// result; otherwise it returns `Coalesced` immediately. The drain runs on
    /// its own task, so dropping the returned future does not stop it.
    pub async fn upsert(&self, note: Note, origin: WriteOrigin) -> Result<UpsertOutcome> {
        let note = validate_note(note, &self.inner.settings)?;
        let id = note.id;

        {
            let mut state = self.lock_state();
            state.pending.insert(id, PendingWrite { note, origin });
            if !state.draining.insert(id) {
                tracing::debug!(%id, "Write coalesced into active drain");
                return Ok(UpsertOutcome::Coalesced(id));
            }
        }

        let (reply, outcome) = oneshot::channel();
        let queue = self.clone();
        tokio::spawn(async move { queue.run_drain(id, reply).await });

        outcome
            .await
            .map_err(|_| Error::Database(format!("write task for {id} ended without a result")))?
    }

    /// Drop a not-yet-started write for `id`.
    pub fn discard(&self, id: &NoteId) -> bool {
        self.lock_state().pending.remove(id).is_some()
    }

    /// Whether `id` has an active drain
    pub fn is_draining(&self, id: &NoteId) -> bool {
        self.lock_state().draining.contains(id)
    }

    /// Wait until no note has an active drain.
    pub async fn wait_idle(&self) {
        loop {
            let mut notified = pin!(self.inner.idle.notified());
            notified.as_mut().enable();
            if self.lock_state().draining.is_empty() {
                return;
            }
            notified.await;
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.inner.settings.write_cooldown()
    }

    /// Take the pending write for `id` and persist it.
    async fn drain(&self, id: NoteId) -> Result<Option<NoteSummary>> {
        let write = self.lock_state().pending.remove(&id);
        let Some(write) = write else {
            return Ok(None);
        };

        let saved = self.inner.store.put_note(&write.note).await?;
        tracing::debug!(%id, origin = ?write.origin, "Note written locally");

        if write.origin.forwards_to_remote() {
            if let Err(error) = self.inner.remote.forward_upsert(&saved).await {
                tracing::warn!(%id, "Forwarding note to remote failed: {error}");
                self.inner.notifier.report(&error);
            }
        }

        Ok(Some(saved.summary()))
    }

    /// First drain for `id`, then the cooldown loop. The first result goes to
    /// `reply`; if nobody is waiting for it, failures go to the notifier.
    async fn run_drain(self, id: NoteId, reply: oneshot::Sender<Result<UpsertOutcome>>) {
        match self.drain(id).await {
            Ok(Some(summary)) => {
                let _ = reply.send(Ok(UpsertOutcome::Persisted(summary)));
                self.cooldown_loop(id).await;
            }
            Ok(None) => {
                self.release(id);
                let _ = reply.send(Ok(UpsertOutcome::Coalesced(id)));
            }
            Err(error) => {
                self.release(id);
                if let Err(Err(error)) = reply.send(Err(error)) {
                    tracing::warn!(%id, "Write failed after caller left: {error}");
                    self.inner.notifier.report(&error);
                }
            }
        }
    }

    /// After each cooldown, drain again if a newer value arrived, else go idle.
    async fn cooldown_loop(self, id: NoteId) {
        loop {
            tokio::time::sleep(self.cooldown()).await;

            let has_pending = {
                let mut state = self.lock_state();
                let has_pending = state.pending.contains_key(&id);
                if !has_pending {
                    state.draining.remove(&id);
                }
                has_pending
            };
            if !has_pending {
                tracing::debug!(%id, "Write queue idle");
                self.inner.idle.notify_waiters();
                return;
            }

            if let Err(error) = self.drain(id).await {
                tracing::warn!(%id, "Deferred write failed: {error}");
                self.release(id);
                self.inner.notifier.report(&error);
                return;
            }
        }
    }

    fn release(&self, id: NoteId) {
        self.lock_state().draining.remove(&id);
        self.inner.idle.notify_waiters();
    }

    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Reject malformed notes and refresh derived fields.
pub fn validate_note(mut note: Note, settings: &SyncSettings) -> Result<Note> {
    if note.kind.name.trim().is_empty() {
        return Err(Error::InvalidInput(
            "content kind must not be empty".to_string(),
        ));
    }
    if note.date < 0 {
        return Err(Error::InvalidInput(format!(
            "note date must not be negative, got {}",
            note.date
        )));
    }

    let max = settings.max_content_chars(&note.kind);
    let len = note.content_len();
    if len > max {
        return Err(Error::ContentTooLong {
            kind: note.kind.name.clone(),
            len,
            max,
        });
    }

    note.refresh_derived();
    Ok(note)
}
