//! Session-scoped synchronization manager

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use super::classifier::{classify, Resolution};
use super::notifier::{NoticeReceiver, Notifier};
use super::queue::{UpsertOutcome, WriteQueue};
use crate::config::SyncSettings;
use crate::error::{Error, Result};
use crate::models::{ChangeEvent, Note, NoteId, Notice, WriteOrigin};
use crate::store::{LocalStore, RemoteChannel};

const SIGNAL_CAPACITY: usize = 64;

/// Signals for views that mirror sync state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncSignal {
    TagListChanged,
    NoteChanged(NoteId),
    NoteDeleted(NoteId),
}

struct ManagerInner {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteChannel>,
    queue: WriteQueue,
    notifier: Notifier,
    signals: broadcast::Sender<SyncSignal>,
    settings: SyncSettings,
}

struct Listener {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Owns the write queue, the notifier and the remote subscription for one
/// application session.
pub struct SyncManager {
    inner: Arc<ManagerInner>,
    listener: Option<Listener>,
}

impl SyncManager {
    /// Build a manager without subscribing to remote events.
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteChannel>,
        settings: SyncSettings,
    ) -> (Self, NoticeReceiver) {
        let (notifier, notices) = Notifier::new(settings.notice_backoff);
        let queue = WriteQueue::new(
            Arc::clone(&store),
            Arc::clone(&remote),
            notifier.clone(),
            settings.clone(),
        );
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        let manager = Self {
            inner: Arc::new(ManagerInner {
                store,
                remote,
                queue,
                notifier,
                signals,
                settings,
            }),
            listener: None,
        };
        (manager, notices)
    }

    /// Build a manager and start listening to the remote event stream.
    pub async fn start(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteChannel>,
        settings: SyncSettings,
    ) -> (Self, NoticeReceiver) {
        let (mut manager, notices) = Self::new(store, remote, settings);
        let events = manager.inner.remote.subscribe().await;
        manager.listen(events);
        tracing::info!("Sync manager started");
        (manager, notices)
    }

    fn listen(&mut self, mut events: mpsc::UnboundedReceiver<ChangeEvent>) {
        let (stop, mut stopped) = oneshot::channel();
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    event = events.recv() => {
                        let Some(event) = event else {
                            tracing::info!("Remote event stream closed");
                            break;
                        };
                        if let Err(error) = inner.handle_event(event).await {
                            inner.notifier.report(&error);
                        }
                    }
                }
            }
        });
        self.listener = Some(Listener { stop, handle });
    }

    /// Queue a note write; the editor's entrypoint.
    pub async fn upsert_note(&self, note: Note, origin: WriteOrigin) -> Result<UpsertOutcome> {
        let outcome = self.inner.queue.upsert(note, origin).await?;
        if let UpsertOutcome::Persisted(summary) = &outcome {
            self.inner.signal(SyncSignal::NoteChanged(summary.id));
        }
        Ok(outcome)
    }

    /// Delete a note on behalf of the user.
    ///
    /// Locked notes are refused with `Error::NoteLocked`.
    pub async fn delete_note(&self, id: &NoteId) -> Result<()> {
        let note = self
            .inner
            .store
            .get_note(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if note.is_locked {
            return Err(Error::NoteLocked(*id));
        }

        self.inner.queue.discard(id);
        self.inner.store.delete_note(id).await?;
        if let Err(error) = self.inner.remote.forward_delete(id).await {
            tracing::warn!(%id, "Forwarding delete to remote failed: {error}");
            self.inner.notifier.report(&error);
        }
        self.inner.signal(SyncSignal::NoteDeleted(*id));
        Ok(())
    }

    /// Classify and apply one change event.
    pub async fn handle_event(&self, event: ChangeEvent) -> Result<Resolution> {
        self.inner.handle_event(event).await
    }

    pub async fn get_note(&self, id: &NoteId) -> Result<Option<Note>> {
        self.inner.store.get_note(id).await
    }

    pub async fn list_notes(&self, limit: usize, offset: usize) -> Result<Vec<Note>> {
        self.inner.store.list_notes(limit, offset).await
    }

    pub fn signals(&self) -> broadcast::Receiver<SyncSignal> {
        self.inner.signals.subscribe()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    pub fn queue(&self) -> &WriteQueue {
        &self.inner.queue
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Unsubscribe from remote events and wait for queued writes to settle.
    pub async fn shutdown(&mut self) {
        if let Some(listener) = self.listener.take() {
            let _ = listener.stop.send(());
            if let Err(error) = listener.handle.await {
                tracing::warn!("Sync listener ended abnormally: {error}");
            }
        }
        self.inner.queue.wait_idle().await;
        tracing::info!("Sync manager stopped");
    }
}

impl ManagerInner {
    async fn handle_event(&self, event: ChangeEvent) -> Result<Resolution> {
        let id = event.id;
        let resolution = classify(event, &self.settings);
        tracing::info!(%id, resolution = resolution.label(), "Resolving change event");
        self.apply(&resolution).await?;
        Ok(resolution)
    }

    async fn apply(&self, resolution: &Resolution) -> Result<()> {
        match resolution {
            Resolution::Ignore { id, reason } => {
                tracing::debug!(%id, "Ignoring change event: {reason}");
            }
            Resolution::TagListChanged => self.signal(SyncSignal::TagListChanged),
            Resolution::ApplyRemote(note) => {
                self.persist(note, WriteOrigin::Remote).await?;
            }
            Resolution::DeleteLocal(id) => {
                if self.queue.discard(id) {
                    tracing::info!(%id, "Dropped queued write for remotely deleted note");
                }
                if self.store.get_note(id).await?.is_none() {
                    return Err(Error::Quiet(format!("nothing to delete for {id}")));
                }
                self.store.delete_note(id).await?;
                self.signal(SyncSignal::NoteDeleted(*id));
            }
            Resolution::BothDeleted(id) => {
                tracing::info!(%id, "Note deleted on both sides");
            }
            Resolution::KeepLocal(note) => {
                self.persist(note, WriteOrigin::Conflict).await?;
                self.notifier.notify(Notice::info(format!(
                    "\"{}\" was deleted on another device; your version was kept.",
                    display_title(note)
                )));
            }
            Resolution::RestoreRemote(note) => {
                self.persist(note, WriteOrigin::Conflict).await?;
                self.notifier.notify(Notice::info(format!(
                    "\"{}\" was edited on another device and has been restored.",
                    display_title(note)
                )));
            }
            Resolution::Duplicate(note) => {
                self.persist(note, WriteOrigin::Remote).await?;
            }
            Resolution::Merged { note, marked } => {
                self.persist(note, WriteOrigin::Conflict).await?;
                if *marked {
                    self.notifier.notify(Notice::warning(format!(
                        "\"{}\" was changed on two devices. Review the marked changes.",
                        display_title(note)
                    )));
                }
            }
            Resolution::MergeFailed { note, reason } => {
                tracing::warn!(id = %note.id, "Conflict merge failed: {reason}");
                self.persist(note, WriteOrigin::Conflict).await?;
                self.notifier.notify(Notice::warning(format!(
                    "\"{}\" could not be merged; your version was kept.",
                    display_title(note)
                )));
            }
        }
        Ok(())
    }

    async fn persist(&self, note: &Note, origin: WriteOrigin) -> Result<()> {
        if let UpsertOutcome::Persisted(summary) = self.queue.upsert(note.clone(), origin).await? {
            self.signal(SyncSignal::NoteChanged(summary.id));
        }
        Ok(())
    }

    fn signal(&self, signal: SyncSignal) {
        // No subscribers is fine.
        let _ = self.signals.send(signal);
    }
}

fn display_title(note: &Note) -> &str {
    if note.title.is_empty() {
        "Untitled"
    } else {
        &note.title
    }
}
