//! Synchronization and conflict resolution
//!
//! Local edits go through the `WriteQueue`, which writes to the local store
//! and forwards to the remote channel. Remote change events are classified by
//! `classify` and applied by the `SyncManager`; true conflicts are merged by
//! `crate::merge` and re-enter the queue.

mod classifier;
mod manager;
mod notifier;
mod queue;

pub use classifier::{classify, Resolution};
pub use manager::{SyncManager, SyncSignal};
pub use notifier::{
    user_message, NoticeBackoff, NoticeReceiver, Notifier, CONTENT_TOO_LONG_MESSAGE,
    GENERIC_ERROR_MESSAGE, NOTE_LOCKED_MESSAGE,
};
pub use queue::{validate_note, UpsertOutcome, WriteQueue};
