//! Classification of change events into resolutions
//!
//! `classify` is pure: it decides what should happen and, for true conflicts,
//! computes the merged note. Applying the decision is the manager's job.

use crate::config::SyncSettings;
use crate::merge::{merge, MergeMode};
use crate::models::{ChangeEvent, ChangeOrigin, DocumentKind, Note, NoteId};

/// What to do about one change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing to do
    Ignore { id: NoteId, reason: &'static str },
    /// A saved search / tag definition changed
    TagListChanged,
    /// Remote upsert: store locally without forwarding back
    ApplyRemote(Note),
    /// Remote deletion: delete locally
    DeleteLocal(NoteId),
    /// Deleted on both sides
    BothDeleted(NoteId),
    /// Deleted remotely while edited locally: keep and re-send the local side
    KeepLocal(Note),
    /// Deleted locally while edited remotely: restore the remote side
    RestoreRemote(Note),
    /// Both sides identical: store quietly, no forward
    Duplicate(Note),
    /// Both sides differ: merged note to store and forward
    ///
    /// `marked` is false when the contents were equal and no merge markers
    /// were needed.
    Merged { note: Note, marked: bool },
    /// Merging failed: the local side is kept and re-sent
    MergeFailed { note: Note, reason: String },
}

impl Resolution {
    /// Short label for logs and CLI output
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Ignore { .. } => "ignore",
            Self::TagListChanged => "tag-list-changed",
            Self::ApplyRemote(_) => "apply-remote",
            Self::DeleteLocal(_) => "delete-local",
            Self::BothDeleted(_) => "both-deleted",
            Self::KeepLocal(_) => "keep-local",
            Self::RestoreRemote(_) => "restore-remote",
            Self::Duplicate(_) => "duplicate",
            Self::Merged { .. } => "merged",
            Self::MergeFailed { .. } => "merge-failed",
        }
    }
}

/// Decide how to resolve `event`.
pub fn classify(event: ChangeEvent, settings: &SyncSettings) -> Resolution {
    if event.document == DocumentKind::SavedSearch {
        return Resolution::TagListChanged;
    }

    let id = event.id;
    match (event.origin, event.old_value, event.new_value) {
        (ChangeOrigin::Local, _, _) => Resolution::Ignore {
            id,
            reason: "local change already persisted",
        },
        (ChangeOrigin::Remote, _, Some(new)) => Resolution::ApplyRemote(new),
        (ChangeOrigin::Remote, Some(_), None) => Resolution::DeleteLocal(id),
        (ChangeOrigin::Remote, None, None) => Resolution::Ignore {
            id,
            reason: "remote event without values",
        },
        (ChangeOrigin::Conflict, None, None) => Resolution::BothDeleted(id),
        (ChangeOrigin::Conflict, Some(old), None) => Resolution::KeepLocal(old),
        (ChangeOrigin::Conflict, None, Some(new)) => Resolution::RestoreRemote(new),
        (ChangeOrigin::Conflict, Some(old), Some(new)) => {
            if old.same_fields(&new) {
                Resolution::Duplicate(new)
            } else {
                merge_conflict(old, new, settings)
            }
        }
    }
}

/// Merge diverged local (`old`) and remote (`new`) versions.
///
/// The merged note takes the remote kind, the later of the two dates, and is
/// locked when either side was locked.
fn merge_conflict(old: Note, new: Note, settings: &SyncSettings) -> Resolution {
    let mut merged = new.clone();
    merged.date = old.date.max(new.date);
    merged.is_locked = old.is_locked || new.is_locked;

    let marked = old.content != new.content;
    if marked {
        let mode = MergeMode::for_kind(&new.kind);
        match merge(&old.content, &new.content, mode) {
            Ok(content) => merged.content = content,
            Err(error) => {
                return Resolution::MergeFailed {
                    note: old,
                    reason: error.to_string(),
                };
            }
        }
    }

    let max = settings.max_content_chars(&merged.kind);
    let len = merged.content_len();
    if len > max {
        return Resolution::MergeFailed {
            note: old,
            reason: format!("merged content has {len} characters (max {max})"),
        };
    }

    merged.refresh_derived();
    Resolution::Merged {
        note: merged,
        marked,
    }
}
