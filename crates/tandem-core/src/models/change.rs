//! Change event model

use serde::{Deserialize, Serialize};

use super::note::{Note, NoteId};

/// Where an observed transition came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOrigin {
    Local,
    Remote,
    Conflict,
}

/// Kind of document a change event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    #[default]
    Note,
    /// A saved search / tag definition
    SavedSearch,
}

/// One observed transition for a note id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub origin: ChangeOrigin,
    pub id: NoteId,
    #[serde(default)]
    pub document: DocumentKind,
    /// Shared ancestor, when known
    #[serde(default)]
    pub last_common_value: Option<Note>,
    /// Local side
    #[serde(default)]
    pub old_value: Option<Note>,
    /// Remote side
    #[serde(default)]
    pub new_value: Option<Note>,
}

impl ChangeEvent {
    /// A remote upsert of `note`
    pub fn remote_upsert(note: Note) -> Self {
        Self {
            origin: ChangeOrigin::Remote,
            id: note.id,
            document: DocumentKind::Note,
            last_common_value: None,
            old_value: None,
            new_value: Some(note),
        }
    }

    /// A remote deletion of `note`
    pub fn remote_delete(note: Note) -> Self {
        Self {
            origin: ChangeOrigin::Remote,
            id: note.id,
            document: DocumentKind::Note,
            last_common_value: None,
            old_value: Some(note),
            new_value: None,
        }
    }

    /// A conflict between the local (`old`) and remote (`new`) sides
    pub fn conflict(id: NoteId, old: Option<Note>, new: Option<Note>) -> Self {
        Self {
            origin: ChangeOrigin::Conflict,
            id,
            document: DocumentKind::Note,
            last_common_value: None,
            old_value: old,
            new_value: new,
        }
    }

    #[must_use]
    pub fn with_common_value(mut self, ancestor: Note) -> Self {
        self.last_common_value = Some(ancestor);
        self
    }
}

/// Origin tag carried by a queued write
///
/// Only `Remote` writes skip forwarding, so a value that arrived from the
/// remote channel is never echoed back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOrigin {
    #[default]
    Local,
    Remote,
    Conflict,
}

impl WriteOrigin {
    pub const fn forwards_to_remote(self) -> bool {
        !matches!(self, Self::Remote)
    }
}
