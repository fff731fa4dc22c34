//! Data models for Tandem

mod change;
mod note;
mod notice;

pub use change::{ChangeEvent, ChangeOrigin, DocumentKind, WriteOrigin};
pub use note::{search_tokens, ContentKind, Note, NoteId, NoteSummary, MAX_TITLE_CHARS};
pub use notice::{Notice, Severity};
