use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] tandem_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No note content provided")]
    EmptyContent,
    #[error("Note ID cannot be empty")]
    EmptyNoteId,
    #[error("Note not found for id/prefix: {0}")]
    NoteNotFound(String),
    #[error("{0}")]
    AmbiguousNoteId(String),
    #[error("Invalid content kind: {0}")]
    InvalidKind(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CliError {
    /// Text shown to the user on failure
    pub fn user_message(&self) -> String {
        match self {
            Self::Core(error) => tandem_core::sync::user_message(error),
            other => other.to_string(),
        }
    }
}
