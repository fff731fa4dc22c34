//! Error types for tandem-core

use thiserror::Error;

use crate::models::NoteId;

/// Result type alias using tandem-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tandem-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed note field, rejected before queuing
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Content exceeds the maximum length for its content kind
    #[error("Content too long for {kind}: {len} characters (max {max})")]
    ContentTooLong {
        kind: String,
        len: usize,
        max: usize,
    },

    /// Deleting a locked note
    #[error("Note is locked: {0}")]
    NoteLocked(NoteId),

    /// Expected condition that is logged but never surfaced
    #[error("{0}")]
    Quiet(String),

    /// Remote channel failure
    #[error("Remote error: {0}")]
    Remote(RemoteError),

    /// Markup could not be tokenized for merging
    #[error("Merge error: {0}")]
    Merge(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Note not found
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error should only be logged.
    pub const fn is_quiet(&self) -> bool {
        matches!(self, Self::Quiet(_))
    }

    /// Whether this error is a transient remote/network condition.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Remote(remote) if remote.transient)
    }
}

impl From<RemoteError> for Error {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

/// Failure reported by a remote channel implementation.
///
/// `user_message` is text meant for the end user; `upstream_message` is a
/// structured message relayed from the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
    pub user_message: Option<String>,
    pub upstream_message: Option<String>,
    pub transient: bool,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            user_message: None,
            upstream_message: None,
            transient: false,
        }
    }

    /// A network-level failure expected to clear up on its own.
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            transient: true,
            ..Self::new(message)
        }
    }

    #[must_use]
    pub fn with_user_message(mut self, message: impl Into<String>) -> Self {
        self.user_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_upstream_message(mut self, message: impl Into<String>) -> Self {
        self.upstream_message = Some(message.into());
        self
    }
}
