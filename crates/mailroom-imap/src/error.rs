//! Error types for the IMAP server library.

use thiserror::Error;

use crate::types::Tag;

/// Errors that can occur while serving an IMAP connection.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Low-level syntax error found by the scanner.
    #[error("Syntax error at position {position}: {message}")]
    Syntax {
        /// Byte position where the error occurred.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// A complete command failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Framing violation (line or literal over the configured limits).
    #[error("Framing error: {0}")]
    Framing(String),

    /// The mailbox or credential backend failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Protocol violation or unexpected data.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// A command line that could not be turned into a [`crate::Command`].
///
/// The tag is kept whenever it could be read so the session can still
/// answer with a tagged `BAD`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ParseError {
    /// Tag of the offending command, if it was readable.
    pub tag: Option<Tag>,
    /// Human-readable reason.
    pub reason: String,
}

impl ParseError {
    /// Creates a parse error for a command whose tag is known.
    #[must_use]
    pub fn tagged(tag: Tag, reason: impl Into<String>) -> Self {
        Self {
            tag: Some(tag),
            reason: reason.into(),
        }
    }

    /// Creates a parse error for a line without a readable tag.
    #[must_use]
    pub fn untagged(reason: impl Into<String>) -> Self {
        Self {
            tag: None,
            reason: reason.into(),
        }
    }
}

/// Failure reported by a [`crate::Backend`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The named mailbox does not exist.
    #[error("mailbox does not exist: {0}")]
    NoSuchMailbox(String),

    /// The mailbox already exists.
    #[error("mailbox already exists: {0}")]
    MailboxExists(String),

    /// The operation is not permitted on this mailbox (e.g. deleting INBOX).
    #[error("operation not permitted: {0}")]
    NotPermitted(String),

    /// Any other store failure.
    #[error("{0}")]
    Store(String),
}
