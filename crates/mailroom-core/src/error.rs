//! Error types for the core library.

use thiserror::Error;

use crate::store::MailId;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The named mailbox does not exist.
    #[error("mailbox does not exist: {0}")]
    MailboxNotFound(String),

    /// The mailbox already exists.
    #[error("mailbox already exists: {0}")]
    MailboxExists(String),

    /// The operation is not allowed on this mailbox.
    #[error("operation not permitted: {0}")]
    NotPermitted(String),

    /// No message with this id, or it belongs to someone else.
    #[error("message not found: {0}")]
    MailNotFound(MailId),

    /// User lookup failed.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// A user with this name or address is already registered.
    #[error("user already exists: {0}")]
    UserExists(String),

    /// A new user failed validation.
    #[error("invalid user: {0}")]
    InvalidUser(String),

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// The relay refused the message.
    #[error("relay error: {0}")]
    Relay(String),

    /// HTTP request to the relay failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Certificate or key could not be used.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for mailroom_imap::BackendError {
    fn from(err: Error) -> Self {
        match err {
            Error::MailboxNotFound(name) => Self::NoSuchMailbox(name),
            Error::MailboxExists(name) => Self::MailboxExists(name),
            Error::NotPermitted(reason) => Self::NotPermitted(reason),
            other => Self::Store(other.to_string()),
        }
    }
}

impl From<Error> for mailroom_smtp::BackendError {
    fn from(err: Error) -> Self {
        match err {
            Error::UserNotFound(_) | Error::NotPermitted(_) => Self::Permanent(err.to_string()),
            other => Self::Temporary(other.to_string()),
        }
    }
}
