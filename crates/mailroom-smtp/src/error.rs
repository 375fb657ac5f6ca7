//! Error types for the SMTP server.

use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Protocol error (line too long, unexpected data).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Invalid listener setup.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure reported by a [`crate::Backend`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The store or relay is unavailable; the client may retry (4xx).
    #[error("temporary failure: {0}")]
    Temporary(String),

    /// The message was refused for good (5xx).
    #[error("permanent failure: {0}")]
    Permanent(String),
}

impl BackendError {
    /// Returns true if this is a permanent failure.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }
}

/// Why a command line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The verb is not one the server knows (500).
    #[error("unrecognized command: {0}")]
    Unrecognized(String),

    /// The verb is known but its arguments are malformed (501).
    #[error("syntax error: {0}")]
    Syntax(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanence() {
        assert!(BackendError::Permanent("x".into()).is_permanent());
        assert!(!BackendError::Temporary("x".into()).is_permanent());
    }

    #[test]
    fn display() {
        assert_eq!(
            Error::InvalidAddress("a@".into()).to_string(),
            "Invalid email address: a@"
        );
    }
}
