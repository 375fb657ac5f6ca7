//! Delivery backend seam.
//!
//! The session decides what a transaction is allowed to do; the backend
//! checks credentials and carries the message away.

use async_trait::async_trait;

use crate::error::BackendError;
use crate::types::{Address, Envelope};

/// Result type for backend calls.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Credential checks and message hand-off used by an SMTP session.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Checks a username and password.
    ///
    /// Returns the canonical user id on success and `None` on any mismatch.
    async fn authenticate(&self, username: &str, password: &str) -> BackendResult<Option<String>>;

    /// Returns true if a local address resolves to a user.
    async fn user_exists(&self, address: &Address) -> BackendResult<bool>;

    /// Returns true if `user` may send as the local `address`.
    ///
    /// The default accepts an address whose local part is the user id.
    async fn owns_address(&self, user: &str, address: &Address) -> BackendResult<bool> {
        Ok(address.local_part().eq_ignore_ascii_case(user))
    }

    /// Stores a message for every recipient in the envelope.
    ///
    /// Called for incoming mail and for the local recipients of outgoing mail.
    async fn deliver(&self, envelope: &Envelope, message: &[u8]) -> BackendResult<()>;

    /// Relays an outgoing message for the authenticated user.
    ///
    /// The envelope holds only the remote recipients and may hold none when
    /// every recipient was local.
    async fn relay(&self, envelope: &Envelope, message: &[u8]) -> BackendResult<()>;
}
