//! Mailbox backend seam.
//!
//! The session never touches storage directly: every command that reads or
//! changes mailbox state makes exactly one call on a [`Backend`]. Backends
//! are shared between connections and must do their own locking.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::error::BackendError;
use crate::response::Envelope;
use crate::types::{FlagSet, Mailbox, MailboxStatus};

/// Result type for backend calls.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// A mailbox as reported by [`Backend::list_mailboxes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxInfo {
    /// Mailbox name.
    pub name: Mailbox,
    /// Whether the user subscribed to it.
    pub subscribed: bool,
}

/// Per-message metadata needed to answer FETCH and SEARCH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageMeta {
    /// Message UID, unique and ascending within the mailbox.
    pub uid: u32,
    /// The five tracked flags.
    pub flags: FlagSet,
    /// Whether this session is the first to see the message.
    pub recent: bool,
    /// Date the message was stored.
    pub internal_date: DateTime<FixedOffset>,
    /// Size of the raw message in bytes.
    pub size: u32,
    /// Parsed envelope headers.
    pub envelope: Envelope,
}

/// Storage and credential operations used by an IMAP session.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Checks a username and password.
    ///
    /// Returns the canonical user id on success and `None` on any mismatch;
    /// the caller never learns which part was wrong.
    async fn authenticate(&self, username: &str, password: &str) -> BackendResult<Option<String>>;

    /// Lists every mailbox of the user.
    async fn list_mailboxes(&self, user: &str) -> BackendResult<Vec<MailboxInfo>>;

    /// Creates a mailbox.
    async fn create_mailbox(&self, user: &str, mailbox: &Mailbox) -> BackendResult<()>;

    /// Deletes a mailbox and its messages.
    async fn delete_mailbox(&self, user: &str, mailbox: &Mailbox) -> BackendResult<()>;

    /// Renames a mailbox, children included.
    async fn rename_mailbox(&self, user: &str, from: &Mailbox, to: &Mailbox) -> BackendResult<()>;

    /// Marks a mailbox as subscribed.
    async fn subscribe(&self, user: &str, mailbox: &Mailbox) -> BackendResult<()>;

    /// Removes a subscription.
    async fn unsubscribe(&self, user: &str, mailbox: &Mailbox) -> BackendResult<()>;

    /// Returns the counters of a mailbox.
    async fn mailbox_status(&self, user: &str, mailbox: &Mailbox) -> BackendResult<MailboxStatus>;

    /// Returns message metadata ordered by ascending UID.
    ///
    /// The position in the returned list is the message sequence number
    /// minus one.
    async fn messages(&self, user: &str, mailbox: &Mailbox) -> BackendResult<Vec<MessageMeta>>;

    /// Returns the raw RFC 5322 bytes of a message.
    async fn fetch_message(&self, user: &str, mailbox: &Mailbox, uid: u32) -> BackendResult<Vec<u8>>;

    /// Replaces the flags of the listed messages.
    async fn store_flags(
        &self,
        user: &str,
        mailbox: &Mailbox,
        changes: &[(u32, FlagSet)],
    ) -> BackendResult<()>;

    /// Stores a new message and returns its UID.
    async fn append(
        &self,
        user: &str,
        mailbox: &Mailbox,
        message: Vec<u8>,
        flags: FlagSet,
        date: Option<DateTime<FixedOffset>>,
    ) -> BackendResult<u32>;

    /// Permanently removes the listed messages.
    async fn expunge(&self, user: &str, mailbox: &Mailbox, uids: &[u32]) -> BackendResult<()>;

    /// Copies the listed messages into another mailbox.
    async fn copy(
        &self,
        user: &str,
        from: &Mailbox,
        uids: &[u32],
        to: &Mailbox,
    ) -> BackendResult<()>;
}
