//! Mailbox and user storage.
//!
//! The protocol bridges only talk to these traits. Each method is one
//! atomic call: a reader never sees half of a write.

mod memory;
mod model;

use async_trait::async_trait;
use mailroom_imap::{FlagSet, Mailbox, MailboxInfo};

pub use memory::{DEFAULT_MAILBOXES, MemoryStore};
pub use model::{HeaderOptions, Mail, MailBodyData, MailHeaderData, MailId, MailboxState};

use crate::Result;
use crate::account::{User, UserQuery};

/// Per-user mail storage.
#[async_trait]
pub trait MailboxStore: Send + Sync {
    /// Lists the messages of a mailbox in ascending UID order.
    async fn get_mail_headers(
        &self,
        user: &str,
        mailbox: &Mailbox,
        options: HeaderOptions,
    ) -> Result<Vec<MailHeaderData>>;

    /// Returns the content of one of the user's messages.
    async fn get_mail_body(&self, user: &str, id: MailId) -> Result<MailBodyData>;

    /// Sets `\Seen`.
    async fn mark_read(&self, id: MailId) -> Result<()>;

    /// Sets or clears `\Flagged`.
    async fn mark_saved(&self, id: MailId, saved: bool) -> Result<()>;

    /// Removes a message for good.
    async fn delete_mail(&self, id: MailId) -> Result<()>;

    /// Stores a message for a user and returns its UID.
    async fn save_mail(&self, user_id: &str, mail: Mail) -> Result<u32>;

    /// Replaces the flags of several messages at once.
    async fn set_flags(&self, changes: &[(MailId, FlagSet)]) -> Result<()>;

    /// Copies messages into another mailbox of the same user.
    async fn copy_mail(&self, user: &str, ids: &[MailId], to: &Mailbox) -> Result<()>;

    /// Lists every mailbox of the user.
    async fn list_mailboxes(&self, user: &str) -> Result<Vec<MailboxInfo>>;

    /// Creates a mailbox.
    async fn create_mailbox(&self, user: &str, mailbox: &Mailbox) -> Result<()>;

    /// Deletes a mailbox and the messages in it.
    async fn delete_mailbox(&self, user: &str, mailbox: &Mailbox) -> Result<()>;

    /// Renames a mailbox and its children.
    async fn rename_mailbox(&self, user: &str, from: &Mailbox, to: &Mailbox) -> Result<()>;

    /// Marks a mailbox as subscribed.
    async fn subscribe(&self, user: &str, mailbox: &Mailbox) -> Result<()>;

    /// Clears a subscription.
    async fn unsubscribe(&self, user: &str, mailbox: &Mailbox) -> Result<()>;

    /// Returns UIDVALIDITY and UIDNEXT of a mailbox.
    async fn mailbox_info(&self, user: &str, mailbox: &Mailbox) -> Result<MailboxState>;
}

/// Credential lookups.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user, or `None`.
    async fn get_user(&self, query: UserQuery<'_>) -> Result<Option<User>>;
}
