//! Mail storage model types.

use chrono::{DateTime, FixedOffset, Utc};
use mailroom_imap::{FlagSet, Mailbox};
use mailroom_mime::{Attachment, MailAddress, Message, ParsedMail};

/// Store-wide message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MailId(pub u64);

impl std::fmt::Display for MailId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message about to be stored.
#[derive(Debug, Clone)]
pub struct Mail {
    /// Destination mailbox.
    pub mailbox: Mailbox,
    /// Raw RFC 5322 bytes.
    pub raw: Vec<u8>,
    /// Parsed headers, bodies and attachments.
    pub parsed: ParsedMail,
    /// Initial flags.
    pub flags: FlagSet,
    /// Date the message reached the server.
    pub internal_date: DateTime<FixedOffset>,
}

impl Mail {
    /// Parses `raw` for storage in `mailbox`, unflagged and dated now.
    #[must_use]
    pub fn new(mailbox: Mailbox, raw: Vec<u8>) -> Self {
        let parsed = Message::parse(&raw).summary();
        Self {
            mailbox,
            raw,
            parsed,
            flags: FlagSet::default(),
            internal_date: Utc::now().fixed_offset(),
        }
    }

    /// Sets the initial flags.
    #[must_use]
    pub const fn with_flags(mut self, flags: FlagSet) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the internal date.
    #[must_use]
    pub const fn with_internal_date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.internal_date = date;
        self
    }
}

/// Header-level view of a stored message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailHeaderData {
    /// Store-wide id.
    pub id: MailId,
    /// UID within its mailbox.
    pub uid: u32,
    /// Mailbox holding the message.
    pub mailbox: Mailbox,
    /// Decoded subject.
    pub subject: Option<String>,
    /// `From` mailboxes.
    pub from: Vec<MailAddress>,
    /// `To` mailboxes.
    pub to: Vec<MailAddress>,
    /// `Cc` mailboxes.
    pub cc: Vec<MailAddress>,
    /// `Reply-To` mailboxes.
    pub reply_to: Vec<MailAddress>,
    /// `Message-ID`.
    pub message_id: Option<String>,
    /// `In-Reply-To`.
    pub in_reply_to: Option<String>,
    /// `Date` header.
    pub date: DateTime<FixedOffset>,
    /// Current flags.
    pub flags: FlagSet,
    /// True until one listing has claimed the message as recent.
    pub recent: bool,
    /// Date the message reached the server.
    pub internal_date: DateTime<FixedOffset>,
    /// Raw size in bytes.
    pub size: u32,
}

/// Full content of a stored message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailBodyData {
    /// Store-wide id.
    pub id: MailId,
    /// Raw RFC 5322 bytes.
    pub raw: Vec<u8>,
    /// Plain text body.
    pub text: Option<String>,
    /// HTML body.
    pub html: Option<String>,
    /// Attachments with their content.
    pub attachments: Vec<Attachment>,
}

/// Filters for [`super::MailboxStore::get_mail_headers`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderOptions {
    /// Only messages without `\Seen`.
    pub unread_only: bool,
    /// Only messages with `\Flagged`.
    pub saved_only: bool,
    /// Clear the recent mark of every returned message.
    pub claim_recent: bool,
    /// Only the newest `n` messages, still in ascending UID order.
    pub limit: Option<usize>,
}

/// UID bookkeeping of a mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxState {
    /// UIDVALIDITY; changes when a name is reused.
    pub uid_validity: u32,
    /// UID the next stored message receives.
    pub uid_next: u32,
}
