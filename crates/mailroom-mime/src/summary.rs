//! Flattened view of a message for storage and relay.

use chrono::{DateTime, FixedOffset, Utc};

use crate::address::{MailAddress, parse_address_list};
use crate::message::{Message, Part};

/// A file carried by the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Filename, if the sender gave one.
    pub filename: Option<String>,
    /// `type/subtype`.
    pub content_type: String,
    /// Decoded content.
    pub content: Vec<u8>,
    /// Decoded size in bytes.
    pub size: usize,
}

/// The fields a mailbox stores for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMail {
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
    /// `Message-ID`, angle brackets included.
    pub message_id: Option<String>,
    /// `In-Reply-To`.
    pub in_reply_to: Option<String>,
    /// `Date`, or the parse time when missing or unreadable.
    pub date: DateTime<FixedOffset>,
    /// First `text/plain` body.
    pub text: Option<String>,
    /// First `text/html` body.
    pub html: Option<String>,
    /// Everything else.
    pub attachments: Vec<Attachment>,
}

impl ParsedMail {
    /// Returns the HTML body, or the text body when there is none.
    #[must_use]
    pub fn html_or_text(&self) -> Option<&str> {
        self.html.as_deref().or(self.text.as_deref())
    }
}

impl Message {
    /// Flattens the message into a [`ParsedMail`].
    ///
    /// The first inline `text/plain` and `text/html` leaves become the
    /// bodies; every other leaf is an attachment. Leaves whose content
    /// cannot be decoded keep their raw bytes.
    #[must_use]
    pub fn summary(&self) -> ParsedMail {
        let headers = self.headers();
        let addresses = |name: &str| {
            headers
                .get(name)
                .map(parse_address_list)
                .unwrap_or_default()
        };

        let mut text = None;
        let mut html = None;
        let mut attachments = Vec::new();

        for leaf in self.root.leaves() {
            let content_type = leaf.content_type();
            let attachment = is_attachment(leaf);

            if !attachment && content_type.is("text", "plain") && text.is_none() {
                text = Some(leaf.body_text().unwrap_or_else(|_| lossy(&leaf.body)));
            } else if !attachment && content_type.is("text", "html") && html.is_none() {
                html = Some(leaf.body_text().unwrap_or_else(|_| lossy(&leaf.body)));
            } else if attachment || !leaf.body.is_empty() {
                let content = leaf.decode_body().unwrap_or_else(|_| leaf.body.clone());
                attachments.push(Attachment {
                    filename: leaf.filename(),
                    content_type: content_type.essence(),
                    size: content.len(),
                    content,
                });
            }
        }

        ParsedMail {
            subject: self.subject(),
            from: addresses("from"),
            to: addresses("to"),
            cc: addresses("cc"),
            reply_to: addresses("reply-to"),
            message_id: self.message_id().map(str::to_string),
            in_reply_to: headers.get("in-reply-to").map(str::to_string),
            date: self
                .date()
                .and_then(parse_date)
                .unwrap_or_else(|| Utc::now().fixed_offset()),
            text,
            html,
            attachments,
        }
    }
}

fn is_attachment(part: &Part) -> bool {
    part.disposition().is_some_and(|d| d.is_attachment()) || part.filename().is_some()
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Parses an RFC 2822 date, ignoring a trailing comment such as `(UTC)`.
#[must_use]
pub fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.split('(').next().unwrap_or(value).trim();
    DateTime::parse_from_rfc2822(value).ok()
}
