//! Outbound delivery.
//!
//! The server never talks SMTP to other hosts itself. Authenticated
//! submissions are handed to a [`Relay`], normally a transactional-email
//! HTTP API.

mod http;

use async_trait::async_trait;
use mailroom_mime::Attachment;
use serde::Serialize;
use tracing::info;

pub use http::HttpRelay;

use crate::Result;
use crate::account::User;

/// The message fields a relay needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MailDataToSend {
    /// `From` header value.
    pub from: String,
    /// Recipients, joined with `", "`.
    pub to: String,
    /// Decoded subject.
    pub subject: String,
    /// Plain text body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// HTML body; the text body when the message had none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// `In-Reply-To` of the original.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
}

/// What the relay reported back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Provider message id, when one was returned.
    pub id: Option<String>,
}

/// Sends mail on behalf of a local user.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Hands one message to the outside world.
    async fn send_mail(
        &self,
        user: &User,
        mail: &MailDataToSend,
        attachments: &[Attachment],
    ) -> Result<DeliveryReceipt>;
}

/// Relay that accepts everything and sends nothing.
///
/// Used when no relay endpoint is configured; the message is still saved
/// to the sender's `Sent` mailbox.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRelay;

#[async_trait]
impl Relay for NullRelay {
    async fn send_mail(
        &self,
        user: &User,
        mail: &MailDataToSend,
        attachments: &[Attachment],
    ) -> Result<DeliveryReceipt> {
        info!(
            user = %user.id,
            to = %mail.to,
            attachments = attachments.len(),
            "no relay configured, message not sent"
        );
        Ok(DeliveryReceipt::default())
    }
}
