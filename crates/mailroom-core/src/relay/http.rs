//! JSON-over-HTTP relay.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mailroom_mime::Attachment;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{DeliveryReceipt, MailDataToSend, Relay};
use crate::account::User;
use crate::{Error, Result};

/// Relay posting each message to a transactional-email API.
///
/// The request is a JSON object with the [`MailDataToSend`] fields and an
/// `attachments` array whose `content` is base64. The API key, if any, is
/// sent as a bearer token.
#[derive(Debug, Clone)]
pub struct HttpRelay {
    url: String,
    api_key: Option<String>,
    http_client: Client,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    #[serde(flatten)]
    mail: &'a MailDataToSend,
    attachments: Vec<AttachmentBody<'a>>,
}

#[derive(Debug, Serialize)]
struct AttachmentBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<&'a str>,
    content_type: &'a str,
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

impl HttpRelay {
    /// Creates a relay for the endpoint `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            http_client: Client::new(),
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Returns the endpoint.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

fn request_body<'a>(mail: &'a MailDataToSend, attachments: &'a [Attachment]) -> SendRequest<'a> {
    SendRequest {
        mail,
        attachments: attachments
            .iter()
            .map(|a| AttachmentBody {
                filename: a.filename.as_deref(),
                content_type: &a.content_type,
                content: STANDARD.encode(&a.content),
            })
            .collect(),
    }
}

#[async_trait]
impl Relay for HttpRelay {
    async fn send_mail(
        &self,
        user: &User,
        mail: &MailDataToSend,
        attachments: &[Attachment],
    ) -> Result<DeliveryReceipt> {
        let mut request = self
            .http_client
            .post(&self.url)
            .json(&request_body(mail, attachments));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(user = %user.id, %status, "relay refused message");
            return Err(Error::Relay(format!("{status}: {}", detail.trim())));
        }

        // Providers differ in what they return; an unreadable body is not a failure.
        let body: SendResponse = response.json().await.unwrap_or_default();
        debug!(user = %user.id, id = ?body.id, "message relayed");
        Ok(DeliveryReceipt { id: body.id })
    }
}
