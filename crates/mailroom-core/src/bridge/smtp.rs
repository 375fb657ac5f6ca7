//! SMTP side of the bridge.

use async_trait::async_trait;
use mailroom_imap::{FlagSet, Mailbox};
use mailroom_smtp::{Address, Backend, BackendResult, Envelope};
use tracing::{error, info, warn};

use super::{FALLBACK_SENDER, Mailroom, SENT_MAILBOX};
use crate::account::{User, UserQuery};
use crate::relay::MailDataToSend;
use crate::store::Mail;
use crate::{Error, Result};

impl Mailroom {
    /// Finds the owner of a local address by login name, then by address.
    async fn local_user(&self, address: &Address) -> Result<Option<User>> {
        if let Some(user) = self
            .users
            .get_user(UserQuery::Username(address.local_part()))
            .await?
        {
            return Ok(Some(user));
        }
        self.users.get_user(UserQuery::Email(address.as_str())).await
    }
}

/// Parses an incoming message for storage in INBOX.
///
/// A message without an HTML part keeps its text body as the HTML body.
fn incoming_mail(message: &[u8]) -> Mail {
    let mut mail = Mail::new(Mailbox::inbox(), message.to_vec());
    if mail.parsed.html.is_none() {
        mail.parsed.html.clone_from(&mail.parsed.text);
    }
    mail
}

#[async_trait]
impl Backend for Mailroom {
    async fn authenticate(&self, username: &str, password: &str) -> BackendResult<Option<String>> {
        Ok(self.login(username, password).await?.map(|user| user.id))
    }

    async fn user_exists(&self, address: &Address) -> BackendResult<bool> {
        Ok(self.local_user(address).await?.is_some())
    }

    async fn owns_address(&self, user: &str, address: &Address) -> BackendResult<bool> {
        Ok(self
            .local_user(address)
            .await?
            .is_some_and(|owner| owner.id == user))
    }

    async fn deliver(&self, envelope: &Envelope, message: &[u8]) -> BackendResult<()> {
        let mail = incoming_mail(message);
        for recipient in &envelope.recipients {
            let Some(user) = self.local_user(recipient).await? else {
                warn!(recipient = %recipient.as_str(), "recipient vanished before delivery");
                continue;
            };
            let uid = self.mail.save_mail(&user.id, mail.clone()).await?;
            info!(
                user = %user.id,
                uid,
                size = message.len(),
                from = envelope.from.as_ref().map_or("<>", Address::as_str),
                "incoming message delivered"
            );
        }
        Ok(())
    }

    async fn relay(&self, envelope: &Envelope, message: &[u8]) -> BackendResult<()> {
        let user = match &envelope.from {
            Some(from) => self
                .local_user(from)
                .await?
                .ok_or_else(|| Error::UserNotFound(from.local_part().to_string()))?,
            None => self
                .users
                .get_user(UserQuery::Username(FALLBACK_SENDER))
                .await?
                .ok_or_else(|| Error::UserNotFound(FALLBACK_SENDER.to_string()))?,
        };
        if let (Some(from), Some(login)) = (&envelope.from, &envelope.user) {
            if user.id != *login {
                warn!(user = %login, from = %from.as_str(), "sender belongs to another user");
                return Err(Error::NotPermitted(format!("{login} may not send as {from}")).into());
            }
        }

        let mail = Mail::new(Mailbox::new(SENT_MAILBOX), message.to_vec()).with_flags(FlagSet {
            read: true,
            ..FlagSet::default()
        });
        let parsed = &mail.parsed;
        let data = MailDataToSend {
            from: user.mailbox_address(),
            to: envelope.joined_recipients(),
            subject: parsed.subject.clone().unwrap_or_default(),
            text: parsed.text.clone(),
            html: parsed.html_or_text().map(str::to_string),
            in_reply_to: parsed.in_reply_to.clone(),
        };

        if envelope.recipients.is_empty() {
            info!(user = %user.id, "outgoing message has only local recipients");
        } else {
            let receipt = match self.relay.send_mail(&user, &data, &parsed.attachments).await {
                Ok(receipt) => receipt,
                Err(err) => {
                    error!(user = %user.id, to = %data.to, error = %err, "relay failed");
                    return Err(err.into());
                }
            };
            info!(user = %user.id, to = %data.to, id = ?receipt.id, "outgoing message relayed");
        }

        // The message is already out; a failed copy must not make the client retry.
        if let Err(err) = self.mail.save_mail(&user.id, mail).await {
            warn!(user = %user.id, error = %err, "could not save copy to Sent");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use mailroom_mime::Attachment;
    use mailroom_smtp::{BackendError, Direction};

    use super::*;
    use crate::account::NewUser;
    use crate::relay::{DeliveryReceipt, Relay};
    use crate::store::{HeaderOptions, MailboxStore, MemoryStore};

    #[derive(Default)]
    struct RecordingRelay {
        sent: Mutex<Vec<(String, MailDataToSend, usize)>>,
        down: bool,
    }

    #[async_trait]
    impl Relay for RecordingRelay {
        async fn send_mail(
            &self,
            user: &User,
            mail: &MailDataToSend,
            attachments: &[Attachment],
        ) -> Result<DeliveryReceipt> {
            if self.down {
                return Err(Error::Relay("503 Service Unavailable".into()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((user.id.clone(), mail.clone(), attachments.len()));
            Ok(DeliveryReceipt {
                id: Some("msg-1".into()),
            })
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        relay: Arc<RecordingRelay>,
        backend: Mailroom,
    }

    async fn fixture(relay: RecordingRelay) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        for name in ["alice", "bob", "admin"] {
            store
                .add_user(&NewUser::new(name, "secret"), "example.com")
                .await
                .unwrap();
        }
        let relay = Arc::new(relay);
        let backend = Mailroom::with_memory_store(store.clone(), relay.clone(), "example.com");
        Fixture {
            store,
            relay,
            backend,
        }
    }

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    fn envelope(direction: Direction, from: Option<&str>, to: &[&str]) -> Envelope {
        Envelope {
            direction,
            from: from.map(addr),
            recipients: to.iter().map(|s| addr(s)).collect(),
            user: None,
        }
    }

    async fn stored(store: &MemoryStore, user: &str, mailbox: &str) -> Vec<crate::store::MailBodyData> {
        let headers = store
            .get_mail_headers(user, &Mailbox::new(mailbox), HeaderOptions::default())
            .await
            .unwrap();
        let mut bodies = Vec::new();
        for header in headers {
            bodies.push(store.get_mail_body(user, header.id).await.unwrap());
        }
        bodies
    }

    const PLAIN: &[u8] = b"From: carol@remote.org\r\nSubject: Lunch\r\n\r\nNoon?\r\n";

    #[tokio::test]
    async fn test_user_exists() {
        let f = fixture(RecordingRelay::default()).await;
        assert!(f.backend.user_exists(&addr("alice@example.com")).await.unwrap());
        assert!(f.backend.user_exists(&addr("ALICE@example.com")).await.unwrap());
        assert!(!f.backend.user_exists(&addr("zed@example.com")).await.unwrap());
    }

    #[tokio::test]
    async fn test_incoming_text_only_mail_uses_text_as_html() {
        let f = fixture(RecordingRelay::default()).await;
        let env = envelope(
            Direction::Incoming,
            Some("carol@remote.org"),
            &["alice@example.com", "bob@example.com"],
        );
        f.backend.deliver(&env, PLAIN).await.unwrap();

        for user in ["alice", "bob"] {
            let inbox = stored(&f.store, user, "INBOX").await;
            assert_eq!(inbox.len(), 1);
            assert_eq!(inbox[0].raw, PLAIN);
            assert_eq!(inbox[0].text.as_deref(), Some("Noon?\r\n"));
            assert_eq!(inbox[0].html.as_deref(), Some("Noon?\r\n"));
        }
        assert!(f.relay.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_incoming_html_is_kept() {
        let f = fixture(RecordingRelay::default()).await;
        let raw = b"Subject: x\r\nContent-Type: text/html\r\n\r\n<p>hi</p>";
        let env = envelope(Direction::Incoming, None, &["alice@example.com"]);
        f.backend.deliver(&env, raw).await.unwrap();
        let inbox = stored(&f.store, "alice", "INBOX").await;
        assert_eq!(inbox[0].html.as_deref(), Some("<p>hi</p>"));
        assert_eq!(inbox[0].text, None);
    }

    #[tokio::test]
    async fn test_outgoing_is_relayed_and_saved_to_sent() {
        let f = fixture(RecordingRelay::default()).await;
        let mut env = envelope(
            Direction::Outgoing,
            Some("alice@example.com"),
            &["dave@elsewhere.net", "erin@remote.org"],
        );
        env.user = Some("alice".into());
        f.backend.relay(&env, PLAIN).await.unwrap();

        let sent = f.relay.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        let (user, data, attachments) = &sent[0];
        assert_eq!(user, "alice");
        assert_eq!(data.from, "alice <alice@example.com>");
        assert_eq!(data.to, "dave@elsewhere.net, erin@remote.org");
        assert_eq!(data.subject, "Lunch");
        assert_eq!(data.html.as_deref(), Some("Noon?\r\n"));
        assert_eq!(*attachments, 0);

        let copies = stored(&f.store, "alice", "Sent").await;
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].raw, PLAIN);
    }

    #[tokio::test]
    async fn test_null_sender_falls_back_to_admin() {
        let f = fixture(RecordingRelay::default()).await;
        let env = envelope(Direction::Outgoing, None, &["dave@elsewhere.net"]);
        f.backend.relay(&env, PLAIN).await.unwrap();
        assert_eq!(f.relay.sent.lock().unwrap()[0].0, "admin");
        assert_eq!(stored(&f.store, "admin", "Sent").await.len(), 1);
    }

    #[tokio::test]
    async fn test_relay_failure_is_temporary_and_not_saved() {
        let f = fixture(RecordingRelay {
            down: true,
            ..RecordingRelay::default()
        })
        .await;
        let env = envelope(Direction::Outgoing, Some("bob@example.com"), &["x@remote.org"]);
        let err = f.backend.relay(&env, PLAIN).await.unwrap_err();
        assert!(matches!(err, BackendError::Temporary(_)));
        assert!(stored(&f.store, "bob", "Sent").await.is_empty());
    }

    #[tokio::test]
    async fn test_owns_address() {
        let f = fixture(RecordingRelay::default()).await;
        assert!(f.backend.owns_address("alice", &addr("Alice@example.com")).await.unwrap());
        assert!(!f.backend.owns_address("alice", &addr("bob@example.com")).await.unwrap());
        assert!(!f.backend.owns_address("alice", &addr("ghost@example.com")).await.unwrap());
    }

    #[tokio::test]
    async fn test_relay_refuses_sender_of_another_user() {
        let f = fixture(RecordingRelay::default()).await;
        let mut env = envelope(Direction::Outgoing, Some("bob@example.com"), &["x@remote.org"]);
        env.user = Some("alice".into());
        let err = f.backend.relay(&env, PLAIN).await.unwrap_err();
        assert!(err.is_permanent());
        assert!(f.relay.sent.lock().unwrap().is_empty());
        assert!(stored(&f.store, "bob", "Sent").await.is_empty());
    }

    #[tokio::test]
    async fn test_local_only_outgoing_is_saved_without_relaying() {
        let f = fixture(RecordingRelay::default()).await;
        let mut env = envelope(Direction::Outgoing, Some("alice@example.com"), &[]);
        env.user = Some("alice".into());
        f.backend.relay(&env, PLAIN).await.unwrap();
        assert!(f.relay.sent.lock().unwrap().is_empty());
        assert_eq!(stored(&f.store, "alice", "Sent").await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_sender_is_permanent() {
        let f = fixture(RecordingRelay::default()).await;
        let env = envelope(Direction::Outgoing, Some("ghost@example.com"), &["x@remote.org"]);
        let err = f.backend.relay(&env, PLAIN).await.unwrap_err();
        assert!(err.is_permanent());
    }
}
