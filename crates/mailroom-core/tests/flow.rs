//! Mail accepted over SMTP and read back over IMAP through one backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mailroom_core::{Mailroom, MemoryStore, NewUser, NullRelay};
use mailroom_imap::Response;
use mailroom_smtp::SessionConfig;

async fn backend() -> Arc<Mailroom> {
    let store = Arc::new(MemoryStore::new());
    for name in ["alice", "bob"] {
        store
            .add_user(&NewUser::new(name, "secret"), "example.com")
            .await
            .unwrap();
    }
    Arc::new(Mailroom::with_memory_store(
        store,
        Arc::new(NullRelay),
        "example.com",
    ))
}

struct Smtp(mailroom_smtp::Session<Mailroom>);

impl Smtp {
    fn new(backend: &Arc<Mailroom>, tls: bool) -> Self {
        let config = SessionConfig::new("mx.example.com", "example.com");
        Self(mailroom_smtp::Session::new(
            Arc::clone(backend),
            Arc::new(config),
            tls,
        ))
    }

    async fn send(&mut self, line: &str) -> String {
        let mut out = Vec::new();
        self.0.handle_line(line.as_bytes(), &mut out).await;
        out.iter()
            .map(|r| String::from_utf8(r.to_bytes()).unwrap())
            .collect()
    }
}

struct Imap(mailroom_imap::Session<Mailroom>);

impl Imap {
    async fn login(backend: &Arc<Mailroom>, user: &str) -> Self {
        let mut imap = Self(mailroom_imap::Session::new(Arc::clone(backend)));
        let reply = imap.send(&format!("a0 LOGIN {user} secret")).await;
        assert_eq!(reply, "a0 OK Authentication successful\r\n");
        imap
    }

    async fn send(&mut self, line: &str) -> String {
        let mut out = Vec::new();
        self.0.handle_line(line.as_bytes(), &mut out).await;
        let bytes: Vec<u8> = out.iter().flat_map(Response::to_bytes).collect();
        String::from_utf8(bytes).unwrap()
    }
}

#[tokio::test]
async fn incoming_mail_reaches_every_local_inbox() {
    let backend = backend().await;
    let mut smtp = Smtp::new(&backend, false);
    smtp.send("EHLO relay.remote.org").await;
    assert!(smtp.send("MAIL FROM:<carol@remote.org>").await.starts_with("250"));
    assert!(smtp.send("RCPT TO:<alice@example.com>").await.starts_with("250"));
    assert!(smtp.send("RCPT TO:<bob@example.com>").await.starts_with("250"));
    assert!(smtp.send("DATA").await.starts_with("354"));
    for line in ["From: carol@remote.org", "Subject: Status", "", "All good"] {
        smtp.send(line).await;
    }
    assert!(smtp.send(".").await.starts_with("250"));

    for user in ["alice", "bob"] {
        let mut imap = Imap::login(&backend, user).await;
        let reply = imap.send("a1 SELECT INBOX").await;
        assert!(reply.contains("* 1 EXISTS\r\n"), "{reply}");
        assert!(reply.contains("* 1 RECENT\r\n"), "{reply}");

        let reply = imap.send("a2 FETCH 1 (ENVELOPE BODY[TEXT])").await;
        assert!(reply.contains("\"Status\""), "{reply}");
        assert!(reply.contains("All good"), "{reply}");

        let reply = imap.send("a3 FETCH 1 FLAGS").await;
        assert!(reply.contains("\\Seen"), "{reply}");
    }
}

#[tokio::test]
async fn authenticated_submission_lands_in_sent() {
    let backend = backend().await;
    let mut smtp = Smtp::new(&backend, true);
    smtp.send("EHLO laptop").await;
    let token = STANDARD.encode(b"\0alice\0secret");
    assert!(smtp.send(&format!("AUTH PLAIN {token}")).await.starts_with("235"));
    assert!(smtp.send("MAIL FROM:<alice@example.com>").await.starts_with("250"));
    assert!(smtp.send("RCPT TO:<dave@elsewhere.net>").await.starts_with("250"));
    assert!(smtp.send("DATA").await.starts_with("354"));
    for line in ["Subject: Hello Dave", "", "See you soon"] {
        smtp.send(line).await;
    }
    assert!(smtp.send(".").await.starts_with("250"));

    let mut imap = Imap::login(&backend, "alice").await;
    let reply = imap.send("a1 STATUS Sent (MESSAGES UNSEEN)").await;
    assert!(reply.contains("MESSAGES 1"), "{reply}");
    assert!(reply.contains("UNSEEN 0"), "{reply}");
    let reply = imap.send("a2 STATUS INBOX (MESSAGES)").await;
    assert!(reply.contains("MESSAGES 0"), "{reply}");
}

#[tokio::test]
async fn local_sender_without_auth_only_reaches_local_users() {
    let backend = backend().await;
    let mut smtp = Smtp::new(&backend, false);
    smtp.send("EHLO relay.provider.net").await;
    assert!(smtp.send("MAIL FROM:<alice@example.com>").await.starts_with("250"));
    assert!(smtp.send("RCPT TO:<dave@elsewhere.net>").await.starts_with("530"));
    assert!(smtp.send("RCPT TO:<bob@example.com>").await.starts_with("250"));
    smtp.send("DATA").await;
    for line in ["Subject: Forwarded", "", "via the provider"] {
        smtp.send(line).await;
    }
    assert!(smtp.send(".").await.starts_with("250"));

    let mut imap = Imap::login(&backend, "bob").await;
    let reply = imap.send("a1 STATUS INBOX (MESSAGES)").await;
    assert!(reply.contains("MESSAGES 1"), "{reply}");
    let mut imap = Imap::login(&backend, "alice").await;
    let reply = imap.send("a1 STATUS Sent (MESSAGES)").await;
    assert!(reply.contains("MESSAGES 0"), "{reply}");
}

#[tokio::test]
async fn submission_to_local_user_is_delivered_and_kept_in_sent() {
    let backend = backend().await;
    let mut smtp = Smtp::new(&backend, true);
    smtp.send("EHLO laptop").await;
    let token = STANDARD.encode(b"\0alice\0secret");
    assert!(smtp.send(&format!("AUTH PLAIN {token}")).await.starts_with("235"));
    assert!(smtp.send("MAIL FROM:<bob@example.com>").await.starts_with("553"));
    assert!(smtp.send("MAIL FROM:<alice@example.com>").await.starts_with("250"));
    assert!(smtp.send("RCPT TO:<bob@example.com>").await.starts_with("250"));
    smtp.send("DATA").await;
    for line in ["Subject: Lunch", "", "Noon?"] {
        smtp.send(line).await;
    }
    assert!(smtp.send(".").await.starts_with("250"));

    let mut imap = Imap::login(&backend, "bob").await;
    let reply = imap.send("a1 STATUS INBOX (MESSAGES)").await;
    assert!(reply.contains("MESSAGES 1"), "{reply}");
    let mut imap = Imap::login(&backend, "alice").await;
    let reply = imap.send("a1 STATUS Sent (MESSAGES)").await;
    assert!(reply.contains("MESSAGES 1"), "{reply}");
}

#[tokio::test]
async fn imap_append_then_search() {
    let backend = backend().await;
    let mut imap = Imap::login(&backend, "alice").await;
    let reply = imap
        .send("a1 APPEND Drafts (\\Draft) {23}\r\nSubject: plan\r\n\r\nsecret")
        .await;
    assert_eq!(reply, "a1 OK APPEND completed\r\n");

    imap.send("a2 SELECT Drafts").await;
    let reply = imap.send("a3 SEARCH DRAFT SUBJECT plan").await;
    assert!(reply.contains("* SEARCH 1"), "{reply}");
}
