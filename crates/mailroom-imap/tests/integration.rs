//! Integration tests for the IMAP server.
//!
//! These drive `serve_connection` over a mock stream: the client side is a
//! scripted byte sequence and everything the server writes is captured.

#![allow(clippy::unwrap_used)]

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::watch;

use mailroom_imap::connection::{SessionConfig, serve_connection};
use mailroom_imap::{
    Backend, BackendError, BackendResult, Envelope, FlagSet, Mailbox, MailboxInfo, MailboxStatus,
    MessageMeta,
};

/// Mock stream that replays client bytes and captures server output.
struct MockStream {
    input: Cursor<Vec<u8>>,
    output: Arc<Mutex<Vec<u8>>>,
}

impl MockStream {
    fn new(input: &[u8]) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let output = Arc::new(Mutex::new(Vec::new()));
        let stream = Self {
            input: Cursor::new(input.to_vec()),
            output: Arc::clone(&output),
        };
        (stream, output)
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let pos = usize::try_from(self.input.position()).unwrap();
        let data = self.input.get_ref();
        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }
        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.input.set_position((pos + to_read) as u64);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.output.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// One-mailbox backend recording appended messages.
#[derive(Default)]
struct InboxOnly {
    messages: Mutex<Vec<(MessageMeta, Vec<u8>)>>,
}

fn not_found(mailbox: &Mailbox) -> BackendError {
    BackendError::NoSuchMailbox(mailbox.to_string())
}

fn inbox_only(mailbox: &Mailbox) -> BackendResult<()> {
    if mailbox.is_inbox() {
        Ok(())
    } else {
        Err(not_found(mailbox))
    }
}

fn received() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-05-17T08:30:00+02:00").unwrap()
}

#[async_trait]
impl Backend for InboxOnly {
    async fn authenticate(&self, username: &str, password: &str) -> BackendResult<Option<String>> {
        Ok((username == "bob" && password == "hunter2").then(|| "bob".to_string()))
    }

    async fn list_mailboxes(&self, _user: &str) -> BackendResult<Vec<MailboxInfo>> {
        Ok(vec![MailboxInfo {
            name: Mailbox::inbox(),
            subscribed: true,
        }])
    }

    async fn create_mailbox(&self, _user: &str, mailbox: &Mailbox) -> BackendResult<()> {
        Err(BackendError::NotPermitted(mailbox.to_string()))
    }

    async fn delete_mailbox(&self, _user: &str, mailbox: &Mailbox) -> BackendResult<()> {
        Err(BackendError::NotPermitted(mailbox.to_string()))
    }

    async fn rename_mailbox(&self, _user: &str, from: &Mailbox, _to: &Mailbox) -> BackendResult<()> {
        Err(BackendError::NotPermitted(from.to_string()))
    }

    async fn subscribe(&self, _user: &str, mailbox: &Mailbox) -> BackendResult<()> {
        inbox_only(mailbox)
    }

    async fn unsubscribe(&self, _user: &str, mailbox: &Mailbox) -> BackendResult<()> {
        inbox_only(mailbox)
    }

    async fn mailbox_status(&self, _user: &str, mailbox: &Mailbox) -> BackendResult<MailboxStatus> {
        inbox_only(mailbox)?;
        let messages = self.messages.lock().unwrap();
        Ok(MailboxStatus {
            exists: u32::try_from(messages.len()).unwrap(),
            recent: 0,
            unseen: 0,
            uid_next: u32::try_from(messages.len()).unwrap() + 1,
            uid_validity: 1,
        })
    }

    async fn messages(&self, _user: &str, mailbox: &Mailbox) -> BackendResult<Vec<MessageMeta>> {
        inbox_only(mailbox)?;
        Ok(self.messages.lock().unwrap().iter().map(|(m, _)| m.clone()).collect())
    }

    async fn fetch_message(&self, _user: &str, mailbox: &Mailbox, uid: u32) -> BackendResult<Vec<u8>> {
        inbox_only(mailbox)?;
        self.messages
            .lock()
            .unwrap()
            .iter()
            .find(|(m, _)| m.uid == uid)
            .map(|(_, raw)| raw.clone())
            .ok_or_else(|| BackendError::Store("gone".to_string()))
    }

    async fn store_flags(
        &self,
        _user: &str,
        mailbox: &Mailbox,
        changes: &[(u32, FlagSet)],
    ) -> BackendResult<()> {
        inbox_only(mailbox)?;
        let mut messages = self.messages.lock().unwrap();
        for (uid, flags) in changes {
            for (meta, _) in messages.iter_mut().filter(|(m, _)| m.uid == *uid) {
                meta.flags = *flags;
            }
        }
        Ok(())
    }

    async fn append(
        &self,
        _user: &str,
        mailbox: &Mailbox,
        message: Vec<u8>,
        flags: FlagSet,
        date: Option<DateTime<FixedOffset>>,
    ) -> BackendResult<u32> {
        inbox_only(mailbox)?;
        let mut messages = self.messages.lock().unwrap();
        let uid = u32::try_from(messages.len()).unwrap() + 1;
        messages.push((
            MessageMeta {
                uid,
                flags,
                recent: false,
                internal_date: date.unwrap_or_else(received),
                size: u32::try_from(message.len()).unwrap(),
                envelope: Envelope::default(),
            },
            message,
        ));
        Ok(uid)
    }

    async fn expunge(&self, _user: &str, mailbox: &Mailbox, uids: &[u32]) -> BackendResult<()> {
        inbox_only(mailbox)?;
        self.messages.lock().unwrap().retain(|(m, _)| !uids.contains(&m.uid));
        Ok(())
    }

    async fn copy(&self, _user: &str, _from: &Mailbox, _uids: &[u32], to: &Mailbox) -> BackendResult<()> {
        Err(not_found(to))
    }
}

fn config() -> SessionConfig {
    SessionConfig {
        max_line: 1024,
        max_literal: 64,
        idle_timeout: Duration::from_secs(5),
    }
}

async fn transcript(backend: Arc<InboxOnly>, input: &[u8]) -> String {
    let (stream, output) = MockStream::new(input);
    let (_tx, rx) = watch::channel(false);
    serve_connection(stream, backend, &config(), rx).await.unwrap();
    let bytes = output.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

#[tokio::test]
async fn full_session() {
    let backend = Arc::new(InboxOnly::default());
    let input = b"a1 LOGIN bob hunter2\r\n\
        a2 APPEND INBOX (\\Seen \\Flagged) {5}\r\nHello\r\n\
        a3 SELECT INBOX\r\n\
        a4 FETCH 1 (FLAGS RFC822.SIZE BODY.PEEK[])\r\n\
        a5 LOGOUT\r\n";
    let out = transcript(Arc::clone(&backend), input).await;
    let lines: Vec<&str> = out.split("\r\n").collect();

    assert!(lines[0].starts_with("* OK [CAPABILITY IMAP4rev1"));
    assert_eq!(lines[1], "a1 OK Authentication successful");
    assert_eq!(lines[2], "+ Ready for literal data");
    assert_eq!(lines[3], "a2 OK APPEND completed");
    assert!(out.contains("* 1 EXISTS\r\n"));
    assert!(out.contains("a3 OK [READ-WRITE] SELECT completed\r\n"));
    assert!(out.contains("* 1 FETCH (FLAGS (\\Seen \\Flagged) RFC822.SIZE 5 BODY[] {5}\r\nHello)\r\n"));
    assert!(out.ends_with("* BYE Logging out\r\na5 OK LOGOUT completed\r\n"));

    let stored = backend.messages.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].1, b"Hello");
}

#[tokio::test]
async fn non_synchronizing_literal_skips_continuation() {
    let backend = Arc::new(InboxOnly::default());
    let input = b"a1 LOGIN bob hunter2\r\na2 APPEND INBOX {3+}\r\nabc\r\na3 LOGOUT\r\n";
    let out = transcript(backend, input).await;
    assert!(!out.contains("+ Ready"));
    assert!(out.contains("a2 OK APPEND completed\r\n"));
}

#[tokio::test]
async fn zero_length_and_binary_literals() {
    let backend = Arc::new(InboxOnly::default());
    let mut input = b"a1 LOGIN bob hunter2\r\na2 APPEND INBOX {0}\r\n\r\na3 APPEND INBOX {4}\r\n".to_vec();
    input.extend_from_slice(&[0x00, 0xff, 0x0d, 0x80]);
    input.extend_from_slice(b"\r\na4 LOGOUT\r\n");
    let out = transcript(Arc::clone(&backend), &input).await;
    assert!(out.contains("a2 OK APPEND completed\r\n"), "{out}");
    assert!(out.contains("a3 OK APPEND completed\r\n"), "{out}");

    let stored = backend.messages.lock().unwrap();
    assert!(stored[0].1.is_empty());
    assert_eq!(stored[1].1, vec![0x00, 0xff, 0x0d, 0x80]);
}

#[tokio::test]
async fn oversized_literal_is_refused_and_session_continues() {
    let backend = Arc::new(InboxOnly::default());
    let input = b"a1 LOGIN bob hunter2\r\na2 APPEND INBOX {1000}\r\na3 NOOP\r\na4 LOGOUT\r\n";
    let out = transcript(Arc::clone(&backend), input).await;
    assert!(out.contains("a2 NO [TOOBIG]"), "{out}");
    assert!(!out.contains("+ Ready"));
    assert!(out.contains("a3 OK NOOP completed\r\n"));
    assert!(backend.messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn disconnect_mid_literal_commits_nothing() {
    let backend = Arc::new(InboxOnly::default());
    let input = b"a1 LOGIN bob hunter2\r\na2 APPEND INBOX {20}\r\nonly part";
    let out = transcript(Arc::clone(&backend), input).await;
    assert!(out.ends_with("+ Ready for literal data\r\n"), "{out}");
    assert!(backend.messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn overlong_line_closes_with_bye() {
    let backend = Arc::new(InboxOnly::default());
    let mut input = b"a1 NOOP ".to_vec();
    input.extend(std::iter::repeat_n(b'x', 2048));
    input.extend_from_slice(b"\r\n");
    let out = transcript(backend, &input).await;
    assert!(out.ends_with("* BYE line too long\r\n"), "{out}");
}

#[tokio::test]
async fn wrong_state_and_bad_syntax_keep_connection_open() {
    let backend = Arc::new(InboxOnly::default());
    let input = b"a1 FETCH 1 FLAGS\r\na2 LOGIN bob\r\na3 STATUS INBOX (BOGUS)\r\na4 NOOP\r\n";
    let out = transcript(backend, input).await;
    assert!(out.contains("a1 NO Not authenticated\r\n"));
    assert!(out.contains("a2 BAD "));
    assert!(out.contains("a3 BAD ") || out.contains("a3 NO "));
    assert!(out.contains("a4 OK NOOP completed\r\n"));
}

#[tokio::test]
async fn shutdown_sends_bye() {
    let backend = Arc::new(InboxOnly::default());
    let (client, server) = tokio::io::duplex(1024);
    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(async move { serve_connection(server, backend, &config(), rx).await });

    let mut reader = tokio::io::BufReader::new(client);
    let mut greeting = String::new();
    tokio::io::AsyncBufReadExt::read_line(&mut reader, &mut greeting)
        .await
        .unwrap();
    assert!(greeting.starts_with("* OK"));

    tx.send(true).unwrap();
    let mut bye = String::new();
    tokio::io::AsyncBufReadExt::read_line(&mut reader, &mut bye)
        .await
        .unwrap();
    assert_eq!(bye, "* BYE Server shutting down\r\n");
    task.await.unwrap().unwrap();
}
