//! IMAP side of the bridge.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use mailroom_imap::{
    Address, Backend, BackendError, BackendResult, Envelope, FlagSet, Mailbox, MailboxInfo,
    MailboxStatus, MessageMeta,
};
use mailroom_mime::MailAddress;
use tracing::{debug, error};

use super::Mailroom;
use crate::store::{HeaderOptions, Mail, MailHeaderData, MailId};

impl Mailroom {
    async fn headers(&self, user: &str, mailbox: &Mailbox) -> BackendResult<Vec<MailHeaderData>> {
        Ok(self
            .mail
            .get_mail_headers(user, mailbox, HeaderOptions::default())
            .await?)
    }

    /// Resolves UIDs to store ids, skipping UIDs that no longer exist.
    async fn ids(&self, user: &str, mailbox: &Mailbox, uids: &[u32]) -> BackendResult<Vec<MailId>> {
        let headers = self.headers(user, mailbox).await?;
        Ok(uids
            .iter()
            .filter_map(|uid| headers.iter().find(|h| h.uid == *uid).map(|h| h.id))
            .collect())
    }
}

fn addresses(list: &[MailAddress]) -> Vec<Address> {
    list.iter()
        .map(|a| Address::from_email(a.name.clone(), &a.address))
        .collect()
}

/// Builds the FETCH ENVELOPE view of a stored message.
fn envelope(header: &MailHeaderData) -> Envelope {
    Envelope {
        date: Some(header.date.to_rfc2822()),
        subject: header.subject.clone(),
        from: addresses(&header.from),
        sender: Vec::new(),
        reply_to: addresses(&header.reply_to),
        to: addresses(&header.to),
        cc: addresses(&header.cc),
        bcc: Vec::new(),
        in_reply_to: header.in_reply_to.clone(),
        message_id: header.message_id.clone(),
    }
}

#[async_trait]
impl Backend for Mailroom {
    async fn authenticate(&self, username: &str, password: &str) -> BackendResult<Option<String>> {
        Ok(self.login(username, password).await?.map(|user| user.id))
    }

    async fn list_mailboxes(&self, user: &str) -> BackendResult<Vec<MailboxInfo>> {
        Ok(self.mail.list_mailboxes(user).await?)
    }

    async fn create_mailbox(&self, user: &str, mailbox: &Mailbox) -> BackendResult<()> {
        Ok(self.mail.create_mailbox(user, mailbox).await?)
    }

    async fn delete_mailbox(&self, user: &str, mailbox: &Mailbox) -> BackendResult<()> {
        Ok(self.mail.delete_mailbox(user, mailbox).await?)
    }

    async fn rename_mailbox(&self, user: &str, from: &Mailbox, to: &Mailbox) -> BackendResult<()> {
        Ok(self.mail.rename_mailbox(user, from, to).await?)
    }

    async fn subscribe(&self, user: &str, mailbox: &Mailbox) -> BackendResult<()> {
        Ok(self.mail.subscribe(user, mailbox).await?)
    }

    async fn unsubscribe(&self, user: &str, mailbox: &Mailbox) -> BackendResult<()> {
        Ok(self.mail.unsubscribe(user, mailbox).await?)
    }

    async fn mailbox_status(&self, user: &str, mailbox: &Mailbox) -> BackendResult<MailboxStatus> {
        let state = self.mail.mailbox_info(user, mailbox).await?;
        let headers = self.headers(user, mailbox).await?;
        let count = |pred: fn(&MailHeaderData) -> bool| {
            u32::try_from(headers.iter().filter(|h| pred(h)).count()).unwrap_or(u32::MAX)
        };
        Ok(MailboxStatus {
            exists: count(|_| true),
            recent: count(|h| h.recent),
            unseen: count(|h| !h.flags.read),
            uid_next: state.uid_next,
            uid_validity: state.uid_validity,
        })
    }

    async fn messages(&self, user: &str, mailbox: &Mailbox) -> BackendResult<Vec<MessageMeta>> {
        let options = HeaderOptions {
            claim_recent: true,
            ..HeaderOptions::default()
        };
        let headers = self.mail.get_mail_headers(user, mailbox, options).await?;
        Ok(headers
            .iter()
            .map(|h| MessageMeta {
                uid: h.uid,
                flags: h.flags,
                recent: h.recent,
                internal_date: h.internal_date,
                size: h.size,
                envelope: envelope(h),
            })
            .collect())
    }

    async fn fetch_message(&self, user: &str, mailbox: &Mailbox, uid: u32) -> BackendResult<Vec<u8>> {
        let Some(id) = self.ids(user, mailbox, &[uid]).await?.pop() else {
            return Err(BackendError::Store(format!("no message with UID {uid} in {mailbox}")));
        };
        Ok(self.mail.get_mail_body(user, id).await?.raw)
    }

    async fn store_flags(
        &self,
        user: &str,
        mailbox: &Mailbox,
        changes: &[(u32, FlagSet)],
    ) -> BackendResult<()> {
        let headers = self.headers(user, mailbox).await?;
        let resolved: Vec<(MailId, FlagSet)> = changes
            .iter()
            .filter_map(|(uid, flags)| {
                headers
                    .iter()
                    .find(|h| h.uid == *uid)
                    .map(|h| (h.id, *flags))
            })
            .collect();
        Ok(self.mail.set_flags(&resolved).await?)
    }

    async fn append(
        &self,
        user: &str,
        mailbox: &Mailbox,
        message: Vec<u8>,
        flags: FlagSet,
        date: Option<DateTime<FixedOffset>>,
    ) -> BackendResult<u32> {
        let mut mail = Mail::new(mailbox.clone(), message).with_flags(flags);
        if let Some(date) = date {
            mail = mail.with_internal_date(date);
        }
        let uid = self.mail.save_mail(user, mail).await?;
        debug!(user, %mailbox, uid, "message appended");
        Ok(uid)
    }

    async fn expunge(&self, user: &str, mailbox: &Mailbox, uids: &[u32]) -> BackendResult<()> {
        for id in self.ids(user, mailbox, uids).await? {
            if let Err(err) = self.mail.delete_mail(id).await {
                error!(user, %mailbox, %id, error = %err, "expunge failed");
                return Err(err.into());
            }
        }
        Ok(())
    }

    async fn copy(
        &self,
        user: &str,
        from: &Mailbox,
        uids: &[u32],
        to: &Mailbox,
    ) -> BackendResult<()> {
        let ids = self.ids(user, from, uids).await?;
        Ok(self.mail.copy_mail(user, &ids, to).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::account::NewUser;
    use crate::relay::NullRelay;
    use crate::store::MemoryStore;

    const RAW: &[u8] = b"From: \"Ann Lee\" <ann@example.org>\r\n\
To: alice@example.com, Bob <bob@example.com>\r\n\
Subject: =?UTF-8?Q?Caf=C3=A9?=\r\n\
Message-ID: <1@example.org>\r\n\
Date: Tue, 2 Jan 2024 10:00:00 +0000\r\n\
\r\n\
Hello\r\n";

    async fn backend() -> Mailroom {
        let store = Arc::new(MemoryStore::new());
        store
            .add_user(&NewUser::new("alice", "secret"), "example.com")
            .await
            .unwrap();
        Mailroom::with_memory_store(store, Arc::new(NullRelay), "example.com")
    }

    async fn append(backend: &Mailroom, flags: FlagSet) -> u32 {
        backend
            .append("alice", &Mailbox::inbox(), RAW.to_vec(), flags, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_authenticate() {
        let b = backend().await;
        assert_eq!(b.authenticate("alice", "secret").await.unwrap().as_deref(), Some("alice"));
        assert_eq!(
            b.authenticate("alice@example.com", "secret").await.unwrap().as_deref(),
            Some("alice")
        );
        assert_eq!(b.authenticate("alice", "wrong").await.unwrap(), None);
        assert_eq!(b.authenticate("mallory", "secret").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_append_then_read_back() {
        let b = backend().await;
        let uid = append(&b, FlagSet::default()).await;
        assert_eq!(uid, 1);

        let messages = b.messages("alice", &Mailbox::inbox()).await.unwrap();
        assert_eq!(messages.len(), 1);
        let meta = &messages[0];
        assert!(meta.recent);
        assert_eq!(meta.size, u32::try_from(RAW.len()).unwrap());
        assert_eq!(meta.envelope.subject.as_deref(), Some("Café"));
        assert_eq!(meta.envelope.from[0].name.as_deref(), Some("Ann Lee"));
        assert_eq!(meta.envelope.to.len(), 2);
        assert_eq!(meta.envelope.message_id.as_deref(), Some("<1@example.org>"));

        assert_eq!(b.fetch_message("alice", &Mailbox::inbox(), 1).await.unwrap(), RAW);
        assert!(matches!(
            b.fetch_message("alice", &Mailbox::inbox(), 9).await,
            Err(BackendError::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_status_counts() {
        let b = backend().await;
        append(&b, FlagSet::default()).await;
        append(
            &b,
            FlagSet {
                read: true,
                ..FlagSet::default()
            },
        )
        .await;

        let status = b.mailbox_status("alice", &Mailbox::inbox()).await.unwrap();
        assert_eq!(status.exists, 2);
        assert_eq!(status.recent, 2);
        assert_eq!(status.unseen, 1);
        assert_eq!(status.uid_next, 3);

        b.messages("alice", &Mailbox::inbox()).await.unwrap();
        let status = b.mailbox_status("alice", &Mailbox::inbox()).await.unwrap();
        assert_eq!(status.recent, 0);
    }

    #[tokio::test]
    async fn test_store_expunge_copy() {
        let b = backend().await;
        for _ in 0..3 {
            append(&b, FlagSet::default()).await;
        }
        let deleted = FlagSet {
            deleted: true,
            ..FlagSet::default()
        };
        b.store_flags("alice", &Mailbox::inbox(), &[(2, deleted), (42, deleted)])
            .await
            .unwrap();
        b.copy("alice", &Mailbox::inbox(), &[1, 2], &Mailbox::new("Trash"))
            .await
            .unwrap();
        b.expunge("alice", &Mailbox::inbox(), &[2]).await.unwrap();

        let inbox = b.messages("alice", &Mailbox::inbox()).await.unwrap();
        assert_eq!(inbox.iter().map(|m| m.uid).collect::<Vec<_>>(), vec![1, 3]);
        let trash = b.messages("alice", &Mailbox::new("Trash")).await.unwrap();
        assert_eq!(trash.len(), 2);
        assert!(trash[1].flags.deleted);
    }

    #[tokio::test]
    async fn test_store_errors_map_to_imap_errors() {
        let b = backend().await;
        let missing = Mailbox::new("Nope");
        assert_eq!(
            b.copy("alice", &Mailbox::inbox(), &[], &missing).await,
            Err(BackendError::NoSuchMailbox("Nope".into()))
        );
        assert!(matches!(
            b.create_mailbox("alice", &Mailbox::inbox()).await,
            Err(BackendError::MailboxExists(_))
        ));
        assert!(matches!(
            b.delete_mailbox("alice", &Mailbox::inbox()).await,
            Err(BackendError::NotPermitted(_))
        ));
    }

    #[tokio::test]
    async fn test_append_keeps_internal_date() {
        let b = backend().await;
        let date = DateTime::parse_from_rfc3339("2023-05-01T08:30:00+02:00").unwrap();
        b.append("alice", &Mailbox::inbox(), RAW.to_vec(), FlagSet::default(), Some(date))
            .await
            .unwrap();
        let messages = b.messages("alice", &Mailbox::inbox()).await.unwrap();
        assert_eq!(messages[0].internal_date, date);
    }
}
