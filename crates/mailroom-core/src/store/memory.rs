//! In-process mail and user storage.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use mailroom_imap::{FlagSet, Mailbox, MailboxInfo};
use mailroom_mime::ParsedMail;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::model::{HeaderOptions, Mail, MailBodyData, MailHeaderData, MailId, MailboxState};
use super::{MailboxStore, UserStore};
use crate::account::{NewUser, User, UserQuery, hash_password, validate_user};
use crate::{Error, Result};

/// Mailboxes every new user starts with.
pub const DEFAULT_MAILBOXES: [&str; 4] = ["INBOX", "Sent", "Drafts", "Trash"];

/// Mail and user storage held in memory.
///
/// Every trait call takes the lock once, so each call is atomic. Nothing
/// survives a restart; UIDVALIDITY is seeded from the clock so clients
/// notice.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

struct Inner {
    users: BTreeMap<String, User>,
    mailboxes: HashMap<String, BTreeMap<Mailbox, MailboxData>>,
    mails: BTreeMap<MailId, StoredMail>,
    next_id: u64,
    next_validity: u32,
}

#[derive(Debug, Clone, Copy)]
struct MailboxData {
    uid_validity: u32,
    uid_next: u32,
    subscribed: bool,
}

#[derive(Debug, Clone)]
struct StoredMail {
    owner: String,
    mailbox: Mailbox,
    uid: u32,
    flags: FlagSet,
    recent: bool,
    internal_date: DateTime<FixedOffset>,
    raw: Vec<u8>,
    parsed: ParsedMail,
}

impl StoredMail {
    fn header(&self, id: MailId) -> MailHeaderData {
        let p = &self.parsed;
        MailHeaderData {
            id,
            uid: self.uid,
            mailbox: self.mailbox.clone(),
            subject: p.subject.clone(),
            from: p.from.clone(),
            to: p.to.clone(),
            cc: p.cc.clone(),
            reply_to: p.reply_to.clone(),
            message_id: p.message_id.clone(),
            in_reply_to: p.in_reply_to.clone(),
            date: p.date,
            flags: self.flags,
            recent: self.recent,
            internal_date: self.internal_date,
            size: u32::try_from(self.raw.len()).unwrap_or(u32::MAX),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        let seed = u32::try_from(Utc::now().timestamp()).unwrap_or(1);
        Self {
            inner: RwLock::new(Inner {
                users: BTreeMap::new(),
                mailboxes: HashMap::new(),
                mails: BTreeMap::new(),
                next_id: 1,
                next_validity: seed.max(1),
            }),
        }
    }

    /// Registers a user under `domain` with the default mailboxes.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is invalid, or if the username or
    /// address is taken.
    pub async fn add_user(&self, new: &NewUser, domain: &str) -> Result<User> {
        validate_user(new, domain).map_err(|errors| {
            let reasons: Vec<String> = errors.iter().map(ToString::to_string).collect();
            Error::InvalidUser(reasons.join("; "))
        })?;

        let user = User {
            id: new.username.to_lowercase(),
            username: new.username.clone(),
            email: new.email_in(domain).to_lowercase(),
            password_hash: hash_password(&new.password)?,
        };

        let mut inner = self.inner.write().await;
        if inner.users.contains_key(&user.id)
            || inner.users.values().any(|u| u.email == user.email)
        {
            return Err(Error::UserExists(user.username));
        }

        let mut boxes = BTreeMap::new();
        for name in DEFAULT_MAILBOXES {
            let mut data = inner.new_mailbox();
            data.subscribed = true;
            boxes.insert(Mailbox::new(name), data);
        }
        inner.mailboxes.insert(user.id.clone(), boxes);
        inner.users.insert(user.id.clone(), user.clone());
        info!(user = %user.id, email = %user.email, "user registered");
        Ok(user)
    }
}

impl Inner {
    fn new_mailbox(&mut self) -> MailboxData {
        let uid_validity = self.next_validity;
        self.next_validity = self.next_validity.wrapping_add(1).max(1);
        MailboxData {
            uid_validity,
            uid_next: 1,
            subscribed: false,
        }
    }

    fn boxes(&self, user: &str) -> Result<&BTreeMap<Mailbox, MailboxData>> {
        self.mailboxes
            .get(user)
            .ok_or_else(|| Error::UserNotFound(user.to_string()))
    }

    fn boxes_mut(&mut self, user: &str) -> Result<&mut BTreeMap<Mailbox, MailboxData>> {
        self.mailboxes
            .get_mut(user)
            .ok_or_else(|| Error::UserNotFound(user.to_string()))
    }

    fn mailbox(&self, user: &str, mailbox: &Mailbox) -> Result<&MailboxData> {
        self.boxes(user)?
            .get(mailbox)
            .ok_or_else(|| Error::MailboxNotFound(mailbox.to_string()))
    }

    fn next_uid(&mut self, user: &str, mailbox: &Mailbox) -> Result<u32> {
        let data = self
            .boxes_mut(user)?
            .get_mut(mailbox)
            .ok_or_else(|| Error::MailboxNotFound(mailbox.to_string()))?;
        let uid = data.uid_next;
        data.uid_next += 1;
        Ok(uid)
    }

    fn insert(&mut self, mail: StoredMail) -> MailId {
        let id = MailId(self.next_id);
        self.next_id += 1;
        self.mails.insert(id, mail);
        id
    }

    fn mail_mut(&mut self, id: MailId) -> Result<&mut StoredMail> {
        self.mails.get_mut(&id).ok_or(Error::MailNotFound(id))
    }

    fn headers(
        &self,
        user: &str,
        mailbox: &Mailbox,
        options: HeaderOptions,
    ) -> Result<Vec<MailHeaderData>> {
        self.mailbox(user, mailbox)?;
        let mut headers: Vec<MailHeaderData> = self
            .mails
            .iter()
            .filter(|(_, m)| m.owner == user && &m.mailbox == mailbox)
            .filter(|(_, m)| !options.unread_only || !m.flags.read)
            .filter(|(_, m)| !options.saved_only || m.flags.saved)
            .map(|(id, m)| m.header(*id))
            .collect();
        headers.sort_by_key(|h| h.uid);
        if let Some(limit) = options.limit {
            let skip = headers.len().saturating_sub(limit);
            headers.drain(..skip);
        }
        Ok(headers)
    }

    /// Moves every message of `from` into the empty mailbox `to`, with new UIDs.
    fn move_all(&mut self, user: &str, from: &Mailbox, to: &Mailbox) -> Result<()> {
        let ids: Vec<MailId> = self
            .mails
            .iter()
            .filter(|(_, m)| m.owner == user && &m.mailbox == from)
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            let uid = self.next_uid(user, to)?;
            let mail = self.mail_mut(id)?;
            mail.mailbox = to.clone();
            mail.uid = uid;
        }
        Ok(())
    }
}

fn renamed(name: &Mailbox, from: &Mailbox, to: &Mailbox) -> Mailbox {
    match name.as_str().strip_prefix(from.as_str()) {
        Some(rest) if name != from => Mailbox::new(format!("{}{rest}", to.as_str())),
        _ => to.clone(),
    }
}

#[async_trait]
impl MailboxStore for MemoryStore {
    async fn get_mail_headers(
        &self,
        user: &str,
        mailbox: &Mailbox,
        options: HeaderOptions,
    ) -> Result<Vec<MailHeaderData>> {
        if !options.claim_recent {
            return self.inner.read().await.headers(user, mailbox, options);
        }
        let mut inner = self.inner.write().await;
        let headers = inner.headers(user, mailbox, options)?;
        for header in headers.iter().filter(|h| h.recent) {
            inner.mail_mut(header.id)?.recent = false;
        }
        Ok(headers)
    }

    async fn get_mail_body(&self, user: &str, id: MailId) -> Result<MailBodyData> {
        let inner = self.inner.read().await;
        let mail = inner
            .mails
            .get(&id)
            .filter(|m| m.owner == user)
            .ok_or(Error::MailNotFound(id))?;
        Ok(MailBodyData {
            id,
            raw: mail.raw.clone(),
            text: mail.parsed.text.clone(),
            html: mail.parsed.html.clone(),
            attachments: mail.parsed.attachments.clone(),
        })
    }

    async fn mark_read(&self, id: MailId) -> Result<()> {
        self.inner.write().await.mail_mut(id)?.flags.read = true;
        Ok(())
    }

    async fn mark_saved(&self, id: MailId, saved: bool) -> Result<()> {
        self.inner.write().await.mail_mut(id)?.flags.saved = saved;
        Ok(())
    }

    async fn delete_mail(&self, id: MailId) -> Result<()> {
        self.inner
            .write()
            .await
            .mails
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::MailNotFound(id))
    }

    async fn save_mail(&self, user_id: &str, mail: Mail) -> Result<u32> {
        let mut inner = self.inner.write().await;
        let uid = inner.next_uid(user_id, &mail.mailbox)?;
        debug!(user = user_id, mailbox = %mail.mailbox, uid, size = mail.raw.len(), "message stored");
        inner.insert(StoredMail {
            owner: user_id.to_string(),
            mailbox: mail.mailbox,
            uid,
            flags: mail.flags,
            recent: true,
            internal_date: mail.internal_date,
            raw: mail.raw,
            parsed: mail.parsed,
        });
        Ok(uid)
    }

    async fn set_flags(&self, changes: &[(MailId, FlagSet)]) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some((missing, _)) = changes.iter().find(|(id, _)| !inner.mails.contains_key(id)) {
            return Err(Error::MailNotFound(*missing));
        }
        for (id, flags) in changes {
            inner.mail_mut(*id)?.flags = *flags;
        }
        Ok(())
    }

    async fn copy_mail(&self, user: &str, ids: &[MailId], to: &Mailbox) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.mailbox(user, to)?;
        let originals = ids
            .iter()
            .map(|id| {
                inner
                    .mails
                    .get(id)
                    .filter(|m| m.owner == user)
                    .cloned()
                    .ok_or(Error::MailNotFound(*id))
            })
            .collect::<Result<Vec<_>>>()?;
        for mut copy in originals {
            copy.uid = inner.next_uid(user, to)?;
            copy.mailbox = to.clone();
            copy.recent = true;
            inner.insert(copy);
        }
        Ok(())
    }

    async fn list_mailboxes(&self, user: &str) -> Result<Vec<MailboxInfo>> {
        let inner = self.inner.read().await;
        Ok(inner
            .boxes(user)?
            .iter()
            .map(|(name, data)| MailboxInfo {
                name: name.clone(),
                subscribed: data.subscribed,
            })
            .collect())
    }

    async fn create_mailbox(&self, user: &str, mailbox: &Mailbox) -> Result<()> {
        if mailbox.as_str().is_empty() {
            return Err(Error::NotPermitted("empty mailbox name".to_string()));
        }
        let mut inner = self.inner.write().await;
        if inner.boxes(user)?.contains_key(mailbox) {
            return Err(Error::MailboxExists(mailbox.to_string()));
        }
        let data = inner.new_mailbox();
        inner.boxes_mut(user)?.insert(mailbox.clone(), data);
        Ok(())
    }

    async fn delete_mailbox(&self, user: &str, mailbox: &Mailbox) -> Result<()> {
        if mailbox.is_inbox() {
            return Err(Error::NotPermitted("INBOX cannot be deleted".to_string()));
        }
        let mut inner = self.inner.write().await;
        if inner.boxes_mut(user)?.remove(mailbox).is_none() {
            return Err(Error::MailboxNotFound(mailbox.to_string()));
        }
        inner
            .mails
            .retain(|_, m| !(m.owner == user && &m.mailbox == mailbox));
        Ok(())
    }

    async fn rename_mailbox(&self, user: &str, from: &Mailbox, to: &Mailbox) -> Result<()> {
        if to.is_inbox() || to == from || to.is_child_of(from) {
            return Err(Error::NotPermitted(format!("cannot rename {from} to {to}")));
        }
        let mut inner = self.inner.write().await;
        let boxes = inner.boxes(user)?;
        if !boxes.contains_key(from) {
            return Err(Error::MailboxNotFound(from.to_string()));
        }

        // INBOX stays; its messages move to the new name.
        if from.is_inbox() {
            if boxes.contains_key(to) {
                return Err(Error::MailboxExists(to.to_string()));
            }
            let data = inner.new_mailbox();
            inner.boxes_mut(user)?.insert(to.clone(), data);
            return inner.move_all(user, from, to);
        }

        let moving: Vec<Mailbox> = boxes
            .keys()
            .filter(|name| *name == from || name.is_child_of(from))
            .cloned()
            .collect();
        if let Some(taken) = moving
            .iter()
            .map(|name| renamed(name, from, to))
            .find(|target| boxes.contains_key(target))
        {
            return Err(Error::MailboxExists(taken.to_string()));
        }

        let boxes = inner.boxes_mut(user)?;
        for name in &moving {
            if let Some(data) = boxes.remove(name) {
                boxes.insert(renamed(name, from, to), data);
            }
        }
        for mail in inner.mails.values_mut().filter(|m| m.owner == user) {
            if moving.contains(&mail.mailbox) {
                mail.mailbox = renamed(&mail.mailbox, from, to);
            }
        }
        Ok(())
    }

    async fn subscribe(&self, user: &str, mailbox: &Mailbox) -> Result<()> {
        set_subscribed(&mut *self.inner.write().await, user, mailbox, true)
    }

    async fn unsubscribe(&self, user: &str, mailbox: &Mailbox) -> Result<()> {
        set_subscribed(&mut *self.inner.write().await, user, mailbox, false)
    }

    async fn mailbox_info(&self, user: &str, mailbox: &Mailbox) -> Result<MailboxState> {
        let inner = self.inner.read().await;
        let data = inner.mailbox(user, mailbox)?;
        Ok(MailboxState {
            uid_validity: data.uid_validity,
            uid_next: data.uid_next,
        })
    }
}

fn set_subscribed(inner: &mut Inner, user: &str, mailbox: &Mailbox, subscribed: bool) -> Result<()> {
    let data = inner
        .boxes_mut(user)?
        .get_mut(mailbox)
        .ok_or_else(|| Error::MailboxNotFound(mailbox.to_string()))?;
    data.subscribed = subscribed;
    Ok(())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, query: UserQuery<'_>) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(match query {
            UserQuery::Username(name) => inner.users.get(&name.to_lowercase()).cloned(),
            UserQuery::Email(email) => inner
                .users
                .values()
                .find(|u| u.email.eq_ignore_ascii_case(email))
                .cloned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const RAW: &[u8] = b"From: Ann <ann@example.org>\r\nTo: alice@example.com\r\nSubject: Hi\r\n\r\nHello\r\n";

    async fn store_with_alice() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .add_user(&NewUser::new("Alice", "pw"), "example.com")
            .await
            .unwrap();
        store
    }

    async fn save(store: &MemoryStore, mailbox: &str) -> u32 {
        store
            .save_mail("alice", Mail::new(Mailbox::new(mailbox), RAW.to_vec()))
            .await
            .unwrap()
    }

    async fn headers(store: &MemoryStore, mailbox: &str) -> Vec<MailHeaderData> {
        store
            .get_mail_headers("alice", &Mailbox::new(mailbox), HeaderOptions::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_new_user_gets_default_mailboxes() {
        let store = store_with_alice().await;
        let boxes = store.list_mailboxes("alice").await.unwrap();
        let names: Vec<&str> = boxes.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Drafts", "INBOX", "Sent", "Trash"]);
        assert!(boxes.iter().all(|b| b.subscribed));
    }

    #[tokio::test]
    async fn test_user_lookup_is_case_insensitive() {
        let store = store_with_alice().await;
        let by_name = store.get_user(UserQuery::Username("ALICE")).await.unwrap().unwrap();
        assert_eq!(by_name.id, "alice");
        assert_eq!(by_name.email, "alice@example.com");
        let by_email = store
            .get_user(UserQuery::Email("Alice@Example.com"))
            .await
            .unwrap();
        assert_eq!(by_email, Some(by_name));
        assert!(store.get_user(UserQuery::Username("bob")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_and_invalid_users_are_refused() {
        let store = store_with_alice().await;
        let dup = store.add_user(&NewUser::new("alice", "x"), "example.com").await;
        assert!(matches!(dup, Err(Error::UserExists(_))));
        let bad = store.add_user(&NewUser::new("bad name", "x"), "example.com").await;
        assert!(matches!(bad, Err(Error::InvalidUser(_))));
    }

    #[tokio::test]
    async fn test_uids_ascend_and_recent_is_claimed_once() {
        let store = store_with_alice().await;
        assert_eq!(save(&store, "INBOX").await, 1);
        assert_eq!(save(&store, "inbox").await, 2);

        let claim = HeaderOptions {
            claim_recent: true,
            ..HeaderOptions::default()
        };
        let first = store
            .get_mail_headers("alice", &Mailbox::inbox(), claim)
            .await
            .unwrap();
        assert_eq!(first.iter().map(|h| h.uid).collect::<Vec<_>>(), vec![1, 2]);
        assert!(first.iter().all(|h| h.recent));
        assert_eq!(first[0].subject.as_deref(), Some("Hi"));
        assert_eq!(first[0].size, u32::try_from(RAW.len()).unwrap());

        assert!(headers(&store, "INBOX").await.iter().all(|h| !h.recent));
        let info = store.mailbox_info("alice", &Mailbox::inbox()).await.unwrap();
        assert_eq!(info.uid_next, 3);
    }

    #[tokio::test]
    async fn test_header_filters() {
        let store = store_with_alice().await;
        for _ in 0..3 {
            save(&store, "INBOX").await;
        }
        let all = headers(&store, "INBOX").await;
        store.mark_read(all[0].id).await.unwrap();
        store.mark_saved(all[1].id, true).await.unwrap();

        let unread = HeaderOptions {
            unread_only: true,
            ..HeaderOptions::default()
        };
        let uids = |h: Vec<MailHeaderData>| h.iter().map(|h| h.uid).collect::<Vec<_>>();
        let inbox = Mailbox::inbox();
        assert_eq!(uids(store.get_mail_headers("alice", &inbox, unread).await.unwrap()), vec![2, 3]);

        let saved = HeaderOptions {
            saved_only: true,
            ..HeaderOptions::default()
        };
        assert_eq!(uids(store.get_mail_headers("alice", &inbox, saved).await.unwrap()), vec![2]);

        let newest = HeaderOptions {
            limit: Some(2),
            ..HeaderOptions::default()
        };
        assert_eq!(uids(store.get_mail_headers("alice", &inbox, newest).await.unwrap()), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_body_is_private_to_owner() {
        let store = store_with_alice().await;
        store.add_user(&NewUser::new("bob", "pw"), "example.com").await.unwrap();
        save(&store, "INBOX").await;
        let id = headers(&store, "INBOX").await[0].id;

        let body = store.get_mail_body("alice", id).await.unwrap();
        assert_eq!(body.raw, RAW);
        assert_eq!(body.text.as_deref(), Some("Hello\r\n"));
        assert!(matches!(
            store.get_mail_body("bob", id).await,
            Err(Error::MailNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_set_flags_is_all_or_nothing() {
        let store = store_with_alice().await;
        save(&store, "INBOX").await;
        let id = headers(&store, "INBOX").await[0].id;
        let flags = FlagSet {
            deleted: true,
            ..FlagSet::default()
        };
        let result = store.set_flags(&[(id, flags), (MailId(999), flags)]).await;
        assert!(matches!(result, Err(Error::MailNotFound(MailId(999)))));
        assert!(!headers(&store, "INBOX").await[0].flags.deleted);

        store.set_flags(&[(id, flags)]).await.unwrap();
        assert!(headers(&store, "INBOX").await[0].flags.deleted);
        store.delete_mail(id).await.unwrap();
        assert!(headers(&store, "INBOX").await.is_empty());
        assert!(store.delete_mail(id).await.is_err());
    }

    #[tokio::test]
    async fn test_copy_assigns_new_uids() {
        let store = store_with_alice().await;
        save(&store, "INBOX").await;
        save(&store, "Trash").await;
        let id = headers(&store, "INBOX").await[0].id;
        store.copy_mail("alice", &[id], &Mailbox::new("Trash")).await.unwrap();

        let trash = headers(&store, "Trash").await;
        assert_eq!(trash.iter().map(|h| h.uid).collect::<Vec<_>>(), vec![1, 2]);
        assert!(trash[1].recent);
        let missing = store.copy_mail("alice", &[id], &Mailbox::new("Nope")).await;
        assert!(matches!(missing, Err(Error::MailboxNotFound(_))));
    }

    #[tokio::test]
    async fn test_mailbox_lifecycle() {
        let store = store_with_alice().await;
        let work = Mailbox::new("Work");
        store.create_mailbox("alice", &work).await.unwrap();
        assert!(matches!(
            store.create_mailbox("alice", &work).await,
            Err(Error::MailboxExists(_))
        ));
        let validity = store.mailbox_info("alice", &work).await.unwrap().uid_validity;

        store.subscribe("alice", &work).await.unwrap();
        store.unsubscribe("alice", &work).await.unwrap();
        save(&store, "Work").await;
        store.delete_mailbox("alice", &work).await.unwrap();
        assert!(matches!(
            store.delete_mailbox("alice", &work).await,
            Err(Error::MailboxNotFound(_))
        ));
        assert!(matches!(
            store.delete_mailbox("alice", &Mailbox::inbox()).await,
            Err(Error::NotPermitted(_))
        ));

        store.create_mailbox("alice", &work).await.unwrap();
        let info = store.mailbox_info("alice", &work).await.unwrap();
        assert_ne!(info.uid_validity, validity);
        assert_eq!(info.uid_next, 1);
    }

    #[tokio::test]
    async fn test_rename_moves_children_and_messages() {
        let store = store_with_alice().await;
        for name in ["Projects", "Projects/2024", "ProjectsOld"] {
            store.create_mailbox("alice", &Mailbox::new(name)).await.unwrap();
        }
        save(&store, "Projects/2024").await;

        store
            .rename_mailbox("alice", &Mailbox::new("Projects"), &Mailbox::new("Archive"))
            .await
            .unwrap();
        let names: Vec<String> = store
            .list_mailboxes("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name.0)
            .collect();
        assert!(names.contains(&"Archive".to_string()));
        assert!(names.contains(&"Archive/2024".to_string()));
        assert!(names.contains(&"ProjectsOld".to_string()));
        assert!(!names.contains(&"Projects".to_string()));
        assert_eq!(headers(&store, "Archive/2024").await.len(), 1);
    }

    #[tokio::test]
    async fn test_rename_conflicts() {
        let store = store_with_alice().await;
        let sent = Mailbox::new("Sent");
        let trash = Mailbox::new("Trash");
        assert!(matches!(
            store.rename_mailbox("alice", &sent, &trash).await,
            Err(Error::MailboxExists(_))
        ));
        assert!(matches!(
            store.rename_mailbox("alice", &Mailbox::new("Nope"), &Mailbox::new("X")).await,
            Err(Error::MailboxNotFound(_))
        ));
        assert!(matches!(
            store.rename_mailbox("alice", &sent, &Mailbox::new("Sent/Sub")).await,
            Err(Error::NotPermitted(_))
        ));
    }

    #[tokio::test]
    async fn test_renaming_inbox_moves_messages_out() {
        let store = store_with_alice().await;
        save(&store, "INBOX").await;
        save(&store, "INBOX").await;
        store
            .rename_mailbox("alice", &Mailbox::inbox(), &Mailbox::new("Old"))
            .await
            .unwrap();
        assert!(headers(&store, "INBOX").await.is_empty());
        let old = headers(&store, "Old").await;
        assert_eq!(old.iter().map(|h| h.uid).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(save(&store, "INBOX").await, 3);
    }

    #[tokio::test]
    async fn test_unknown_user_and_mailbox() {
        let store = store_with_alice().await;
        assert!(matches!(
            store.list_mailboxes("ghost").await,
            Err(Error::UserNotFound(_))
        ));
        let result = store
            .save_mail("alice", Mail::new(Mailbox::new("Nope"), RAW.to_vec()))
            .await;
        assert!(matches!(result, Err(Error::MailboxNotFound(_))));
    }
}
