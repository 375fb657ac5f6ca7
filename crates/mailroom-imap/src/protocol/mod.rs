//! IMAP session state machine.
//!
//! A [`Session`] owns the per-connection state: lifecycle state, the
//! authenticated user and the selected mailbox. It consumes complete
//! command lines (as assembled by the
//! [`CommandFramer`](crate::parser::CommandFramer)) and produces
//! [`Response`] values; it does no I/O of its own, so it can be driven by a
//! test without a socket.
//!
//! Each command results in at most one mutating [`Backend`] call. A failed
//! backend call turns into a tagged `NO` and the connection stays open.

#![allow(clippy::missing_const_for_fn)]

mod state;

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::DateTime;
use tracing::{debug, error, info, warn};

pub use state::{SelectedState, SessionState};

use crate::backend::{Backend, MessageMeta};
use crate::command::{
    Command, CopyArgs, FetchArgs, SearchArgs, StatusAttribute, StoreArgs, TaggedCommand,
    UidCommand,
};
use crate::error::BackendError;
use crate::fetch::{FetchAttribute, parse_items};
use crate::parser::parse_command;
use crate::response::{FetchValue, INTERNAL_DATE_FORMAT, Response};
use crate::search::{Bounds, Candidate, matches_all, needs_content};
use crate::types::{
    Capability, Flag, FlagSet, ListEntry, Mailbox, MailboxAttribute, ResponseCode,
    SequenceSet, Status, Tag, UidValidity, list_matches,
};

/// Flags every mailbox supports.
const SYSTEM_FLAGS: [Flag; 5] = [Flag::Answered, Flag::Flagged, Flag::Deleted, Flag::Seen, Flag::Draft];

/// Whether the connection should stay open after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading commands.
    Continue,
    /// Close the connection after flushing the responses.
    Close,
}

/// A multi-line exchange in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    /// `AUTHENTICATE PLAIN` is waiting for the client's response line.
    AuthPlain(Tag),
}

/// Per-connection IMAP session.
pub struct Session<B: ?Sized> {
    backend: Arc<B>,
    state: SessionState,
    user: Option<String>,
    pending: Option<Pending>,
}

impl<B: Backend + ?Sized> Session<B> {
    /// Creates a session in the `NotAuthenticated` state.
    #[must_use]
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            state: SessionState::NotAuthenticated,
            user: None,
            pending: None,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns the authenticated user id.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Returns the server greeting.
    #[must_use]
    pub fn greeting(&self) -> Response {
        Response::untagged(
            Status::Ok,
            Some(ResponseCode::Capability(Capability::advertised(false))),
            "mailroom IMAP4rev1 ready",
        )
    }

    /// Handles one complete command line (without its final CRLF).
    pub async fn handle_line(&mut self, line: &[u8], out: &mut Vec<Response>) -> Flow {
        if let Some(Pending::AuthPlain(tag)) = self.pending.take() {
            self.finish_plain(&tag, line, out).await;
            return Flow::Continue;
        }

        if line.is_empty() {
            return Flow::Continue;
        }

        match parse_command(line) {
            Ok(command) => self.execute(command, out).await,
            Err(err) => {
                warn!(reason = %err.reason, "rejected command");
                match err.tag {
                    Some(tag) => out.push(Response::bad(&tag, err.reason)),
                    None => out.push(Response::untagged(Status::Bad, None, err.reason)),
                }
                Flow::Continue
            }
        }
    }

    /// Answers a command whose literal exceeded the size limit.
    pub fn reject_literal(&self, partial: &[u8], size: usize, out: &mut Vec<Response>) {
        warn!(size, user = ?self.user, "literal too large");
        let tag = partial
            .split(|&b| b == b' ')
            .next()
            .and_then(|t| std::str::from_utf8(t).ok())
            .filter(|t| Tag::is_valid(t))
            .map(Tag::new);
        let text = format!("Literal of {size} bytes is too large");
        match tag {
            Some(tag) => out.push(Response::tagged(&tag, Status::No, Some(ResponseCode::TooBig), text)),
            None => out.push(Response::untagged(Status::Bad, None, text)),
        }
    }

    /// Executes a parsed command.
    pub async fn execute(&mut self, tagged: TaggedCommand, out: &mut Vec<Response>) -> Flow {
        let TaggedCommand { tag, command } = tagged;
        debug!(tag = %tag, command = command.name(), "executing");

        if let Err(reason) = self.state.permits(&command) {
            out.push(Response::no(&tag, reason));
            return Flow::Continue;
        }

        match command {
            Command::Capability => {
                out.push(Response::Capability(Capability::advertised(
                    self.state.is_authenticated(),
                )));
                out.push(Response::ok(&tag, "CAPABILITY completed"));
            }
            Command::Noop => out.push(Response::ok(&tag, "NOOP completed")),
            Command::Logout => {
                out.push(Response::untagged(Status::Bye, None, "Logging out"));
                out.push(Response::ok(&tag, "LOGOUT completed"));
                self.state = SessionState::Logout;
                return Flow::Close;
            }
            Command::Login { username, password } => {
                self.login(&tag, &username, &password, out).await;
            }
            Command::Authenticate {
                mechanism,
                initial_response,
            } => {
                if !mechanism.eq_ignore_ascii_case("PLAIN") {
                    out.push(Response::no(&tag, "Unsupported authentication mechanism"));
                } else if let Some(initial) = initial_response {
                    self.finish_plain(&tag, initial.as_bytes(), out).await;
                } else {
                    self.pending = Some(Pending::AuthPlain(tag));
                    out.push(Response::Continuation(String::new()));
                }
            }
            Command::Select { mailbox } => self.select(&tag, mailbox, false, out).await,
            Command::Examine { mailbox } => self.select(&tag, mailbox, true, out).await,
            Command::Create { mailbox } => {
                if mailbox.is_inbox() || mailbox.as_str().is_empty() {
                    out.push(Response::no(&tag, "Cannot create this mailbox"));
                } else {
                    let result = self.backend.create_mailbox(self.user_id(), &mailbox).await;
                    finish(&tag, "CREATE", result, out);
                }
            }
            Command::Delete { mailbox } => {
                if mailbox.is_inbox() {
                    out.push(Response::no(&tag, "Cannot delete INBOX"));
                } else {
                    let result = self.backend.delete_mailbox(self.user_id(), &mailbox).await;
                    finish(&tag, "DELETE", result, out);
                }
            }
            Command::Rename { from, to } => {
                let result = self.backend.rename_mailbox(self.user_id(), &from, &to).await;
                finish(&tag, "RENAME", result, out);
            }
            Command::Subscribe { mailbox } => {
                let result = self.backend.subscribe(self.user_id(), &mailbox).await;
                finish(&tag, "SUBSCRIBE", result, out);
            }
            Command::Unsubscribe { mailbox } => {
                let result = self.backend.unsubscribe(self.user_id(), &mailbox).await;
                finish(&tag, "UNSUBSCRIBE", result, out);
            }
            Command::List { reference, pattern } => {
                self.list(&tag, &reference, &pattern, false, out).await;
            }
            Command::Lsub { reference, pattern } => {
                self.list(&tag, &reference, &pattern, true, out).await;
            }
            Command::Status { mailbox, items } => self.status(&tag, &mailbox, &items, out).await,
            Command::Append {
                mailbox,
                flags,
                date,
                message,
            } => self.append(&tag, &mailbox, flags, date, message, out).await,
            Command::Check => out.push(Response::ok(&tag, "CHECK completed")),
            Command::Close => self.close(&tag, out).await,
            Command::Expunge => self.expunge(&tag, out).await,
            Command::Search(args) => self.search(&tag, &args, false, out).await,
            Command::Fetch(args) => self.fetch(&tag, &args, false, out).await,
            Command::Store(args) => self.store(&tag, &args, false, out).await,
            Command::Copy(args) => self.copy(&tag, &args, false, out).await,
            Command::Uid(UidCommand::Search(args)) => self.search(&tag, &args, true, out).await,
            Command::Uid(UidCommand::Fetch(args)) => self.fetch(&tag, &args, true, out).await,
            Command::Uid(UidCommand::Store(args)) => self.store(&tag, &args, true, out).await,
            Command::Uid(UidCommand::Copy(args)) => self.copy(&tag, &args, true, out).await,
        }
        Flow::Continue
    }

    fn user_id(&self) -> &str {
        self.user.as_deref().unwrap_or_default()
    }

    async fn login(&mut self, tag: &Tag, username: &str, password: &str, out: &mut Vec<Response>) {
        match self.backend.authenticate(username, password).await {
            Ok(Some(user)) => {
                info!(user = %user, "authenticated");
                self.user = Some(user);
                self.state = SessionState::Authenticated;
                out.push(Response::ok(tag, "Authentication successful"));
            }
            Ok(None) => {
                warn!(username, "authentication failed");
                out.push(Response::tagged(
                    tag,
                    Status::No,
                    Some(ResponseCode::AuthenticationFailed),
                    "Authentication failed",
                ));
            }
            Err(err) => {
                error!(error = %err, "credential lookup failed");
                out.push(Response::no(tag, "Authentication unavailable"));
            }
        }
    }

    /// Completes SASL PLAIN: `authzid NUL authcid NUL passwd`, base64.
    async fn finish_plain(&mut self, tag: &Tag, response: &[u8], out: &mut Vec<Response>) {
        if response == b"*" {
            out.push(Response::bad(tag, "Authentication cancelled"));
            return;
        }
        let decoded = if response == b"=" {
            Ok(Vec::new())
        } else {
            BASE64.decode(response)
        };
        let Ok(decoded) = decoded else {
            out.push(Response::bad(tag, "Invalid base64 in authentication response"));
            return;
        };
        let parts: Vec<&[u8]> = decoded.split(|&b| b == 0).collect();
        let [_authzid, authcid, passwd] = parts.as_slice() else {
            out.push(Response::bad(tag, "Malformed PLAIN response"));
            return;
        };
        let username = String::from_utf8_lossy(authcid).into_owned();
        let password = String::from_utf8_lossy(passwd).into_owned();
        self.login(tag, &username, &password, out).await;
    }

    async fn select(&mut self, tag: &Tag, mailbox: Mailbox, read_only: bool, out: &mut Vec<Response>) {
        let status = match self.backend.mailbox_status(self.user_id(), &mailbox).await {
            Ok(status) => status,
            Err(err) => {
                // A failed SELECT leaves no mailbox selected.
                self.state = SessionState::Authenticated;
                out.push(backend_failure(tag, if read_only { "EXAMINE" } else { "SELECT" }, &err));
                return;
            }
        };

        out.push(Response::Flags(SYSTEM_FLAGS.to_vec()));
        out.push(Response::Exists(status.exists));
        out.push(Response::Recent(status.recent));
        let permanent = if read_only { Vec::new() } else { SYSTEM_FLAGS.to_vec() };
        out.push(Response::untagged(
            Status::Ok,
            Some(ResponseCode::PermanentFlags(permanent)),
            "Limited",
        ));
        if let Some(validity) = UidValidity::new(status.uid_validity) {
            out.push(Response::untagged(
                Status::Ok,
                Some(ResponseCode::UidValidity(validity)),
                "UIDs valid",
            ));
        }
        out.push(Response::untagged(
            Status::Ok,
            Some(ResponseCode::UidNext(status.uid_next)),
            "Predicted next UID",
        ));

        let (code, name) = if read_only {
            (ResponseCode::ReadOnly, "EXAMINE")
        } else {
            (ResponseCode::ReadWrite, "SELECT")
        };
        info!(mailbox = %mailbox, read_only, "selected");
        self.state = SessionState::Selected(SelectedState { mailbox, read_only });
        out.push(Response::tagged(tag, Status::Ok, Some(code), format!("{name} completed")));
    }

    async fn list(
        &self,
        tag: &Tag,
        reference: &str,
        pattern: &str,
        lsub: bool,
        out: &mut Vec<Response>,
    ) {
        let name = if lsub { "LSUB" } else { "LIST" };
        if pattern.is_empty() {
            // Delimiter query.
            out.push(Response::List {
                lsub,
                entry: ListEntry {
                    attributes: vec![MailboxAttribute::NoSelect],
                    mailbox: Mailbox::new(""),
                },
            });
            out.push(Response::ok(tag, format!("{name} completed")));
            return;
        }

        let mailboxes = match self.backend.list_mailboxes(self.user_id()).await {
            Ok(mailboxes) => mailboxes,
            Err(err) => {
                out.push(backend_failure(tag, name, &err));
                return;
            }
        };

        for info in mailboxes.iter().filter(|m| !lsub || m.subscribed) {
            if !list_matches(reference, pattern, &info.name) {
                continue;
            }
            let has_children = mailboxes.iter().any(|m| m.name.is_child_of(&info.name));
            let mut attributes = vec![if has_children {
                MailboxAttribute::HasChildren
            } else {
                MailboxAttribute::HasNoChildren
            }];
            attributes.extend(MailboxAttribute::special_use(&info.name));
            out.push(Response::List {
                lsub,
                entry: ListEntry {
                    attributes,
                    mailbox: info.name.clone(),
                },
            });
        }
        out.push(Response::ok(tag, format!("{name} completed")));
    }

    async fn status(
        &self,
        tag: &Tag,
        mailbox: &Mailbox,
        items: &[StatusAttribute],
        out: &mut Vec<Response>,
    ) {
        match self.backend.mailbox_status(self.user_id(), mailbox).await {
            Ok(status) => {
                let items = items
                    .iter()
                    .map(|&item| {
                        let value = match item {
                            StatusAttribute::Messages => status.exists,
                            StatusAttribute::Recent => status.recent,
                            StatusAttribute::UidNext => status.uid_next,
                            StatusAttribute::UidValidity => status.uid_validity,
                            StatusAttribute::Unseen => status.unseen,
                        };
                        (item, value)
                    })
                    .collect();
                out.push(Response::MailboxStatus {
                    mailbox: mailbox.clone(),
                    items,
                });
                out.push(Response::ok(tag, "STATUS completed"));
            }
            Err(err) => out.push(backend_failure(tag, "STATUS", &err)),
        }
    }

    async fn append(
        &self,
        tag: &Tag,
        mailbox: &Mailbox,
        flags: Option<Vec<Flag>>,
        date: Option<String>,
        message: Vec<u8>,
        out: &mut Vec<Response>,
    ) {
        let date = match date {
            Some(raw) => match DateTime::parse_from_str(raw.trim(), INTERNAL_DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    out.push(Response::bad(tag, "Invalid date-time"));
                    return;
                }
            },
            None => None,
        };
        let flags = FlagSet::from_flags(flags.iter().flatten());
        match self
            .backend
            .append(self.user_id(), mailbox, message, flags, date)
            .await
        {
            Ok(uid) => {
                debug!(mailbox = %mailbox, uid, "appended");
                out.push(Response::ok(tag, "APPEND completed"));
            }
            Err(err) => out.push(backend_failure(tag, "APPEND", &err)),
        }
    }

    async fn close(&mut self, tag: &Tag, out: &mut Vec<Response>) {
        if let Some(selected) = self.state.selected().cloned()
            && !selected.read_only
            && let Err(err) = self.remove_deleted(&selected.mailbox).await
        {
            out.push(backend_failure(tag, "CLOSE", &err));
            return;
        }
        self.state = SessionState::Authenticated;
        out.push(Response::ok(tag, "CLOSE completed"));
    }

    async fn expunge(&mut self, tag: &Tag, out: &mut Vec<Response>) {
        let Some(selected) = self.state.selected().cloned() else {
            out.push(Response::no(tag, "No mailbox selected"));
            return;
        };
        if selected.read_only {
            out.push(Response::no(tag, "Mailbox is read-only"));
            return;
        }
        match self.remove_deleted(&selected.mailbox).await {
            Ok(removed) => {
                // Highest first, so no later number is shifted by an earlier one.
                for seq in removed.into_iter().rev() {
                    out.push(Response::Expunge(seq));
                }
                out.push(Response::ok(tag, "EXPUNGE completed"));
            }
            Err(err) => out.push(backend_failure(tag, "EXPUNGE", &err)),
        }
    }

    /// Expunges `\Deleted` messages and returns their sequence numbers.
    async fn remove_deleted(&self, mailbox: &Mailbox) -> Result<Vec<u32>, BackendError> {
        let messages = self.backend.messages(self.user_id(), mailbox).await?;
        let (seqs, uids): (Vec<u32>, Vec<u32>) = numbered(&messages)
            .filter(|(_, m)| m.flags.deleted)
            .map(|(seq, m)| (seq, m.uid))
            .unzip();
        if !uids.is_empty() {
            self.backend.expunge(self.user_id(), mailbox, &uids).await?;
        }
        Ok(seqs)
    }

    async fn selected_messages(
        &self,
        tag: &Tag,
        name: &str,
        out: &mut Vec<Response>,
    ) -> Option<(SelectedState, Vec<MessageMeta>)> {
        let selected = self.state.selected().cloned()?;
        match self.backend.messages(self.user_id(), &selected.mailbox).await {
            Ok(messages) => Some((selected, messages)),
            Err(err) => {
                out.push(backend_failure(tag, name, &err));
                None
            }
        }
    }

    async fn search(&self, tag: &Tag, args: &SearchArgs, uid: bool, out: &mut Vec<Response>) {
        let name = if uid { "UID SEARCH" } else { "SEARCH" };
        let Some((selected, messages)) = self.selected_messages(tag, name, out).await else {
            return;
        };
        let bounds = bounds(&messages);
        let read_content = needs_content(&args.criteria);

        let mut hits = Vec::new();
        for (seq, meta) in numbered(&messages) {
            let content = if read_content {
                match self
                    .backend
                    .fetch_message(self.user_id(), &selected.mailbox, meta.uid)
                    .await
                {
                    Ok(content) => Some(content),
                    Err(err) => {
                        out.push(backend_failure(tag, name, &err));
                        return;
                    }
                }
            } else {
                None
            };
            let candidate = Candidate {
                seq,
                meta,
                content: content.as_deref(),
            };
            if matches_all(&args.criteria, &candidate, bounds) {
                hits.push(if uid { meta.uid } else { seq });
            }
        }

        out.push(Response::Search(hits));
        out.push(Response::ok(tag, format!("{name} completed")));
    }

    async fn fetch(&self, tag: &Tag, args: &FetchArgs, uid: bool, out: &mut Vec<Response>) {
        let name = if uid { "UID FETCH" } else { "FETCH" };
        let mut attributes = match parse_items(&args.items) {
            Ok(attributes) => attributes,
            Err(item) => {
                out.push(Response::bad(tag, format!("Unsupported fetch item: {item}")));
                return;
            }
        };
        if uid && !attributes.contains(&FetchAttribute::Uid) {
            attributes.insert(0, FetchAttribute::Uid);
        }

        let Some((selected, messages)) = self.selected_messages(tag, name, out).await else {
            return;
        };
        let read_content = attributes.iter().any(FetchAttribute::needs_content);
        let marks_seen = !selected.read_only && attributes.iter().any(FetchAttribute::sets_seen);
        let wants_flags = attributes.contains(&FetchAttribute::Flags);

        let mut responses = Vec::new();
        let mut changes = Vec::new();
        for (seq, meta) in targets(&messages, &args.sequence, uid) {
            let content = if read_content {
                match self
                    .backend
                    .fetch_message(self.user_id(), &selected.mailbox, meta.uid)
                    .await
                {
                    Ok(content) => Some(content),
                    Err(err) => {
                        out.push(backend_failure(tag, name, &err));
                        return;
                    }
                }
            } else {
                None
            };

            let mut flags = meta.flags;
            let newly_seen = marks_seen && !flags.read;
            if newly_seen {
                flags.read = true;
                changes.push((meta.uid, flags));
            }

            let mut items: Vec<FetchValue> = attributes
                .iter()
                .filter_map(|attr| attr.value(meta, flags, content.as_deref()))
                .collect();
            if newly_seen
                && !wants_flags
                && let Some(value) = FetchAttribute::Flags.value(meta, flags, None)
            {
                items.push(value);
            }
            responses.push(Response::Fetch { seq, items });
        }

        if !changes.is_empty()
            && let Err(err) = self
                .backend
                .store_flags(self.user_id(), &selected.mailbox, &changes)
                .await
        {
            out.push(backend_failure(tag, name, &err));
            return;
        }

        out.extend(responses);
        out.push(Response::ok(tag, format!("{name} completed")));
    }

    async fn store(&self, tag: &Tag, args: &StoreArgs, uid: bool, out: &mut Vec<Response>) {
        let name = if uid { "UID STORE" } else { "STORE" };
        if self.state.is_read_only() {
            out.push(Response::no(tag, "Mailbox is read-only"));
            return;
        }
        let Some((selected, messages)) = self.selected_messages(tag, name, out).await else {
            return;
        };

        let mut changes = Vec::new();
        let mut responses = Vec::new();
        for (seq, meta) in targets(&messages, &args.sequence, uid) {
            let flags = args.operation.apply(&args.flags, meta.flags);
            changes.push((meta.uid, flags));
            if !args.operation.silent {
                let mut items = vec![FetchValue::Flags(flags.to_flags())];
                if uid {
                    items.push(FetchValue::Uid(meta.uid));
                }
                responses.push(Response::Fetch { seq, items });
            }
        }

        if !changes.is_empty()
            && let Err(err) = self
                .backend
                .store_flags(self.user_id(), &selected.mailbox, &changes)
                .await
        {
            out.push(backend_failure(tag, name, &err));
            return;
        }

        out.extend(responses);
        out.push(Response::ok(tag, format!("{name} completed")));
    }

    async fn copy(&self, tag: &Tag, args: &CopyArgs, uid: bool, out: &mut Vec<Response>) {
        let name = if uid { "UID COPY" } else { "COPY" };
        let Some((selected, messages)) = self.selected_messages(tag, name, out).await else {
            return;
        };
        let uids: Vec<u32> = targets(&messages, &args.sequence, uid)
            .map(|(_, m)| m.uid)
            .collect();
        if uids.is_empty() {
            out.push(Response::ok(tag, format!("{name} completed")));
            return;
        }
        let result = self
            .backend
            .copy(self.user_id(), &selected.mailbox, &uids, &args.mailbox)
            .await;
        finish(tag, name, result, out);
    }
}

/// Tagged completion for a backend call without untagged data.
fn finish(tag: &Tag, name: &str, result: Result<(), BackendError>, out: &mut Vec<Response>) {
    match result {
        Ok(()) => out.push(Response::ok(tag, format!("{name} completed"))),
        Err(err) => out.push(backend_failure(tag, name, &err)),
    }
}

/// Tagged `NO` for a failed backend call.
fn backend_failure(tag: &Tag, name: &str, err: &BackendError) -> Response {
    match err {
        BackendError::NoSuchMailbox(_) => {
            let code = matches!(name, "APPEND" | "COPY" | "UID COPY").then_some(ResponseCode::TryCreate);
            Response::tagged(tag, Status::No, code, format!("{name} failed: {err}"))
        }
        BackendError::MailboxExists(_) | BackendError::NotPermitted(_) => {
            Response::no(tag, format!("{name} failed: {err}"))
        }
        BackendError::Store(_) => {
            error!(command = name, error = %err, "backend failure");
            Response::no(tag, format!("{name} failed: server error"))
        }
    }
}

/// Pairs each message with its sequence number.
fn numbered(messages: &[MessageMeta]) -> impl Iterator<Item = (u32, &MessageMeta)> {
    (1u32..).zip(messages)
}

fn bounds(messages: &[MessageMeta]) -> Bounds {
    Bounds {
        max_seq: u32::try_from(messages.len()).unwrap_or(u32::MAX),
        max_uid: messages.last().map_or(0, |m| m.uid),
    }
}

/// Messages addressed by `set`, in mailbox order.
fn targets<'a>(
    messages: &'a [MessageMeta],
    set: &'a SequenceSet,
    uid: bool,
) -> impl Iterator<Item = (u32, &'a MessageMeta)> + 'a {
    let bounds = bounds(messages);
    numbered(messages).filter(move |(seq, meta)| {
        if uid {
            set.contains(meta.uid, bounds.max_uid)
        } else {
            set.contains(*seq, bounds.max_seq)
        }
    })
}
