//! ENVELOPE structure.

use super::write_nstring;

/// Message envelope, as carried in a FETCH ENVELOPE response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// Date header.
    pub date: Option<String>,
    /// Subject header.
    pub subject: Option<String>,
    /// From addresses.
    pub from: Vec<Address>,
    /// Sender addresses; FROM is sent when empty.
    pub sender: Vec<Address>,
    /// Reply-To addresses; FROM is sent when empty.
    pub reply_to: Vec<Address>,
    /// To addresses.
    pub to: Vec<Address>,
    /// Cc addresses.
    pub cc: Vec<Address>,
    /// Bcc addresses.
    pub bcc: Vec<Address>,
    /// In-Reply-To header.
    pub in_reply_to: Option<String>,
    /// Message-ID header.
    pub message_id: Option<String>,
}

/// Email address from envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    /// Display name.
    pub name: Option<String>,
    /// Mailbox name (local part).
    pub mailbox: Option<String>,
    /// Host name (domain part).
    pub host: Option<String>,
}

impl Address {
    /// Splits `local@host` into an address with an optional display name.
    #[must_use]
    pub fn from_email(name: Option<String>, email: &str) -> Self {
        let (mailbox, host) = match email.rsplit_once('@') {
            Some((local, host)) => (Some(local.to_string()), Some(host.to_string())),
            None => (Some(email.to_string()), None),
        };
        Self {
            name,
            mailbox,
            host,
        }
    }

    /// Returns the full email address.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        match (&self.mailbox, &self.host) {
            (Some(m), Some(h)) => Some(format!("{m}@{h}")),
            (Some(m), None) => Some(m.clone()),
            _ => None,
        }
    }
}

impl Envelope {
    /// Writes the parenthesized envelope.
    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.push(b'(');
        write_nstring(out, self.date.as_deref());
        out.push(b' ');
        write_nstring(out, self.subject.as_deref());
        out.push(b' ');
        write_addresses(out, &self.from);
        out.push(b' ');
        write_addresses(out, fallback(&self.sender, &self.from));
        out.push(b' ');
        write_addresses(out, fallback(&self.reply_to, &self.from));
        out.push(b' ');
        write_addresses(out, &self.to);
        out.push(b' ');
        write_addresses(out, &self.cc);
        out.push(b' ');
        write_addresses(out, &self.bcc);
        out.push(b' ');
        write_nstring(out, self.in_reply_to.as_deref());
        out.push(b' ');
        write_nstring(out, self.message_id.as_deref());
        out.push(b')');
    }
}

fn fallback<'a>(list: &'a [Address], default: &'a [Address]) -> &'a [Address] {
    if list.is_empty() { default } else { list }
}

fn write_addresses(out: &mut Vec<u8>, list: &[Address]) {
    if list.is_empty() {
        out.extend_from_slice(b"NIL");
        return;
    }
    out.push(b'(');
    for address in list {
        out.push(b'(');
        write_nstring(out, address.name.as_deref());
        out.extend_from_slice(b" NIL ");
        write_nstring(out, address.mailbox.as_deref());
        out.push(b' ');
        write_nstring(out, address.host.as_deref());
        out.push(b')');
    }
    out.push(b')');
}
