//! Address-list headers (`From`, `To`, `Cc`).

use crate::encoding::decode_rfc2047;

/// One mailbox from an address-list header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAddress {
    /// Display name, RFC 2047 decoded and unquoted.
    pub name: Option<String>,
    /// `local@domain`.
    pub address: String,
}

impl MailAddress {
    /// Returns the part before `@`.
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.address
            .rsplit_once('@')
            .map_or(self.address.as_str(), |(local, _)| local)
    }

    /// Returns the part after `@`, empty if there is none.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.address.rsplit_once('@').map_or("", |(_, domain)| domain)
    }
}

impl std::fmt::Display for MailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "\"{name}\" <{}>", self.address),
            None => f.write_str(&self.address),
        }
    }
}

/// Parses an address-list header value.
///
/// Handles `Name <addr>`, bare addresses, quoted names containing commas,
/// comments and group syntax (`Team: a@x, b@y;`). Entries without an
/// address are dropped.
#[must_use]
pub fn parse_address_list(value: &str) -> Vec<MailAddress> {
    split_list(value)
        .into_iter()
        .filter_map(|item| parse_mailbox(strip_group(item)))
        .collect()
}

/// Splits on commas outside quotes, angle brackets and comments.
fn split_list(value: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut in_quotes = false;
    let mut angle = 0u32;
    let mut paren = 0u32;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '"' if paren == 0 => in_quotes = !in_quotes,
            '<' if !in_quotes && paren == 0 => angle += 1,
            '>' if !in_quotes && paren == 0 => angle = angle.saturating_sub(1),
            '(' if !in_quotes => paren += 1,
            ')' if !in_quotes => paren = paren.saturating_sub(1),
            ',' if !in_quotes && angle == 0 && paren == 0 => {
                items.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&value[start..]);
    items
}

/// Drops a leading `group-name:` and a trailing `;`.
fn strip_group(item: &str) -> &str {
    let item = item.trim().trim_end_matches(';');
    let before_address = item.find(['<', '"', '@']).unwrap_or(item.len());
    match item[..before_address].find(':') {
        Some(colon) => item[colon + 1..].trim(),
        None => item,
    }
}

fn parse_mailbox(item: &str) -> Option<MailAddress> {
    let item = item.trim();
    if let Some(open) = item.rfind('<') {
        let close = item[open..].find('>').map_or(item.len(), |i| open + i);
        let address = item[open + 1..close].trim();
        // Drop a source route: <@relay:user@host>
        let address = address.rsplit_once(':').map_or(address, |(_, a)| a);
        if address.is_empty() {
            return None;
        }
        let name = clean_name(&item[..open]);
        return Some(MailAddress {
            name,
            address: address.to_string(),
        });
    }

    let (address, comment) = split_comment(item);
    let address = address.trim();
    if address.is_empty() || !address.contains('@') {
        return None;
    }
    Some(MailAddress {
        name: comment.and_then(clean_name),
        address: address.to_string(),
    })
}

/// Separates `addr (Comment)` into the address and the comment text.
fn split_comment(item: &str) -> (&str, Option<&str>) {
    match (item.find('('), item.rfind(')')) {
        (Some(open), Some(close)) if open < close => {
            (&item[..open], Some(&item[open + 1..close]))
        }
        _ => (item, None),
    }
}

fn clean_name(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .map_or_else(|| raw.to_string(), |r| r.replace("\\\"", "\"").replace("\\\\", "\\"));
    let decoded = decode_rfc2047(&unquoted);
    let decoded = decoded.trim();
    (!decoded.is_empty()).then(|| decoded.to_string())
}
