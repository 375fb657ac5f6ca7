//! FETCH data items: parsing the client's item names and building the
//! values for one message.

#![allow(clippy::missing_const_for_fn)]

use crate::backend::MessageMeta;
use crate::response::FetchValue;
use crate::types::FlagSet;

/// Part of a message addressed by `BODY[...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    /// `BODY[]`: the whole message.
    Full,
    /// `BODY[HEADER]`
    Header,
    /// `BODY[TEXT]`
    Text,
    /// `BODY[HEADER.FIELDS (...)]` or `BODY[HEADER.FIELDS.NOT (...)]`.
    HeaderFields {
        /// Upper-cased field names.
        fields: Vec<String>,
        /// Exclude instead of include.
        not: bool,
    },
}

impl Section {
    fn parse(s: &str) -> Option<Self> {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "" => return Some(Self::Full),
            "HEADER" => return Some(Self::Header),
            "TEXT" => return Some(Self::Text),
            _ => {}
        }
        let (rest, not) = if let Some(rest) = upper.strip_prefix("HEADER.FIELDS.NOT") {
            (rest, true)
        } else {
            (upper.strip_prefix("HEADER.FIELDS")?, false)
        };
        let list = rest.trim().strip_prefix('(')?.strip_suffix(')')?;
        let fields: Vec<String> = list.split_whitespace().map(str::to_string).collect();
        if fields.is_empty() {
            return None;
        }
        Some(Self::HeaderFields { fields, not })
    }

    fn name(&self) -> String {
        match self {
            Self::Full => String::new(),
            Self::Header => "HEADER".to_string(),
            Self::Text => "TEXT".to_string(),
            Self::HeaderFields { fields, not } => format!(
                "HEADER.FIELDS{} ({})",
                if *not { ".NOT" } else { "" },
                fields.join(" ")
            ),
        }
    }

    fn extract(&self, message: &[u8]) -> Vec<u8> {
        let (header, text) = split_message(message);
        match self {
            Self::Full => message.to_vec(),
            Self::Header => header.to_vec(),
            Self::Text => text.to_vec(),
            Self::HeaderFields { fields, not } => filter_header(header, fields, *not),
        }
    }
}

/// Individual FETCH attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// Message flags.
    Flags,
    /// Internal date.
    InternalDate,
    /// RFC822 size.
    Rfc822Size,
    /// Envelope structure.
    Envelope,
    /// UID.
    Uid,
    /// RFC822 (full message, sets `\Seen`).
    Rfc822,
    /// RFC822.HEADER.
    Rfc822Header,
    /// RFC822.TEXT (sets `\Seen`).
    Rfc822Text,
    /// Body section.
    Body {
        /// Section specifier.
        section: Section,
        /// Peek (don't set \Seen).
        peek: bool,
        /// Partial fetch range as `(origin, count)`.
        partial: Option<(u32, u32)>,
    },
}

impl FetchAttribute {
    /// Parses one data item name. Macros are handled by [`parse_items`].
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_ascii_uppercase();
        let simple = match upper.as_str() {
            "FLAGS" => Some(Self::Flags),
            "INTERNALDATE" => Some(Self::InternalDate),
            "RFC822.SIZE" => Some(Self::Rfc822Size),
            "ENVELOPE" => Some(Self::Envelope),
            "UID" => Some(Self::Uid),
            "RFC822" => Some(Self::Rfc822),
            "RFC822.HEADER" => Some(Self::Rfc822Header),
            "RFC822.TEXT" => Some(Self::Rfc822Text),
            _ => None,
        };
        if simple.is_some() {
            return simple;
        }

        let (peek, prefix_len) = if upper.starts_with("BODY.PEEK[") {
            (true, "BODY.PEEK[".len())
        } else if upper.starts_with("BODY[") {
            (false, "BODY[".len())
        } else {
            return None;
        };
        let close = s.rfind(']')?;
        let section = Section::parse(s.get(prefix_len..close)?)?;
        let partial = match &s[close + 1..] {
            "" => None,
            spec => Some(parse_partial(spec)?),
        };
        Some(Self::Body {
            section,
            peek,
            partial,
        })
    }

    /// Returns true if building this item needs the message bytes.
    #[must_use]
    pub fn needs_content(&self) -> bool {
        matches!(
            self,
            Self::Rfc822 | Self::Rfc822Header | Self::Rfc822Text | Self::Body { .. }
        )
    }

    /// Returns true if fetching this item marks the message read.
    #[must_use]
    pub fn sets_seen(&self) -> bool {
        match self {
            Self::Rfc822 | Self::Rfc822Text => true,
            Self::Body { peek, .. } => !peek,
            _ => false,
        }
    }

    /// Builds the response value for one message.
    ///
    /// `content` must be present when [`needs_content`](Self::needs_content)
    /// is true; body items are skipped otherwise.
    #[must_use]
    pub fn value(
        &self,
        meta: &MessageMeta,
        flags: FlagSet,
        content: Option<&[u8]>,
    ) -> Option<FetchValue> {
        let value = match self {
            Self::Flags => {
                let mut list = flags.to_flags();
                if meta.recent {
                    list.push(crate::types::Flag::Recent);
                }
                FetchValue::Flags(list)
            }
            Self::Uid => FetchValue::Uid(meta.uid),
            Self::InternalDate => FetchValue::InternalDate(meta.internal_date),
            Self::Rfc822Size => FetchValue::Rfc822Size(meta.size),
            Self::Envelope => FetchValue::Envelope(Box::new(meta.envelope.clone())),
            Self::Rfc822 => section_value("RFC822".to_string(), content?.to_vec()),
            Self::Rfc822Header => {
                section_value("RFC822.HEADER".to_string(), Section::Header.extract(content?))
            }
            Self::Rfc822Text => {
                section_value("RFC822.TEXT".to_string(), Section::Text.extract(content?))
            }
            Self::Body {
                section, partial, ..
            } => {
                let data = section.extract(content?);
                let mut name = format!("BODY[{}]", section.name());
                let data = match partial {
                    Some((origin, count)) => {
                        name.push_str(&format!("<{origin}>"));
                        slice_partial(&data, *origin, *count)
                    }
                    None => data,
                };
                section_value(name, data)
            }
        };
        Some(value)
    }
}

fn section_value(name: String, data: Vec<u8>) -> FetchValue {
    FetchValue::Section { name, data }
}

/// Parses the client's item names, expanding the ALL, FAST and FULL macros.
///
/// # Errors
///
/// Returns the offending item name if it is not supported.
pub fn parse_items(items: &[String]) -> Result<Vec<FetchAttribute>, String> {
    if let [single] = items {
        match single.to_ascii_uppercase().as_str() {
            "FAST" => {
                return Ok(vec![
                    FetchAttribute::Flags,
                    FetchAttribute::InternalDate,
                    FetchAttribute::Rfc822Size,
                ]);
            }
            "ALL" | "FULL" => {
                return Ok(vec![
                    FetchAttribute::Flags,
                    FetchAttribute::InternalDate,
                    FetchAttribute::Rfc822Size,
                    FetchAttribute::Envelope,
                ]);
            }
            _ => {}
        }
    }
    items
        .iter()
        .map(|item| FetchAttribute::parse(item).ok_or_else(|| item.clone()))
        .collect()
}

fn parse_partial(spec: &str) -> Option<(u32, u32)> {
    let inner = spec.strip_prefix('<')?.strip_suffix('>')?;
    let (origin, count) = inner.split_once('.')?;
    Some((origin.parse().ok()?, count.parse().ok()?))
}

fn slice_partial(data: &[u8], origin: u32, count: u32) -> Vec<u8> {
    let start = (origin as usize).min(data.len());
    let end = start.saturating_add(count as usize).min(data.len());
    data[start..end].to_vec()
}

/// Splits a message into its header (blank line included) and body.
#[must_use]
pub fn split_message(message: &[u8]) -> (&[u8], &[u8]) {
    if let Some(pos) = message.windows(4).position(|w| w == b"\r\n\r\n") {
        return message.split_at(pos + 4);
    }
    if let Some(pos) = message.windows(2).position(|w| w == b"\n\n") {
        return message.split_at(pos + 2);
    }
    (message, &[])
}

/// Keeps (or drops, when `not`) the named header fields, folded lines
/// included, and terminates the result with a blank line.
fn filter_header(header: &[u8], fields: &[String], not: bool) -> Vec<u8> {
    let mut out = Vec::new();
    let mut keep = false;
    for line in header.split_inclusive(|&b| b == b'\n') {
        if line == b"\r\n" || line == b"\n" {
            break;
        }
        let continuation = line.first().is_some_and(|&b| b == b' ' || b == b'\t');
        if !continuation {
            let name = line
                .iter()
                .position(|&b| b == b':')
                .map(|colon| String::from_utf8_lossy(&line[..colon]).trim().to_ascii_uppercase());
            let listed = name.is_some_and(|n| fields.contains(&n));
            keep = listed != not;
        }
        if keep {
            out.extend_from_slice(line);
        }
    }
    out.extend_from_slice(b"\r\n");
    out
}
