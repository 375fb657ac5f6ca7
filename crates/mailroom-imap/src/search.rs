//! SEARCH evaluation.
//!
//! A bare operand the grammar did not recognise arrives as
//! [`SearchCriteria::Bare`]. If it reads as a sequence set it selects
//! messages by sequence number; otherwise it is a case-insensitive
//! substring match over the whole message, like `TEXT`.

use crate::backend::MessageMeta;
use crate::command::SearchCriteria;
use crate::fetch::split_message;
use crate::response::Address;
use crate::types::SequenceSet;

/// One message as seen by the evaluator.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Sequence number.
    pub seq: u32,
    /// Metadata, including flags and envelope.
    pub meta: &'a MessageMeta,
    /// Raw message, present when [`needs_content`] said so.
    pub content: Option<&'a [u8]>,
}

/// Bounds used to resolve `*`.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    /// Number of messages in the mailbox.
    pub max_seq: u32,
    /// Highest UID in the mailbox.
    pub max_uid: u32,
}

/// Returns true if evaluating any of `criteria` reads the message bytes.
#[must_use]
pub fn needs_content(criteria: &[SearchCriteria]) -> bool {
    criteria.iter().any(reads_content)
}

fn reads_content(criteria: &SearchCriteria) -> bool {
    match criteria {
        SearchCriteria::Body(_) | SearchCriteria::Text(_) => true,
        SearchCriteria::Bare(raw) => SequenceSet::parse(raw).is_none(),
        SearchCriteria::And(inner) => needs_content(inner),
        SearchCriteria::Not(inner) => reads_content(inner),
        SearchCriteria::Or(a, b) => reads_content(a) || reads_content(b),
        _ => false,
    }
}

/// Returns true if the candidate matches every criterion.
#[must_use]
pub fn matches_all(criteria: &[SearchCriteria], candidate: &Candidate<'_>, bounds: Bounds) -> bool {
    criteria.iter().all(|c| matches(c, candidate, bounds))
}

/// Returns true if the candidate matches one criterion.
#[must_use]
pub fn matches(criteria: &SearchCriteria, candidate: &Candidate<'_>, bounds: Bounds) -> bool {
    let meta = candidate.meta;
    let flags = meta.flags;
    match criteria {
        SearchCriteria::All => true,
        SearchCriteria::Answered => flags.answered,
        SearchCriteria::Deleted => flags.deleted,
        SearchCriteria::Draft => flags.draft,
        SearchCriteria::Flagged => flags.saved,
        SearchCriteria::Seen => flags.read,
        SearchCriteria::New => meta.recent && !flags.read,
        SearchCriteria::Unanswered => !flags.answered,
        SearchCriteria::Undeleted => !flags.deleted,
        SearchCriteria::Undraft => !flags.draft,
        SearchCriteria::Unflagged => !flags.saved,
        SearchCriteria::Unseen => !flags.read,
        SearchCriteria::Uid(set) => set.contains(meta.uid, bounds.max_uid),
        SearchCriteria::Subject(text) => meta
            .envelope
            .subject
            .as_deref()
            .is_some_and(|s| contains(s.as_bytes(), text)),
        SearchCriteria::From(text) => addresses_contain(&meta.envelope.from, text),
        SearchCriteria::To(text) => addresses_contain(&meta.envelope.to, text),
        SearchCriteria::Cc(text) => addresses_contain(&meta.envelope.cc, text),
        SearchCriteria::Body(text) => candidate
            .content
            .is_some_and(|c| contains(split_message(c).1, text)),
        SearchCriteria::Text(text) => candidate.content.is_some_and(|c| contains(c, text)),
        SearchCriteria::Bare(raw) => match SequenceSet::parse(raw) {
            Some(set) => set.contains(candidate.seq, bounds.max_seq),
            None => candidate.content.is_some_and(|c| contains(c, raw)),
        },
        SearchCriteria::Larger(n) => meta.size > *n,
        SearchCriteria::Smaller(n) => meta.size < *n,
        SearchCriteria::And(inner) => matches_all(inner, candidate, bounds),
        SearchCriteria::Or(a, b) => matches(a, candidate, bounds) || matches(b, candidate, bounds),
        SearchCriteria::Not(inner) => !matches(inner, candidate, bounds),
    }
}

fn addresses_contain(list: &[Address], needle: &str) -> bool {
    list.iter().any(|a| {
        a.name.as_deref().is_some_and(|n| contains(n.as_bytes(), needle))
            || a.email().is_some_and(|e| contains(e.as_bytes(), needle))
    })
}

/// Case-insensitive substring test.
fn contains(haystack: &[u8], needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let haystack = String::from_utf8_lossy(haystack).to_lowercase();
    haystack.contains(&needle.to_lowercase())
}
