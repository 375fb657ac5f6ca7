//! Sequence sets for message ranges.
//!
//! A set is kept exactly as the client wrote it: items stay in order and
//! duplicates are not removed. `*` is resolved only when the set is
//! evaluated against a mailbox.

use std::num::NonZeroU32;

/// One end of a sequence range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeqBound {
    /// A concrete 1-based message number or UID.
    Value(NonZeroU32),
    /// `*`, the largest id in use at evaluation time.
    Largest,
}

impl SeqBound {
    /// Resolves the bound against the largest known id.
    #[must_use]
    pub fn resolve(self, largest: u32) -> u32 {
        match self {
            Self::Value(n) => n.get(),
            Self::Largest => largest,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        if s == "*" {
            return Some(Self::Largest);
        }
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse::<u32>().ok().and_then(NonZeroU32::new).map(Self::Value)
    }
}

impl std::fmt::Display for SeqBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(n) => write!(f, "{n}"),
            Self::Largest => f.write_str("*"),
        }
    }
}

/// An inclusive range; singletons have `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeqRange {
    /// First id as written.
    pub start: SeqBound,
    /// Last id as written.
    pub end: SeqBound,
}

impl SeqRange {
    /// A single id.
    #[must_use]
    pub const fn single(bound: SeqBound) -> Self {
        Self {
            start: bound,
            end: bound,
        }
    }

    /// Returns the range as `(low, high)` once `*` is resolved.
    ///
    /// `5:2` and `2:5` are the same range.
    #[must_use]
    pub fn bounds(&self, largest: u32) -> (u32, u32) {
        let a = self.start.resolve(largest);
        let b = self.end.resolve(largest);
        (a.min(b), a.max(b))
    }
}

impl std::fmt::Display for SeqRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

/// Sequence set for specifying message ranges.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceSet {
    ranges: Vec<SeqRange>,
}

impl SequenceSet {
    /// Parses a sequence-set operand such as `1:15` or `1,577,5084,9591`.
    ///
    /// Returns `None` for an empty set, a zero id, or anything that is not
    /// a number, `*` or a `:`-joined pair of those.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let mut ranges = Vec::new();
        for item in s.split(',') {
            let range = match item.split_once(':') {
                Some((start, end)) => SeqRange {
                    start: SeqBound::parse(start)?,
                    end: SeqBound::parse(end)?,
                },
                None => SeqRange::single(SeqBound::parse(item)?),
            };
            ranges.push(range);
        }
        Some(Self { ranges })
    }

    /// Creates a set holding one id.
    #[must_use]
    pub fn single(n: u32) -> Option<Self> {
        let bound = SeqBound::Value(NonZeroU32::new(n)?);
        Some(Self {
            ranges: vec![SeqRange::single(bound)],
        })
    }

    /// Creates a set holding one `start:end` range.
    #[must_use]
    pub fn range(start: u32, end: u32) -> Option<Self> {
        Some(Self {
            ranges: vec![SeqRange {
                start: SeqBound::Value(NonZeroU32::new(start)?),
                end: SeqBound::Value(NonZeroU32::new(end)?),
            }],
        })
    }

    /// Creates `1:*`.
    #[must_use]
    pub fn all() -> Self {
        Self {
            ranges: vec![SeqRange {
                start: SeqBound::Value(NonZeroU32::MIN),
                end: SeqBound::Largest,
            }],
        }
    }

    /// The ranges in the order they were written.
    #[must_use]
    pub fn ranges(&self) -> &[SeqRange] {
        &self.ranges
    }

    /// Returns true if `id` is in the set once `*` means `largest`.
    #[must_use]
    pub fn contains(&self, id: u32, largest: u32) -> bool {
        self.ranges.iter().any(|r| {
            let (low, high) = r.bounds(largest);
            (low..=high).contains(&id)
        })
    }
}

impl std::fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let items: Vec<_> = self.ranges.iter().map(ToString::to_string).collect();
        write!(f, "{}", items.join(","))
    }
}

impl std::str::FromStr for SequenceSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid sequence set: {s}"))
    }
}
