//! The persisted data model: sequence payloads plus their metadata.
//!
//! A [`SequenceRecord`] is the unit written to disk. Its metadata declares
//! the container family the sequence was generated for, the generation
//! method, and the parameters the equivalence check compares on the next
//! generation request.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::error::{SeqError, SeqResult};

/// Wire format for both timestamps: `DD.MM.YYYY HH:MM`.
pub const TIME_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Formats a timestamp in the exchange wire format.
#[must_use]
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIME_FORMAT).to_string()
}

/// Parses a timestamp from the exchange wire format.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, TIME_FORMAT)
}

/// The container family a sequence is generated for.
///
/// Tuple and set are distinguished from list only in memory, at the
/// generator level; on disk all three are list-shaped. The capability
/// methods below are the whole behavioral difference between families —
/// there is one generation engine, not four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// Ordered list.
    List,
    /// Fixed tuple: list-shaped on disk, order fixed exactly as stored.
    Tuple,
    /// Unique set: order-free, de-duplicated on read.
    Set,
    /// Keyed mapping: string key equals the decimal form of the value.
    Dict,
}

impl ContainerKind {
    /// The tag written into record metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Set => "set",
            Self::Dict => "dict",
        }
    }

    /// Whether a record declared as `stored` can serve a request from a
    /// generator of this kind.
    ///
    /// List and tuple read anything list-shaped (`list`, `tuple`, `set`);
    /// set and dict only read their own tag.
    #[must_use]
    pub const fn accepts(self, stored: Self) -> bool {
        match self {
            Self::List | Self::Tuple => {
                matches!(stored, Self::List | Self::Tuple | Self::Set)
            }
            Self::Set => matches!(stored, Self::Set),
            Self::Dict => matches!(stored, Self::Dict),
        }
    }

    /// Whether this family preserves element order.
    ///
    /// Order-free families cannot faithfully round-trip a Fibonacci
    /// series, where position carries information.
    #[must_use]
    pub const fn supports_ordered(self) -> bool {
        matches!(self, Self::List | Self::Tuple)
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerKind {
    type Err = SeqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list" => Ok(Self::List),
            "tuple" => Ok(Self::Tuple),
            "set" => Ok(Self::Set),
            "dict" => Ok(Self::Dict),
            other => Err(SeqError::invalid_type(format!(
                "unknown container type tag `{other}`"
            ))),
        }
    }
}

/// The generation method recorded in metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeqKind {
    /// Arithmetic stepped range.
    Range,
    /// Two-term Fibonacci recurrence.
    Fibonacci,
}

impl SeqKind {
    /// The tag written into record metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Range => "range",
            Self::Fibonacci => "fibonacci",
        }
    }
}

impl fmt::Display for SeqKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeqKind {
    type Err = SeqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "range" => Ok(Self::Range),
            "fibonacci" => Ok(Self::Fibonacci),
            other => Err(SeqError::invalid_type(format!(
                "unknown sequence type tag `{other}`"
            ))),
        }
    }
}

/// The sequence payload of a record.
///
/// List, tuple, and set records are all stored as ordered items; mapping
/// records store explicit key→value entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceData {
    /// Positional integer elements.
    Items(Vec<i64>),
    /// Keyed entries; iteration order is by key.
    Entries(BTreeMap<String, i64>),
}

impl SequenceData {
    /// Element count.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Items(v) => v.len(),
            Self::Entries(m) => m.len(),
        }
    }

    /// True when the sequence holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn is_items(&self) -> bool {
        matches!(self, Self::Items(_))
    }

    pub const fn is_entries(&self) -> bool {
        matches!(self, Self::Entries(_))
    }

    /// The positional elements, if this is an item sequence.
    #[must_use]
    pub fn as_items(&self) -> Option<&[i64]> {
        match self {
            Self::Items(v) => Some(v),
            Self::Entries(_) => None,
        }
    }

    /// The keyed entries, if this is a mapping sequence.
    #[must_use]
    pub const fn as_entries(&self) -> Option<&BTreeMap<String, i64>> {
        match self {
            Self::Entries(m) => Some(m),
            Self::Items(_) => None,
        }
    }
}

/// Metadata describing how a stored sequence was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Declared container family.
    pub container: ContainerKind,
    /// Generation method.
    pub seq_kind: SeqKind,
    /// Element count; always re-derived from the payload, never trusted
    /// from disk.
    pub len: usize,
    /// Element type tag, always `"int"`. Reserved for future extension.
    pub el_type: String,
    /// Original creation timestamp, carried forward unchanged across
    /// regenerations of the same file.
    pub date_created: NaiveDateTime,
    /// Timestamp of the current write, refreshed on every encode.
    pub date_modified: NaiveDateTime,
    /// Opaque generator identity; provenance only, never compared.
    pub author: String,
    /// Range start, or the Fibonacci first term.
    pub min: i64,
    /// Last element actually emitted by the range, or the maximum
    /// Fibonacci term. Not the caller's exclusive `stop`.
    pub max: i64,
}

/// A sequence plus its metadata: the unit persisted to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    /// The sequence payload.
    pub sequence: SequenceData,
    /// How it was produced.
    pub metadata: Metadata,
}

/// Everything a codec needs to build and serialize a record.
///
/// `len` and `date_modified` are intentionally absent: the length is
/// derived from the payload at assembly time and the modification
/// timestamp is stamped by the encoder.
#[derive(Debug, Clone, Copy)]
pub struct EncodeParams<'a> {
    /// The sequence payload to persist.
    pub sequence: &'a SequenceData,
    /// Container family to declare.
    pub container: ContainerKind,
    /// Generation method to declare.
    pub seq_kind: SeqKind,
    /// Creation timestamp carried forward from the file's first write.
    pub created: NaiveDateTime,
    /// Generator identity string.
    pub author: &'a str,
    /// Minimum element parameter (see [`Metadata::min`]).
    pub min: i64,
    /// Maximum element parameter (see [`Metadata::max`]).
    pub max: i64,
}

impl EncodeParams<'_> {
    /// Builds the full record with `len` derived from the payload and the
    /// given modification timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`SeqError::FibonacciUnordered`] if asked to assemble a
    /// Fibonacci record for an order-free container family. The generator
    /// rejects this long before a codec runs; the check here keeps the
    /// invariant local to the type that owns it.
    pub fn assemble(&self, modified: NaiveDateTime) -> SeqResult<SequenceRecord> {
        if self.seq_kind == SeqKind::Fibonacci && !self.container.supports_ordered() {
            return Err(SeqError::FibonacciUnordered);
        }

        Ok(SequenceRecord {
            sequence: self.sequence.clone(),
            metadata: Metadata {
                container: self.container,
                seq_kind: self.seq_kind,
                len: self.sequence.len(),
                el_type: "int".to_string(),
                date_created: self.created,
                date_modified: modified,
                author: self.author.to_string(),
                min: self.min,
                max: self.max,
            },
        })
    }
}
