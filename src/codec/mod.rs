//! Exchange-format codecs.
//!
//! One codec per on-disk format, both behind the [`Codec`] trait and
//! selected through an enum-keyed lookup — the orchestrator never branches
//! on the format itself.
//!
//! Decoding is total: malformed bytes and schema violations never raise,
//! they produce [`DecodeOutcome::Absent`] with a structured reason, so
//! "empty file" and "corrupt file" stay distinguishable to callers that
//! care (the generate path treats every `Absent` as a cache miss; the read
//! path surfaces it as an error for non-empty files).

mod json;
mod xml;

pub use json::JsonCodec;
pub use xml::XmlCodec;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use tracing::warn;

use crate::error::{SeqError, SeqResult};
use crate::record::{
    parse_timestamp, ContainerKind, EncodeParams, Metadata, SeqKind, SequenceData, SequenceRecord,
};

/// The two supported serialization forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeFormat {
    /// Record-notation file (`data.json` by default).
    Json,
    /// Markup file (`data.xml` by default).
    Xml,
}

impl ExchangeFormat {
    /// The format's tag, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }

    /// The codec implementing this format.
    #[must_use]
    pub fn codec(self) -> &'static dyn Codec {
        match self {
            Self::Json => &JsonCodec,
            Self::Xml => &XmlCodec,
        }
    }

    /// The other format; its file is deleted whenever this one is written.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Json => Self::Xml,
            Self::Xml => Self::Json,
        }
    }
}

impl fmt::Display for ExchangeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeFormat {
    type Err = SeqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            _ => Err(SeqError::invalid_value(
                "Only json and xml data formats are acceptable.",
            )),
        }
    }
}

/// Why a decode produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsentReason {
    /// The input held no bytes at all.
    Empty,
    /// The bytes were not syntactically valid in the codec's format.
    Malformed(String),
    /// A required field was missing or empty.
    MissingField(&'static str),
    /// A field was present but its value could not be interpreted.
    InvalidField {
        /// The offending field.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

impl fmt::Display for AbsentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("file is empty"),
            Self::Malformed(msg) => write!(f, "malformed content: {msg}"),
            Self::MissingField(field) => {
                write!(f, "missing or empty field `{field}`")
            }
            Self::InvalidField { field, reason } => {
                write!(f, "invalid value in field `{field}`: {reason}")
            }
        }
    }
}

/// Result of decoding stored bytes.
#[derive(Debug)]
pub enum DecodeOutcome {
    /// A fully validated record.
    Present(SequenceRecord),
    /// No usable record; callers treat this exactly like an empty file.
    Absent(AbsentReason),
}

impl DecodeOutcome {
    /// True when a record was decoded.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// The record, if one was decoded.
    #[must_use]
    pub fn into_record(self) -> Option<SequenceRecord> {
        match self {
            Self::Present(record) => Some(record),
            Self::Absent(_) => None,
        }
    }
}

/// Converts between in-memory records and serialized bytes in one format.
pub trait Codec: Send + Sync {
    /// The format this codec implements.
    fn format(&self) -> ExchangeFormat;

    /// Builds a record from `params` with `date_modified` set to the
    /// current time and serializes it.
    ///
    /// # Errors
    ///
    /// Returns [`SeqError::Encode`] if serialization fails, or
    /// [`SeqError::FibonacciUnordered`] for an order-free container
    /// carrying a Fibonacci record (guarded earlier by the generator).
    fn encode(&self, params: &EncodeParams<'_>) -> SeqResult<Vec<u8>>;

    /// Parses serialized bytes back into a record, validating that every
    /// required metadata field is present and non-empty. Never fails:
    /// unusable input yields [`DecodeOutcome::Absent`].
    fn decode(&self, bytes: &[u8]) -> DecodeOutcome;
}

pub(crate) fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Logs a parse failure and downgrades it to an absent record.
pub(crate) fn malformed(format: ExchangeFormat, err: impl fmt::Display) -> DecodeOutcome {
    warn!(
        format = format.as_str(),
        error = %err,
        "failed to parse stored record, treating as absent"
    );
    DecodeOutcome::Absent(AbsentReason::Malformed(err.to_string()))
}

/// Raw metadata fields as they appear on the wire, before validation.
///
/// `len` is presence-checked only; the record's length is always
/// re-derived from the payload.
#[derive(Debug, Default)]
pub(crate) struct RawMetadata {
    pub container: Option<String>,
    pub seq_kind: Option<String>,
    pub len: Option<u64>,
    pub el_type: Option<String>,
    pub date_created: Option<String>,
    pub date_modified: Option<String>,
    pub author: Option<String>,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl RawMetadata {
    fn validate(self, derived_len: usize) -> Result<Metadata, AbsentReason> {
        let container = parse_tag::<ContainerKind>(self.container, "type")?;
        let seq_kind = parse_tag::<SeqKind>(self.seq_kind, "seq_type")?;
        let el_type = required(self.el_type, "el_type")?;
        let date_created = parse_date(self.date_created, "date_created")?;
        let date_modified = parse_date(self.date_modified, "date_modified")?;
        let author = required(self.author, "author")?;

        if self.len.is_none() {
            return Err(AbsentReason::MissingField("len"));
        }
        let min = self.min.ok_or(AbsentReason::MissingField("min"))?;
        let max = self.max.ok_or(AbsentReason::MissingField("max"))?;

        Ok(Metadata {
            container,
            seq_kind,
            len: derived_len,
            el_type,
            date_created,
            date_modified,
            author,
            min,
            max,
        })
    }
}

/// Validates raw metadata against the payload and assembles the record.
///
/// Shared tail of both decoders; also enforces that the payload shape
/// matches the declared container family (a `dict`-tagged record must hold
/// keyed entries, everything else positional items).
pub(crate) fn finish_record(
    sequence: SequenceData,
    raw: RawMetadata,
) -> Result<SequenceRecord, AbsentReason> {
    let metadata = raw.validate(sequence.len())?;

    let shape_matches = match metadata.container {
        ContainerKind::Dict => sequence.is_entries(),
        _ => sequence.is_items(),
    };
    if !shape_matches {
        return Err(AbsentReason::InvalidField {
            field: "sequence",
            reason: format!(
                "payload shape does not match declared container type `{}`",
                metadata.container
            ),
        });
    }

    Ok(SequenceRecord { sequence, metadata })
}

fn required(value: Option<String>, field: &'static str) -> Result<String, AbsentReason> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(AbsentReason::MissingField(field)),
    }
}

fn parse_tag<T: FromStr<Err = SeqError>>(
    value: Option<String>,
    field: &'static str,
) -> Result<T, AbsentReason> {
    let raw = required(value, field)?;
    raw.parse().map_err(|e: SeqError| AbsentReason::InvalidField {
        field,
        reason: e.to_string(),
    })
}

fn parse_date(
    value: Option<String>,
    field: &'static str,
) -> Result<NaiveDateTime, AbsentReason> {
    let raw = required(value, field)?;
    parse_timestamp(&raw).map_err(|e| AbsentReason::InvalidField {
        field,
        reason: e.to_string(),
    })
}
