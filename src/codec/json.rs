//! JSON implementation of the [`Codec`] trait.
//!
//! The wire form is a single object:
//!
//! ```json
//! {
//!   "sequence": [68, 71, 74],
//!   "metadata": {
//!     "type": "list", "seq_type": "range", "len": 3, "el_type": "int",
//!     "date_created": "01.01.2024 09:00", "date_modified": "02.01.2024 10:30",
//!     "author": "ListGenerator", "min": 68, "max": 74
//!   }
//! }
//! ```
//!
//! Mapping sequences serialize as a key→int object instead of an array.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    finish_record, malformed, now, AbsentReason, Codec, DecodeOutcome, ExchangeFormat, RawMetadata,
};
use crate::error::{SeqError, SeqResult};
use crate::record::{format_timestamp, EncodeParams, SequenceData, SequenceRecord};

/// Codec for the record-notation exchange format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[derive(Serialize, Deserialize)]
struct WireRecord {
    sequence: Option<WireSequence>,
    metadata: Option<WireMetadata>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireSequence {
    Items(Vec<i64>),
    Entries(BTreeMap<String, i64>),
}

#[derive(Serialize, Deserialize)]
struct WireMetadata {
    #[serde(rename = "type")]
    container: Option<String>,
    seq_type: Option<String>,
    len: Option<u64>,
    el_type: Option<String>,
    date_created: Option<String>,
    date_modified: Option<String>,
    author: Option<String>,
    min: Option<i64>,
    max: Option<i64>,
}

impl WireRecord {
    fn from_record(record: &SequenceRecord) -> Self {
        let sequence = match &record.sequence {
            SequenceData::Items(v) => WireSequence::Items(v.clone()),
            SequenceData::Entries(m) => WireSequence::Entries(m.clone()),
        };
        let meta = &record.metadata;
        Self {
            sequence: Some(sequence),
            metadata: Some(WireMetadata {
                container: Some(meta.container.as_str().to_string()),
                seq_type: Some(meta.seq_kind.as_str().to_string()),
                len: Some(meta.len as u64),
                el_type: Some(meta.el_type.clone()),
                date_created: Some(format_timestamp(meta.date_created)),
                date_modified: Some(format_timestamp(meta.date_modified)),
                author: Some(meta.author.clone()),
                min: Some(meta.min),
                max: Some(meta.max),
            }),
        }
    }
}

impl Codec for JsonCodec {
    fn format(&self) -> ExchangeFormat {
        ExchangeFormat::Json
    }

    fn encode(&self, params: &EncodeParams<'_>) -> SeqResult<Vec<u8>> {
        let record = params.assemble(now())?;
        serde_json::to_vec(&WireRecord::from_record(&record)).map_err(|e| SeqError::Encode {
            reason: e.to_string(),
        })
    }

    fn decode(&self, bytes: &[u8]) -> DecodeOutcome {
        if bytes.is_empty() {
            return DecodeOutcome::Absent(AbsentReason::Empty);
        }

        let wire: WireRecord = match serde_json::from_slice(bytes) {
            Ok(wire) => wire,
            Err(e) => return malformed(ExchangeFormat::Json, e),
        };

        let Some(sequence) = wire.sequence else {
            return DecodeOutcome::Absent(AbsentReason::MissingField("sequence"));
        };
        let sequence = match sequence {
            WireSequence::Items(v) => SequenceData::Items(v),
            WireSequence::Entries(m) => SequenceData::Entries(m),
        };

        let Some(meta) = wire.metadata else {
            return DecodeOutcome::Absent(AbsentReason::MissingField("metadata"));
        };
        let raw = RawMetadata {
            container: meta.container,
            seq_kind: meta.seq_type,
            len: meta.len,
            el_type: meta.el_type,
            date_created: meta.date_created,
            date_modified: meta.date_modified,
            author: meta.author,
            min: meta.min,
            max: meta.max,
        };

        match finish_record(sequence, raw) {
            Ok(record) => DecodeOutcome::Present(record),
            Err(reason) => DecodeOutcome::Absent(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{parse_timestamp, ContainerKind, SeqKind};

    fn params<'a>(sequence: &'a SequenceData) -> EncodeParams<'a> {
        EncodeParams {
            sequence,
            container: ContainerKind::List,
            seq_kind: SeqKind::Range,
            created: parse_timestamp("01.01.2024 09:00").unwrap(),
            author: "ListGenerator",
            min: 68,
            max: 119,
        }
    }

    #[test]
    fn test_encode_decode_roundtrip_items() {
        let sequence = SequenceData::Items((68..121).step_by(3).collect());
        let bytes = JsonCodec.encode(&params(&sequence)).unwrap();

        let record = JsonCodec.decode(&bytes).into_record().unwrap();
        assert_eq!(record.sequence, sequence);
        assert_eq!(record.metadata.container, ContainerKind::List);
        assert_eq!(record.metadata.seq_kind, SeqKind::Range);
        assert_eq!(record.metadata.len, 18);
        assert_eq!(record.metadata.min, 68);
        assert_eq!(record.metadata.max, 119);
        assert_eq!(
            record.metadata.date_created,
            parse_timestamp("01.01.2024 09:00").unwrap()
        );
    }

    #[test]
    fn test_encode_decode_roundtrip_entries() {
        let sequence = SequenceData::Entries(
            (0..5).map(|i| (i.to_string(), i)).collect(),
        );
        let mut p = params(&sequence);
        p.container = ContainerKind::Dict;
        p.min = 0;
        p.max = 4;

        let bytes = JsonCodec.encode(&p).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        // Entries must be emitted as a keyed object, not an array.
        assert!(text.contains("\"3\":3"));

        let record = JsonCodec.decode(&bytes).into_record().unwrap();
        assert_eq!(record.sequence, sequence);
        assert_eq!(record.metadata.container, ContainerKind::Dict);
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(matches!(
            JsonCodec.decode(b""),
            DecodeOutcome::Absent(AbsentReason::Empty)
        ));
    }

    #[test]
    fn test_decode_malformed_input() {
        let outcome = JsonCodec.decode(b"{\"sequence\": [1, 2");
        assert!(matches!(
            outcome,
            DecodeOutcome::Absent(AbsentReason::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_missing_metadata_field() {
        let bytes = br#"{
            "sequence": [1, 2, 3],
            "metadata": {
                "type": "list", "seq_type": "range", "len": 3,
                "el_type": "int", "date_created": "01.01.2024 09:00",
                "date_modified": "01.01.2024 09:00", "min": 1, "max": 3
            }
        }"#;
        assert!(matches!(
            JsonCodec.decode(bytes),
            DecodeOutcome::Absent(AbsentReason::MissingField("author"))
        ));
    }

    #[test]
    fn test_decode_missing_sequence() {
        let bytes = br#"{"metadata": {"type": "list"}}"#;
        assert!(matches!(
            JsonCodec.decode(bytes),
            DecodeOutcome::Absent(AbsentReason::MissingField("sequence"))
        ));
    }

    #[test]
    fn test_decode_rederives_len() {
        let bytes = br#"{
            "sequence": [1, 2, 3],
            "metadata": {
                "type": "list", "seq_type": "range", "len": 40,
                "el_type": "int", "date_created": "01.01.2024 09:00",
                "date_modified": "01.01.2024 09:00", "author": "x",
                "min": 1, "max": 3
            }
        }"#;
        let record = JsonCodec.decode(bytes).into_record().unwrap();
        assert_eq!(record.metadata.len, 3);
    }

    #[test]
    fn test_encode_refuses_unordered_fibonacci() {
        let sequence = SequenceData::Items(vec![2, 3, 5]);
        let mut p = params(&sequence);
        p.container = ContainerKind::Set;
        p.seq_kind = SeqKind::Fibonacci;
        assert!(matches!(
            JsonCodec.encode(&p),
            Err(SeqError::FibonacciUnordered)
        ));
    }
}
