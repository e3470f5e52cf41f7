//! The round-trip law across the two exchange formats.
//!
//! Any record produced by one codec, re-encoded by the other, must decode
//! to an identical record - same sequence contents, same metadata values,
//! modulo the refreshed `date_modified`.

use std::collections::BTreeMap;

use seqcache::record::parse_timestamp;
use seqcache::{
    AbsentReason, Codec, ContainerKind, DecodeOutcome, EncodeParams, JsonCodec, SeqKind,
    SequenceData, SequenceRecord, XmlCodec,
};

fn params<'a>(
    sequence: &'a SequenceData,
    container: ContainerKind,
    seq_kind: SeqKind,
    min: i64,
    max: i64,
) -> EncodeParams<'a> {
    EncodeParams {
        sequence,
        container,
        seq_kind,
        created: parse_timestamp("15.03.2024 08:45").unwrap(),
        author: "ListGenerator",
        min,
        max,
    }
}

/// Asserts two records are identical apart from `date_modified`.
fn assert_equivalent(mut a: SequenceRecord, b: &SequenceRecord) {
    a.metadata.date_modified = b.metadata.date_modified;
    assert_eq!(&a, b);
}

fn cross_format_roundtrip(p: &EncodeParams<'_>) {
    let via_json = JsonCodec
        .decode(&JsonCodec.encode(p).unwrap())
        .into_record()
        .unwrap();
    let via_xml = XmlCodec
        .decode(&XmlCodec.encode(p).unwrap())
        .into_record()
        .unwrap();
    assert_equivalent(via_json, &via_xml);

    // Re-encode what one codec decoded through the other codec.
    let reencoded = XmlCodec
        .encode(&EncodeParams {
            sequence: &via_xml.sequence,
            container: via_xml.metadata.container,
            seq_kind: via_xml.metadata.seq_kind,
            created: via_xml.metadata.date_created,
            author: &via_xml.metadata.author,
            min: via_xml.metadata.min,
            max: via_xml.metadata.max,
        })
        .unwrap();
    let back = XmlCodec.decode(&reencoded).into_record().unwrap();
    assert_equivalent(back, &via_xml);
}

#[test]
fn test_roundtrip_list_range() {
    let sequence = SequenceData::Items((68..121).step_by(3).collect());
    cross_format_roundtrip(&params(
        &sequence,
        ContainerKind::List,
        SeqKind::Range,
        68,
        119,
    ));
}

#[test]
fn test_roundtrip_tuple_fibonacci() {
    let sequence = SequenceData::Items(vec![2, 3, 5, 8, 13]);
    cross_format_roundtrip(&params(
        &sequence,
        ContainerKind::Tuple,
        SeqKind::Fibonacci,
        2,
        13,
    ));
}

#[test]
fn test_roundtrip_negative_elements() {
    let sequence = SequenceData::Items(vec![-5, 3, -2, 1, -1]);
    cross_format_roundtrip(&params(
        &sequence,
        ContainerKind::List,
        SeqKind::Fibonacci,
        -5,
        3,
    ));
}

#[test]
fn test_roundtrip_dict() {
    let entries: BTreeMap<String, i64> = (0..12).map(|i| (i.to_string(), i)).collect();
    let sequence = SequenceData::Entries(entries);
    cross_format_roundtrip(&params(
        &sequence,
        ContainerKind::Dict,
        SeqKind::Range,
        0,
        11,
    ));
}

#[test]
fn test_roundtrip_empty_sequence() {
    let sequence = SequenceData::Items(Vec::new());
    cross_format_roundtrip(&params(
        &sequence,
        ContainerKind::List,
        SeqKind::Range,
        5,
        4,
    ));
}

#[test]
fn test_roundtrip_set_tag() {
    let sequence = SequenceData::Items(vec![10, 20, 30]);
    cross_format_roundtrip(&params(
        &sequence,
        ContainerKind::Set,
        SeqKind::Range,
        10,
        30,
    ));
}

#[test]
fn test_metadata_values_survive_both_wire_forms() {
    let sequence = SequenceData::Items(vec![1, 2, 3]);
    let p = params(&sequence, ContainerKind::List, SeqKind::Range, 1, 3);

    for codec in [&JsonCodec as &dyn Codec, &XmlCodec as &dyn Codec] {
        let record = codec.decode(&codec.encode(&p).unwrap()).into_record().unwrap();
        assert_eq!(record.metadata.container, ContainerKind::List);
        assert_eq!(record.metadata.seq_kind, SeqKind::Range);
        assert_eq!(record.metadata.len, 3);
        assert_eq!(record.metadata.el_type, "int");
        assert_eq!(record.metadata.author, "ListGenerator");
        assert_eq!(
            record.metadata.date_created,
            parse_timestamp("15.03.2024 08:45").unwrap()
        );
        assert_eq!(record.metadata.min, 1);
        assert_eq!(record.metadata.max, 3);
    }
}

#[test]
fn test_empty_and_corrupt_inputs_stay_distinguishable() {
    for codec in [&JsonCodec as &dyn Codec, &XmlCodec as &dyn Codec] {
        assert!(matches!(
            codec.decode(b""),
            DecodeOutcome::Absent(AbsentReason::Empty)
        ));
        // `<` starts neither valid JSON nor, with the mismatched close
        // tag, well-formed XML.
        assert!(matches!(
            codec.decode(b"<data><sequence></data>"),
            DecodeOutcome::Absent(AbsentReason::Malformed(_))
        ));
    }
}
