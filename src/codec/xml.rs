//! XML implementation of the [`Codec`] trait.
//!
//! The wire form is a `<data>` root holding a `<sequence>` of `<el>`
//! children and a `<metadata>` block of text-content fields:
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <data>
//!   <sequence><el>68</el><el>71</el></sequence>
//!   <metadata>
//!     <type>list</type><seq_type>range</seq_type><len>2</len>
//!     <el_type>int</el_type><date_created>01.01.2024 09:00</date_created>
//!     <date_modified>02.01.2024 10:30</date_modified>
//!     <author>ListGenerator</author><min>68</min><max>71</max>
//!   </metadata>
//! </data>
//! ```
//!
//! Mapping elements carry a `key` attribute: `<el key="68">68</el>`.
//! Whether the sequence is read back as items or keyed entries is decided
//! by the declared `type`, not by attribute presence.

use std::collections::BTreeMap;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::{
    finish_record, malformed, now, AbsentReason, Codec, DecodeOutcome, ExchangeFormat, RawMetadata,
};
use crate::error::{SeqError, SeqResult};
use crate::record::{format_timestamp, EncodeParams, SequenceData, SequenceRecord};

/// Codec for the markup exchange format.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlCodec;

impl Codec for XmlCodec {
    fn format(&self) -> ExchangeFormat {
        ExchangeFormat::Xml
    }

    fn encode(&self, params: &EncodeParams<'_>) -> SeqResult<Vec<u8>> {
        let record = params.assemble(now())?;
        write_document(&record).map_err(|e| SeqError::Encode {
            reason: e.to_string(),
        })
    }

    fn decode(&self, bytes: &[u8]) -> DecodeOutcome {
        if bytes.is_empty() {
            return DecodeOutcome::Absent(AbsentReason::Empty);
        }

        let parsed = match parse_document(bytes) {
            Ok(parsed) => parsed,
            Err(Abort::Syntax(e)) => return malformed(ExchangeFormat::Xml, e),
            Err(Abort::Schema(reason)) => return DecodeOutcome::Absent(reason),
        };

        if !parsed.seen_sequence {
            return DecodeOutcome::Absent(AbsentReason::MissingField("sequence"));
        }

        let declared_dict = parsed.raw.container.as_deref().map(str::trim) == Some("dict");
        let sequence = if declared_dict {
            let mut entries = BTreeMap::new();
            for (key, value) in parsed.els {
                let Some(key) = key else {
                    return DecodeOutcome::Absent(AbsentReason::InvalidField {
                        field: "el",
                        reason: "mapping element without a key attribute".to_string(),
                    });
                };
                entries.insert(key, value);
            }
            SequenceData::Entries(entries)
        } else {
            SequenceData::Items(parsed.els.into_iter().map(|(_, v)| v).collect())
        };

        match finish_record(sequence, parsed.raw) {
            Ok(record) => DecodeOutcome::Present(record),
            Err(reason) => DecodeOutcome::Absent(reason),
        }
    }
}

fn write_document(record: &SequenceRecord) -> Result<Vec<u8>, quick_xml::Error> {
    let mut writer = Writer::new(Vec::new());

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("data")))?;

    writer.write_event(Event::Start(BytesStart::new("sequence")))?;
    match &record.sequence {
        SequenceData::Items(items) => {
            for value in items {
                write_el(&mut writer, None, *value)?;
            }
        }
        SequenceData::Entries(entries) => {
            for (key, value) in entries {
                write_el(&mut writer, Some(key), *value)?;
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new("sequence")))?;

    let meta = &record.metadata;
    writer.write_event(Event::Start(BytesStart::new("metadata")))?;
    write_text_el(&mut writer, "type", meta.container.as_str())?;
    write_text_el(&mut writer, "seq_type", meta.seq_kind.as_str())?;
    write_text_el(&mut writer, "len", &meta.len.to_string())?;
    write_text_el(&mut writer, "el_type", &meta.el_type)?;
    write_text_el(&mut writer, "date_created", &format_timestamp(meta.date_created))?;
    write_text_el(&mut writer, "date_modified", &format_timestamp(meta.date_modified))?;
    write_text_el(&mut writer, "author", &meta.author)?;
    write_text_el(&mut writer, "min", &meta.min.to_string())?;
    write_text_el(&mut writer, "max", &meta.max.to_string())?;
    writer.write_event(Event::End(BytesEnd::new("metadata")))?;

    writer.write_event(Event::End(BytesEnd::new("data")))?;
    Ok(writer.into_inner())
}

fn write_el(
    writer: &mut Writer<Vec<u8>>,
    key: Option<&str>,
    value: i64,
) -> Result<(), quick_xml::Error> {
    let mut el = BytesStart::new("el");
    if let Some(key) = key {
        el.push_attribute(("key", key));
    }
    writer.write_event(Event::Start(el))?;
    writer.write_event(Event::Text(BytesText::new(&value.to_string())))?;
    writer.write_event(Event::End(BytesEnd::new("el")))
}

fn write_text_el(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))
}

enum Abort {
    Syntax(quick_xml::Error),
    Schema(AbsentReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Sequence,
    Metadata,
}

#[derive(Default)]
struct Parsed {
    seen_sequence: bool,
    els: Vec<(Option<String>, i64)>,
    raw: RawMetadata,
}

fn parse_document(bytes: &[u8]) -> Result<Parsed, Abort> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();

    let mut parsed = Parsed::default();
    let mut section = Section::None;
    let mut leaf: Option<Vec<u8>> = None;
    let mut text = String::new();
    let mut pending_key: Option<String> = None;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(Abort::Syntax)?;
        match event {
            Event::Start(ref e) => {
                open_element(e, &mut parsed, &mut section, &mut leaf, &mut text, &mut pending_key)?;
            }
            Event::Empty(ref e) => {
                // A self-closing element is an open immediately followed
                // by a close with no text content.
                open_element(e, &mut parsed, &mut section, &mut leaf, &mut text, &mut pending_key)?;
                let name = e.name().as_ref().to_vec();
                close_element(&name, &mut parsed, &mut section, &mut leaf, &mut text, &mut pending_key)?;
            }
            Event::Text(ref e) => {
                if leaf.is_some() {
                    let unescaped = e.unescape().map_err(Abort::Syntax)?;
                    text.push_str(unescaped.trim());
                }
            }
            Event::End(ref e) => {
                let name = e.name().as_ref().to_vec();
                close_element(&name, &mut parsed, &mut section, &mut leaf, &mut text, &mut pending_key)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(parsed)
}

fn open_element(
    el: &BytesStart<'_>,
    parsed: &mut Parsed,
    section: &mut Section,
    leaf: &mut Option<Vec<u8>>,
    text: &mut String,
    pending_key: &mut Option<String>,
) -> Result<(), Abort> {
    match el.name().as_ref() {
        b"sequence" => {
            *section = Section::Sequence;
            parsed.seen_sequence = true;
        }
        b"metadata" => {
            *section = Section::Metadata;
        }
        b"el" if *section == Section::Sequence => {
            *leaf = Some(b"el".to_vec());
            text.clear();
            *pending_key = key_attribute(el)?;
        }
        name if *section == Section::Metadata => {
            *leaf = Some(name.to_vec());
            text.clear();
        }
        _ => {}
    }
    Ok(())
}

fn close_element(
    name: &[u8],
    parsed: &mut Parsed,
    section: &mut Section,
    leaf: &mut Option<Vec<u8>>,
    text: &mut String,
    pending_key: &mut Option<String>,
) -> Result<(), Abort> {
    if leaf.as_deref() == Some(name) {
        commit_leaf(name, parsed, text, pending_key)?;
        *leaf = None;
        text.clear();
        return Ok(());
    }

    match name {
        b"sequence" | b"metadata" => *section = Section::None,
        _ => {}
    }
    Ok(())
}

fn commit_leaf(
    name: &[u8],
    parsed: &mut Parsed,
    text: &str,
    pending_key: &mut Option<String>,
) -> Result<(), Abort> {
    if name == b"el" {
        let value = parse_number(text, "el")?;
        parsed.els.push((pending_key.take(), value));
        return Ok(());
    }

    let raw = &mut parsed.raw;
    match name {
        b"type" => raw.container = Some(text.to_string()),
        b"seq_type" => raw.seq_kind = Some(text.to_string()),
        b"len" => raw.len = Some(parse_number(text, "len")? as u64),
        b"el_type" => raw.el_type = Some(text.to_string()),
        b"date_created" => raw.date_created = Some(text.to_string()),
        b"date_modified" => raw.date_modified = Some(text.to_string()),
        b"author" => raw.author = Some(text.to_string()),
        b"min" => raw.min = Some(parse_number(text, "min")?),
        b"max" => raw.max = Some(parse_number(text, "max")?),
        _ => {}
    }
    Ok(())
}

fn parse_number(text: &str, field: &'static str) -> Result<i64, Abort> {
    text.parse().map_err(|_| {
        Abort::Schema(AbsentReason::InvalidField {
            field,
            reason: format!("expected an integer, got `{text}`"),
        })
    })
}

fn key_attribute(el: &BytesStart<'_>) -> Result<Option<String>, Abort> {
    for attr in el.attributes() {
        let attr = attr.map_err(|e| Abort::Syntax(e.into()))?;
        if attr.key.as_ref() == b"key" {
            let value = attr
                .unescape_value()
                .map_err(Abort::Syntax)?
                .into_owned();
            return Ok(Some(value));
        }
    }
    Ok(None)
}
