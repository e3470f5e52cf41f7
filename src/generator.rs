//! Sequence generators: one engine, four container families.
//!
//! The families share all generation logic and differ only through the
//! [`ContainerKind`] capability descriptor — which stored type tags they
//! accept, whether they preserve order (and may therefore hold Fibonacci
//! series), and which native shape [`SequenceGenerator::get_sequence`]
//! coerces into.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::cache::GenerationRequest;
use crate::codec::{DecodeOutcome, ExchangeFormat};
use crate::error::{SeqError, SeqResult};
use crate::record::{ContainerKind, SeqKind, SequenceData};
use crate::series::{self, StepRange};
use crate::store::{SequenceStore, StoreConfig};

/// A stored sequence coerced into a generator's native shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sequence {
    /// Ordered elements.
    List(Vec<i64>),
    /// Ordered elements with position fixed exactly as stored.
    Tuple(Vec<i64>),
    /// Unique elements; duplicates from disk are collapsed.
    Set(BTreeSet<i64>),
    /// Key→value entries.
    Map(BTreeMap<String, i64>),
}

impl Sequence {
    /// Element count.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::List(v) | Self::Tuple(v) => v.len(),
            Self::Set(s) => s.len(),
            Self::Map(m) => m.len(),
        }
    }

    /// True when the sequence holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The container family this shape belongs to.
    #[must_use]
    pub const fn kind(&self) -> ContainerKind {
        match self {
            Self::List(_) => ContainerKind::List,
            Self::Tuple(_) => ContainerKind::Tuple,
            Self::Set(_) => ContainerKind::Set,
            Self::Map(_) => ContainerKind::Dict,
        }
    }

    /// The elements in a common ordered form, for cross-shape comparison.
    /// List and tuple keep their stored order; set and map iterate in
    /// ascending element/key order.
    #[must_use]
    pub fn to_ordered(&self) -> Vec<i64> {
        match self {
            Self::List(v) | Self::Tuple(v) => v.clone(),
            Self::Set(s) => s.iter().copied().collect(),
            Self::Map(m) => m.values().copied().collect(),
        }
    }
}

/// Generates sequences for one container family and persists them through
/// a [`SequenceStore`].
#[derive(Debug)]
pub struct SequenceGenerator {
    kind: ContainerKind,
    max_length: usize,
    store: SequenceStore,
}

impl fmt::Display for SequenceGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.kind {
            ContainerKind::List => "ListGenerator",
            ContainerKind::Tuple => "TupleGenerator",
            ContainerKind::Set => "SetGenerator",
            ContainerKind::Dict => "DictGenerator",
        };
        f.write_str(name)
    }
}

impl SequenceGenerator {
    /// Creates a generator for the given family.
    ///
    /// # Errors
    ///
    /// - [`SeqError::InvalidType`] if `max_length` is zero (the bound must
    ///   be a positive integer).
    /// - [`SeqError::InvalidValue`] if `config` fails validation.
    pub fn new(kind: ContainerKind, max_length: usize, config: StoreConfig) -> SeqResult<Self> {
        if max_length == 0 {
            return Err(SeqError::invalid_type(
                "maximum length must be a positive integer",
            ));
        }
        Ok(Self {
            kind,
            max_length,
            store: SequenceStore::new(config.validate()?),
        })
    }

    /// The container family this generator produces.
    #[must_use]
    pub const fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// The configured maximum element count (exclusive).
    #[must_use]
    pub const fn max_length(&self) -> usize {
        self.max_length
    }

    /// Generates a stepped range and persists it in the requested format,
    /// reusing the stored sequence when it is equivalent.
    ///
    /// `stop = None` means "from 0 up to `start`", mirroring a
    /// one-argument range.
    ///
    /// # Errors
    ///
    /// - [`SeqError::InvalidValue`] for a non-positive `step` or
    ///   `start > stop`.
    /// - [`SeqError::SequenceTooLong`] if the element count would reach
    ///   the configured maximum; the files are left untouched.
    /// - [`SeqError::Io`] / [`SeqError::Encode`] from the write path.
    pub fn generate_sequence(
        &self,
        format: ExchangeFormat,
        start: i64,
        stop: Option<i64>,
        step: i64,
    ) -> SeqResult<()> {
        let (start, stop) = match stop {
            Some(stop) => (start, stop),
            None => (0, start),
        };
        let range = StepRange::new(start, stop, step)?;
        self.check_length(range.len())?;

        let request = GenerationRequest {
            seq_kind: SeqKind::Range,
            min: start,
            max: series::max_in_range(start, stop, step),
            step,
        };
        let kind = self.kind;
        self.store.write(format, kind, &self.to_string(), &request, move || {
            Ok(materialize(kind, range))
        })
    }

    /// Generates `length` terms of the recurrence seeded with
    /// `first, second` and persists them in the requested format.
    ///
    /// # Errors
    ///
    /// - [`SeqError::FibonacciUnordered`] for set and mapping families,
    ///   raised before anything is computed or any file is touched.
    /// - [`SeqError::SequenceTooLong`] if `length` reaches the configured
    ///   maximum.
    /// - [`SeqError::InvalidValue`] for a zero `length` or a term
    ///   overflowing 64 bits.
    pub fn generate_fibonacci(
        &self,
        format: ExchangeFormat,
        first: i64,
        second: i64,
        length: usize,
    ) -> SeqResult<()> {
        if !self.kind.supports_ordered() {
            return Err(SeqError::FibonacciUnordered);
        }
        self.check_length(length)?;
        let max = series::fibonacci_max(first, second, length)?;

        let request = GenerationRequest {
            seq_kind: SeqKind::Fibonacci,
            min: first,
            max,
            step: 0,
        };
        self.store.write(format, self.kind, &self.to_string(), &request, || {
            series::fibonacci_terms(first, second, length).map(SequenceData::Items)
        })
    }

    /// Reads the currently persisted record, whichever format holds it,
    /// and returns the sequence in this generator's native shape. With no
    /// non-empty file present, returns the empty native shape.
    ///
    /// # Errors
    ///
    /// - [`SeqError::DecodedDataInvalid`] if the non-empty file does not
    ///   decode to a valid record.
    /// - [`SeqError::InvalidType`] if the stored container type is not
    ///   compatible with this family.
    /// - [`SeqError::SequenceTooLong`] if the stored element count reaches
    ///   the configured maximum.
    pub fn get_sequence(&self) -> SeqResult<Sequence> {
        let Some((format, bytes)) = self.store.read_active()? else {
            return Ok(self.empty());
        };

        let record = match format.codec().decode(&bytes) {
            DecodeOutcome::Present(record) => record,
            DecodeOutcome::Absent(reason) => {
                return Err(SeqError::decoded_data_invalid(reason.to_string()))
            }
        };

        if !self.kind.accepts(record.metadata.container) {
            return Err(SeqError::invalid_type("File contains invalid sequence type."));
        }
        self.check_length(record.sequence.len())?;

        self.coerce(record.sequence)
    }

    fn check_length(&self, len: usize) -> SeqResult<()> {
        if len < self.max_length {
            Ok(())
        } else {
            Err(SeqError::SequenceTooLong {
                max_length: self.max_length,
            })
        }
    }

    fn empty(&self) -> Sequence {
        match self.kind {
            ContainerKind::List => Sequence::List(Vec::new()),
            ContainerKind::Tuple => Sequence::Tuple(Vec::new()),
            ContainerKind::Set => Sequence::Set(BTreeSet::new()),
            ContainerKind::Dict => Sequence::Map(BTreeMap::new()),
        }
    }

    fn coerce(&self, data: SequenceData) -> SeqResult<Sequence> {
        match (self.kind, data) {
            (ContainerKind::List, SequenceData::Items(v)) => Ok(Sequence::List(v)),
            (ContainerKind::Tuple, SequenceData::Items(v)) => Ok(Sequence::Tuple(v)),
            // De-duplication is a safety net here: a set-typed record is
            // already unique unless the file was edited by hand.
            (ContainerKind::Set, SequenceData::Items(v)) => {
                Ok(Sequence::Set(v.into_iter().collect()))
            }
            (ContainerKind::Dict, SequenceData::Entries(m)) => Ok(Sequence::Map(m)),
            _ => Err(SeqError::invalid_type(
                "sequence shape does not match the declared container type",
            )),
        }
    }
}

fn materialize(kind: ContainerKind, range: StepRange) -> SequenceData {
    match kind {
        ContainerKind::Dict => {
            SequenceData::Entries(range.map(|i| (i.to_string(), i)).collect())
        }
        _ => SequenceData::Items(range.collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn generator(kind: ContainerKind, max_length: usize, dir: &std::path::Path) -> SequenceGenerator {
        SequenceGenerator::new(kind, max_length, StoreConfig::in_dir(dir)).unwrap()
    }

    #[test]
    fn test_new_rejects_zero_length_bound() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            SequenceGenerator::new(ContainerKind::List, 0, StoreConfig::in_dir(dir.path())),
            Err(SeqError::InvalidType { .. })
        ));
    }

    #[test]
    fn test_display_names() {
        let dir = tempdir().unwrap();
        assert_eq!(
            generator(ContainerKind::List, 100, dir.path()).to_string(),
            "ListGenerator"
        );
        assert_eq!(
            generator(ContainerKind::Dict, 100, dir.path()).to_string(),
            "DictGenerator"
        );
    }

    #[test]
    fn test_get_sequence_with_no_files_is_empty_native_shape() {
        let dir = tempdir().unwrap();
        assert_eq!(
            generator(ContainerKind::List, 100, dir.path()).get_sequence().unwrap(),
            Sequence::List(Vec::new())
        );
        assert_eq!(
            generator(ContainerKind::Set, 100, dir.path()).get_sequence().unwrap(),
            Sequence::Set(BTreeSet::new())
        );
        assert_eq!(
            generator(ContainerKind::Dict, 100, dir.path()).get_sequence().unwrap(),
            Sequence::Map(BTreeMap::new())
        );
    }

    #[test]
    fn test_fibonacci_rejected_for_unordered_families_without_side_effects() {
        let dir = tempdir().unwrap();
        for kind in [ContainerKind::Set, ContainerKind::Dict] {
            let gen = generator(kind, 100, dir.path());
            assert!(matches!(
                gen.generate_fibonacci(ExchangeFormat::Xml, 2, 5, 7),
                Err(SeqError::FibonacciUnordered)
            ));
        }
        // Nothing was created, and no stale-format cleanup ran.
        assert!(!dir.path().join("data.xml").exists());
        assert!(!dir.path().join("data.json").exists());
    }

    #[test]
    fn test_length_guard_runs_before_any_file_access() {
        let dir = tempdir().unwrap();
        let gen = generator(ContainerKind::List, 10, dir.path());
        assert!(matches!(
            gen.generate_sequence(ExchangeFormat::Json, 0, Some(50), 1),
            Err(SeqError::SequenceTooLong { max_length: 10 })
        ));
        assert!(!dir.path().join("data.json").exists());
    }

    #[test]
    fn test_one_argument_range_form() {
        let dir = tempdir().unwrap();
        let gen = generator(ContainerKind::List, 100, dir.path());
        gen.generate_sequence(ExchangeFormat::Json, 5, None, 1).unwrap();
        assert_eq!(
            gen.get_sequence().unwrap(),
            Sequence::List(vec![0, 1, 2, 3, 4])
        );
    }

    #[test]
    fn test_set_generation_deduplicates_nothing_but_changes_shape() {
        let dir = tempdir().unwrap();
        let gen = generator(ContainerKind::Set, 100, dir.path());
        gen.generate_sequence(ExchangeFormat::Json, 0, Some(5), 1).unwrap();
        assert_eq!(
            gen.get_sequence().unwrap(),
            Sequence::Set((0..5).collect())
        );
    }

    #[test]
    fn test_dict_generation_uses_decimal_keys() {
        let dir = tempdir().unwrap();
        let gen = generator(ContainerKind::Dict, 100, dir.path());
        gen.generate_sequence(ExchangeFormat::Xml, 3, None, 1).unwrap();
        let expected: BTreeMap<String, i64> =
            (0..3).map(|i| (i.to_string(), i)).collect();
        assert_eq!(gen.get_sequence().unwrap(), Sequence::Map(expected));
    }

    #[test]
    fn test_sequence_to_ordered() {
        assert_eq!(Sequence::Tuple(vec![3, 1, 2]).to_ordered(), vec![3, 1, 2]);
        assert_eq!(
            Sequence::Set([3, 1, 2].into_iter().collect()).to_ordered(),
            vec![1, 2, 3]
        );
    }
}
