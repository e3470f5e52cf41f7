//! Persistence orchestration for sequence records.
//!
//! One store manages the pair of exchange-format files, of which at most
//! one is non-empty at any time. Every generate call runs the same state
//! machine: drop the stale-format file, read what the target file holds,
//! ask the equivalence check whether it can be reused, regenerate on a
//! miss, then re-encode and overwrite. The target file is truncated only
//! once the new payload is fully encoded, so a failed call never leaves a
//! partial write behind.
//!
//! The files are not protected against concurrent external mutation:
//! single-process, single-caller access is assumed, and concurrent calls
//! would race the read-decode-check against the overwrite (a lost-update
//! hazard). Supporting that is an explicit non-goal.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::debug;

use crate::cache::{self, GenerationRequest};
use crate::codec::{now, ExchangeFormat};
use crate::error::{SeqError, SeqResult};
use crate::record::{ContainerKind, EncodeParams, SequenceData};

/// Explicit format→path configuration for a store.
///
/// Passed in at construction so tests (and embedders) can redirect both
/// files into temporary storage without touching process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Where the record-notation file lives.
    pub json_path: PathBuf,
    /// Where the markup file lives.
    pub xml_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            json_path: PathBuf::from("data.json"),
            xml_path: PathBuf::from("data.xml"),
        }
    }
}

impl StoreConfig {
    /// Default file names rooted in the given directory.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            json_path: dir.join("data.json"),
            xml_path: dir.join("data.xml"),
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SeqError::InvalidValue`] if either path is empty or both
    /// formats point at the same file.
    pub fn validate(self) -> SeqResult<Self> {
        if self.json_path.as_os_str().is_empty() || self.xml_path.as_os_str().is_empty() {
            return Err(SeqError::invalid_value(
                "both exchange-format file paths must be non-empty",
            ));
        }
        if self.json_path == self.xml_path {
            return Err(SeqError::invalid_value(
                "the two exchange formats must not share one file path",
            ));
        }
        Ok(self)
    }

    fn path_for(&self, format: ExchangeFormat) -> &Path {
        match format {
            ExchangeFormat::Json => &self.json_path,
            ExchangeFormat::Xml => &self.xml_path,
        }
    }
}

/// Owns the on-disk file pair and runs the generate/read state machine.
#[derive(Debug)]
pub struct SequenceStore {
    config: StoreConfig,
}

impl SequenceStore {
    /// Creates a store over the given (already validated) configuration.
    #[must_use]
    pub const fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Satisfies a generation request: reuses the stored sequence when the
    /// equivalence check allows it, otherwise calls `regenerate`, then
    /// rewrites the target file either way (refreshing `date_modified`).
    ///
    /// # Errors
    ///
    /// I/O failures, regeneration failures, and encode failures abort the
    /// call before the target file is truncated. Decode failures of the
    /// existing content do not: they are logged by the codec and handled
    /// as a cache miss.
    pub fn write(
        &self,
        format: ExchangeFormat,
        container: ContainerKind,
        author: &str,
        request: &GenerationRequest,
        regenerate: impl FnOnce() -> SeqResult<SequenceData>,
    ) -> SeqResult<()> {
        self.remove_stale(format)?;

        let path = self.config.path_for(format);
        let codec = format.codec();

        let fs_created = ensure_file(path)?;
        let bytes = fs::read(path)?;
        let prior = if bytes.is_empty() {
            None
        } else {
            codec.decode(&bytes).into_record()
        };

        // The record keeps its original creation time across rewrites;
        // the filesystem time only seeds the very first write.
        let created = prior
            .as_ref()
            .map(|record| record.metadata.date_created)
            .or(fs_created)
            .unwrap_or_else(now);

        let sequence = match prior {
            Some(record) if cache::is_reusable(&record, container, request) => {
                debug!(format = %format, "satisfying generation request from stored record");
                record.sequence
            }
            _ => {
                debug!(format = %format, "stored record not reusable, generating");
                regenerate()?
            }
        };

        let params = EncodeParams {
            sequence: &sequence,
            container,
            seq_kind: request.seq_kind,
            created,
            author,
            min: request.min,
            max: request.max,
        };
        let payload = codec.encode(&params)?;

        // Truncation happens only here, with the payload fully built.
        fs::write(path, payload)?;
        Ok(())
    }

    /// Finds the currently meaningful file: the first non-empty one,
    /// probing the markup file before the record-notation file.
    ///
    /// # Errors
    ///
    /// Only on I/O failures other than the file not existing.
    pub fn read_active(&self) -> SeqResult<Option<(ExchangeFormat, Vec<u8>)>> {
        for format in [ExchangeFormat::Xml, ExchangeFormat::Json] {
            match fs::read(self.config.path_for(format)) {
                Ok(bytes) if !bytes.is_empty() => return Ok(Some((format, bytes))),
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }

    fn remove_stale(&self, format: ExchangeFormat) -> SeqResult<()> {
        match fs::remove_file(self.config.path_for(format.other())) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Opens the file create-if-absent (without truncating) and reports its
/// filesystem creation time where the platform records one.
fn ensure_file(path: &Path) -> SeqResult<Option<NaiveDateTime>> {
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let created = file
        .metadata()?
        .created()
        .ok()
        .map(|t| chrono::DateTime::<chrono::Local>::from(t).naive_local());
    Ok(created)
}
