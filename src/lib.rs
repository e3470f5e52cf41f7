//! # seqcache - cached numeric sequence persistence
//!
//! seqcache generates numeric sequences (stepped ranges or Fibonacci
//! series) in one of four container families and persists them to a
//! single on-disk file in one of two exchange formats, together with
//! metadata describing how the sequence was produced. A generation
//! request whose parameters match the stored metadata is satisfied from
//! the file instead of recomputing - the satisfy-from-cache guarantee.
//!
//! ## Core Concepts
//!
//! - **SequenceRecord**: a sequence payload plus the metadata the
//!   equivalence check compares on the next request
//! - **ContainerKind**: the capability descriptor distinguishing the
//!   list, tuple, set, and mapping families
//! - **ExchangeFormat**: JSON or XML; only one format's file is ever
//!   non-empty, writing one deletes the other
//! - **SequenceGenerator**: the per-family entry point for generating
//!   and reading sequences
//!
//! ## Usage
//!
//! ```rust,ignore
//! use seqcache::{ContainerKind, ExchangeFormat, SequenceGenerator, StoreConfig};
//!
//! let gen = SequenceGenerator::new(
//!     ContainerKind::List,
//!     100,
//!     StoreConfig::default(),
//! )?;
//!
//! // Writes [68, 71, ..., 119] and its metadata to data.json.
//! gen.generate_sequence(ExchangeFormat::Json, 68, Some(121), 3)?;
//!
//! // Same parameters: served from the file, not recomputed.
//! gen.generate_sequence(ExchangeFormat::Json, 68, Some(121), 3)?;
//!
//! let sequence = gen.get_sequence()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod codec;
pub mod error;
pub mod generator;
pub mod record;
pub mod series;
pub mod store;

// Re-export primary types at crate root for convenience
pub use cache::{is_reusable, GenerationRequest};
pub use codec::{
    AbsentReason, Codec, DecodeOutcome, ExchangeFormat, JsonCodec, XmlCodec,
};
pub use error::{SeqError, SeqResult};
pub use generator::{Sequence, SequenceGenerator};
pub use record::{
    ContainerKind, EncodeParams, Metadata, SeqKind, SequenceData, SequenceRecord,
};
pub use series::StepRange;
pub use store::{SequenceStore, StoreConfig};
