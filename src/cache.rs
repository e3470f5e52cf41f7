//! The equivalence check behind the satisfy-from-cache guarantee.
//!
//! Given a previously decoded record and the parameters a new generation
//! request would use, decide whether the stored sequence can be reused
//! verbatim. All conditions must hold; any mismatch forces regeneration.

use crate::record::{ContainerKind, SeqKind, SequenceRecord};

/// The freshly computed parameters of a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Requested generation method.
    pub seq_kind: SeqKind,
    /// Expected minimum element (range start or Fibonacci first term).
    pub min: i64,
    /// Expected maximum element (last emitted range value or maximum
    /// Fibonacci term).
    pub max: i64,
    /// Requested step; `0` for Fibonacci requests.
    pub step: i64,
}

/// Decides whether `record` can satisfy a request from a generator of the
/// given kind without regenerating.
///
/// The step a stored range implies is recomputed as
/// `(max − min) / (len − 1)` with integer division (`0` for a sequence of
/// at most one element). Integer division can under-detect a mismatch when
/// `max − min` is not evenly divisible by `len − 1`; such records cannot be
/// produced by this crate's own generators, and the behavior is kept
/// rather than tightened (see DESIGN.md).
#[must_use]
pub fn is_reusable(
    record: &SequenceRecord,
    kind: ContainerKind,
    request: &GenerationRequest,
) -> bool {
    let meta = &record.metadata;

    if !kind.accepts(meta.container) {
        return false;
    }
    if meta.seq_kind != request.seq_kind {
        return false;
    }
    if meta.min != request.min || meta.max != request.max {
        return false;
    }

    implied_step(record) == request.step
}

fn implied_step(record: &SequenceRecord) -> i64 {
    match record.metadata.seq_kind {
        SeqKind::Fibonacci => 0,
        SeqKind::Range => {
            // Length comes from the payload, not the stored `len` field.
            let len = record.sequence.len() as i64;
            if len <= 1 {
                0
            } else {
                (record.metadata.max - record.metadata.min) / (len - 1)
            }
        }
    }
}
