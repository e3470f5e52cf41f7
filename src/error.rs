//! Error types for seqcache.
//!
//! All errors are strongly typed using thiserror. This enables pattern
//! matching on specific error conditions and provides clear error messages.
//!
//! Decode *syntax* errors are deliberately not represented here: malformed
//! bytes on disk are downgraded to an absent record (see
//! [`crate::codec::AbsentReason`]) and never abort a generation call.

use thiserror::Error;

/// Top-level error type for seqcache operations.
#[derive(Debug, Error)]
pub enum SeqError {
    /// A container kind or length bound has the wrong kind of value.
    #[error("Invalid type: {reason}")]
    InvalidType {
        /// What was wrong.
        reason: String,
    },

    /// The requested or stored element count meets or exceeds the
    /// generator's configured maximum.
    #[error("Items quantity should be less than {max_length}.")]
    SequenceTooLong {
        /// The configured maximum length bound.
        max_length: usize,
    },

    /// An argument value is outside the accepted domain.
    #[error("Invalid value: {reason}")]
    InvalidValue {
        /// What was wrong.
        reason: String,
    },

    /// A Fibonacci sequence was requested for a container family that
    /// cannot preserve element order.
    #[error("Data structure may change elements order.")]
    FibonacciUnordered,

    /// A non-empty file failed schema validation on the read path.
    #[error("Invalid decoded data structure: {reason}")]
    DecodedDataInvalid {
        /// Why the stored record was rejected.
        reason: String,
    },

    /// Serialization of a fully validated record failed.
    #[error("Failed to encode record: {reason}")]
    Encode {
        /// The underlying serializer message.
        reason: String,
    },

    /// File open/read/write/remove failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SeqError {
    /// Creates an [`SeqError::InvalidType`] error.
    #[must_use]
    pub fn invalid_type(reason: impl Into<String>) -> Self {
        Self::InvalidType {
            reason: reason.into(),
        }
    }

    /// Creates an [`SeqError::InvalidValue`] error.
    #[must_use]
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }

    /// Creates an [`SeqError::DecodedDataInvalid`] error.
    #[must_use]
    pub fn decoded_data_invalid(reason: impl Into<String>) -> Self {
        Self::DecodedDataInvalid {
            reason: reason.into(),
        }
    }

    /// Returns true if this is a validation error (wrong type, value, or
    /// length) raised before any file was touched.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidType { .. }
                | Self::InvalidValue { .. }
                | Self::SequenceTooLong { .. }
                | Self::FibonacciUnordered
        )
    }

    /// Returns true if this error came from the read path rejecting a
    /// stored record.
    #[must_use]
    pub const fn is_decoded_data_invalid(&self) -> bool {
        matches!(self, Self::DecodedDataInvalid { .. })
    }
}

/// Result type alias for seqcache operations.
pub type SeqResult<T> = Result<T, SeqError>;
