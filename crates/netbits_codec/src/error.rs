//! # Codec Error Types
//!
//! All errors that can occur while encoding or decoding a bit stream.

use netbits_core::PoolError;
use thiserror::Error;

/// Errors that can occur in the codec.
#[derive(Error, Debug)]
pub enum CodecError {
    /// A write would need more room than a fixed buffer has.
    #[error("fixed buffer cannot grow: need {required} bytes, capacity {capacity}")]
    NotSupported {
        /// Bytes the operation needed.
        required: u64,
        /// Bytes the buffer holds.
        capacity: usize,
    },

    /// Growth would exceed the addressable limit.
    #[error("requested capacity of {requested} bytes exceeds the addressable limit")]
    CapacityOverflow {
        /// Bytes requested.
        requested: u64,
    },

    /// An argument or a declared count is outside its valid range.
    #[error("{what} out of range: {detail}")]
    OutOfRange {
        /// What was out of range.
        what: &'static str,
        /// Offending value and bound.
        detail: String,
    },

    /// A typed read needed more bits than remain in the logical length.
    #[error("end of data: requested {requested} bits, {available} available")]
    EndOfData {
        /// Bits requested.
        requested: u64,
        /// Bits left before the high-water mark.
        available: u64,
    },

    /// A packed value does not fit the requested type.
    #[error("packed value {value} does not fit in {target}")]
    Overflow {
        /// Name of the requested type.
        target: &'static str,
        /// Decoded value, before narrowing.
        value: i128,
    },

    /// A packed integer ran past ten bytes or above bit 63.
    #[error("malformed packed integer")]
    MalformedVarint,

    /// Decoded UTF-16 units do not form a valid string.
    #[error("invalid UTF-16 sequence")]
    InvalidUtf16,

    /// A character cannot be written in single-byte mode.
    #[error("character {0:?} cannot be encoded as a single byte")]
    Unrepresentable(char),

    /// A string diff does not line up with the baseline it is applied to.
    #[error("diff does not match baseline: {0}")]
    BaselineMismatch(&'static str),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Object pool misuse.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl CodecError {
    pub(crate) fn out_of_range(what: &'static str, detail: impl Into<String>) -> Self {
        Self::OutOfRange {
            what,
            detail: detail.into(),
        }
    }
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
