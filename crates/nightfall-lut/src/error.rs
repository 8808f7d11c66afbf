//! LUT error types.

use thiserror::Error;

/// Result type for LUT operations.
pub type LutResult<T> = Result<T, LutError>;

/// Errors that can occur while loading or applying a LUT.
#[derive(Debug, Error)]
pub enum LutError {
    /// The LUT text does not match the expected layout.
    #[error("malformed LUT at line {line}: {reason}")]
    MalformedLut {
        /// 0-based line index where parsing failed
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// Unknown file extension or format tag.
    #[error("unsupported LUT format: {0}")]
    UnsupportedFormat(String),

    /// Pixel buffer length is not a multiple of 4.
    #[error("invalid RGBA buffer: length {len} is not a multiple of 4")]
    InvalidBuffer {
        /// Length of the rejected buffer
        len: usize,
    },

    /// Lattice data violates a construction invariant.
    #[error("invalid LUT size: {0}")]
    InvalidSize(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LutError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedLut {
            line,
            reason: reason.into(),
        }
    }
}
