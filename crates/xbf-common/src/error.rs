//! Error types for xbf-common.

use thiserror::Error;

/// Common error type for binary reading and writing.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// String length does not fit the writable range.
    #[error("string of {0} UTF-16 code units is too long to encode")]
    StringTooLong(usize),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
