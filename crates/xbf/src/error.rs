//! Error types for XBF parsing and dumping.

use thiserror::Error;

use crate::tables::TableKind;

/// Errors that can occur when parsing or dumping XBF files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] xbf_common::Error),

    /// Invalid magic bytes (not an XBF file).
    #[error("invalid XBF header: expected magic 'XBF\\0', got {actual:?}")]
    InvalidHeader { actual: [u8; 4] },

    /// File version whose layout this reader does not implement.
    #[error("unsupported XBF version {major}.{minor} (only version 1 layouts are supported)")]
    UnsupportedVersion { major: u32, minor: u32 },

    /// A metadata table could not be read.
    #[error("failed to read {table} table: {source}")]
    TableRead {
        table: TableKind,
        #[source]
        source: xbf_common::Error,
    },

    /// The node stream violated the start/end nesting discipline or was otherwise unreadable.
    #[error("malformed node stream at offset {offset:#x}: {fault}")]
    MalformedNodeStream { offset: usize, fault: NodeStreamFault },

    /// A table reference pointed past the end of its table.
    #[error("{table} index {index} out of range (table size: {count})")]
    IndexOutOfRange {
        table: TableKind,
        index: u32,
        count: usize,
    },

    /// A section or table exceeds what a 32-bit count or size can describe.
    #[error("{section} too large to encode: {len}")]
    TooLarge { section: &'static str, len: usize },

    /// XML writing error.
    #[error("XML error: {0}")]
    Xml(String),
}

/// What went wrong inside the node stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeStreamFault {
    #[error("EndObject without a matching StartObject")]
    UnmatchedEndObject,

    #[error("EndProperty without a matching StartProperty")]
    UnmatchedEndProperty,

    #[error("unknown node tag {0:#04x}")]
    UnknownNodeTag(u8),

    #[error("unknown value tag {0:#04x}")]
    UnknownValueTag(u8),

    #[error("unknown grid length kind {0}")]
    UnknownGridLengthKind(u32),

    #[error("node truncated: needed {needed} bytes but only {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("{0}")]
    Read(String),

    #[error("{0} object(s) still open at end of stream")]
    UnclosedObjects(usize),

    #[error("{0} property(ies) still open at end of stream")]
    UnclosedProperties(usize),

    #[error("EndObject while a property started inside the object is still open")]
    MisnestedEndObject,

    #[error("EndProperty while an object started inside the property is still open")]
    MisnestedEndProperty,

    #[error("EndProperty with no owning object")]
    PropertyWithoutObject,

    #[error("stream contains no root object")]
    MissingRoot,

    #[error("second root object after the first one was closed")]
    MultipleRoots,

    #[error("objects nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

impl From<xbf_common::Error> for NodeStreamFault {
    fn from(err: xbf_common::Error) -> Self {
        match err {
            xbf_common::Error::UnexpectedEof { needed, available } => {
                Self::Truncated { needed, available }
            }
            other => Self::Read(other.to_string()),
        }
    }
}

/// Result type for XBF operations.
pub type Result<T> = std::result::Result<T, Error>;
