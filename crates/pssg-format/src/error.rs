//! Error types for PSSG decoding and encoding.

use thiserror::Error;

/// Errors that can occur when reading or writing PSSG files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] pssg_common::Error),

    /// The GZip envelope around the file is corrupt.
    #[error("corrupt compressed envelope: {0}")]
    Envelope(#[source] std::io::Error),

    /// Invalid magic bytes (not a PSSG file).
    #[error("invalid PSSG magic: expected 'PSSG', got {actual:?}")]
    InvalidMagic { actual: Vec<u8> },

    /// A declared size reaches past the bytes that enclose it.
    #[error("truncated {context}: needed {needed} bytes but only {available} available")]
    Truncated {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    /// The tree nests deeper than the configured limit.
    #[error("node nesting exceeds depth limit of {limit}")]
    DepthLimit { limit: usize },

    /// A node name has no id in the schema used for encoding.
    #[error("node '{name}' is not present in the schema")]
    UnknownNode { name: String },

    /// An attribute name has no id for its node type in the schema used for encoding.
    #[error("attribute '{attribute}' is not present in the schema for node '{node}'")]
    UnknownAttribute { node: String, attribute: String },

    /// A computed size does not fit the 32-bit fields of the format.
    #[error("{context} exceeds the 4 GiB limit of the format")]
    TooLarge { context: &'static str },

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// XML writing error.
    #[error("XML error: {0}")]
    Xml(String),
}

/// Result type for PSSG operations.
pub type Result<T> = std::result::Result<T, Error>;
