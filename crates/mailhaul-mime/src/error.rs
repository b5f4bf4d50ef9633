//! Error types for message decoding.

use thiserror::Error;

/// Errors that can occur while decoding messages or header words.
#[derive(Debug, Error)]
pub enum Error {
    /// RFC 2047 sub-encoding other than `B` or `Q`.
    #[error("Unsupported encoded-word sub-encoding: {0}")]
    UnsupportedSubEncoding(String),

    /// Charset label with no known encoding.
    #[error("Unknown charset: {0}")]
    UnknownCharset(String),

    /// Malformed input that cannot be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid base64 in an attachment or encoded body.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
