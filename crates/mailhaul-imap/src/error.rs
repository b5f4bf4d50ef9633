//! Error types for the IMAP session engine.

use thiserror::Error;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations, including the stream closing
    /// while a response line was still required.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Unexpected or non-OK server response. Carries the offending line
    /// (or its detail suffix) verbatim.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Flag token passed to STORE that does not start with a backslash.
    /// Raised before any bytes are written to the transport.
    #[error("Invalid flag: {0}")]
    InvalidFlag(String),

    /// AUTHENTICATE mechanism this client does not implement.
    #[error("Unsupported authentication mechanism: {0}")]
    UnsupportedMechanism(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
