//! # mailhaul-mime
//!
//! Decoder for raw RFC 2822 / MIME messages as fetched over IMAP.
//!
//! ## Features
//!
//! - **Header parsing**: RFC 2822 unfolding, order and duplicates preserved
//! - **Multipart bodies**: recursive boundary walking with plain/HTML body
//!   extraction and eagerly decoded attachments
//! - **Encoded words**: RFC 2047 B and Q decoding with `encoding_rs`
//!   charset resolution
//! - **Extensible parts**: a [`PartHandler`] hook for claiming part types
//!   the built-in decoder does not know
//!
//! ## Quick Start
//!
//! ```
//! use mailhaul_mime::Message;
//!
//! let raw = "From: sender@example.com\r\n\
//!            Subject: Hi\r\n\
//!            \r\n\
//!            Hello";
//!
//! let message = Message::parse(raw)?;
//! assert_eq!(message.subject, "Hi");
//! assert_eq!(message.body(), "Hello");
//! # Ok::<(), mailhaul_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod encoded_word;
mod error;
mod header;
mod message;

pub use encoded_word::decode_encoded_words;
pub use error::{Error, Result};
pub use header::{Header, Headers};
pub use message::{Attachment, Message, PartHandler};
