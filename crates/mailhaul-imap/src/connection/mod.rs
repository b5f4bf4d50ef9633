//! Transport plumbing: stream types and line framing.

mod line;
mod stream;

pub use line::LineReader;
pub use stream::{ImapStream, connect_plain, connect_tls};
