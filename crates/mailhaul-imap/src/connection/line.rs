//! Line-framed reading for IMAP responses.
//!
//! The server side of the protocol is consumed one LF-terminated line at a
//! time. Lines keep their terminator: the fetch drain loop concatenates them
//! verbatim, so the framing layer must not touch body whitespace.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Buffered reader producing one logical response line per call.
pub struct LineReader<R> {
    reader: BufReader<R>,
}

impl<R> LineReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Creates a new line reader over the read side of a stream.
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, inner),
        }
    }

    /// Reads one line, including its `\n` terminator.
    ///
    /// End-of-stream with nothing accumulated is a transport-closed error,
    /// never an empty line. End-of-stream mid-line returns the partial line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on read failure or clean closure.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        let n = self.reader.read_until(b'\n', &mut buf).await?;
        if n == 0 {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed",
            )));
        }

        let line = String::from_utf8_lossy(&buf).into_owned();
        tracing::trace!(target: "mailhaul_imap::wire", "<< {}", line.trim_end());
        Ok(line)
    }
}
