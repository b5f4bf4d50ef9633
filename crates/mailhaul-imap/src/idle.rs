//! IDLE: server-push notification waits and their cancellation.
//!
//! An idle wait monopolizes the session's read side until the server sends
//! the terminating tagged line. Cancellation therefore cannot read; the
//! [`IdleCanceller`] only writes `done` through the shared write half and
//! lets the waiting loop consume the server's acknowledgement.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, WriteHalf};
use tokio::sync::Mutex;

use crate::response::TAG;
use crate::session::Session;
use crate::{Error, Result};

/// Something the server said while we were idling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdleEvent {
    /// A line mentioning `RECENT`: new mail (probably) arrived.
    ///
    /// The match is a substring check, so an EXPUNGE that changes the
    /// recent count also lands here. Callers wanting certainty should
    /// re-select and compare counts.
    NewMail(String),
    /// Any other non-continuation line received during the wait. The
    /// terminating tagged line is delivered here too, just before
    /// [`Session::idle`] returns it.
    Interrupted(String),
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Enters IDLE and blocks until the server terminates the wait,
    /// reporting each untagged line to `on_event` as it arrives.
    ///
    /// The wait ends when the server sends the tagged completion line,
    /// which it does after a canceller writes `done` (or on its own
    /// timeout). Returns that final line.
    ///
    /// # Errors
    ///
    /// Transport errors propagate as [`Error::Io`]; the idling flag is
    /// cleared before returning either way.
    pub async fn idle<F>(&mut self, mut on_event: F) -> Result<String>
    where
        F: FnMut(IdleEvent),
    {
        self.idling.store(true, Ordering::SeqCst);
        if let Err(e) = self.write_line(&format!("{TAG} idle")).await {
            self.idling.store(false, Ordering::SeqCst);
            return Err(e);
        }

        loop {
            let line = match self.reader.read_line().await {
                Ok(line) => line,
                Err(e) => {
                    self.idling.store(false, Ordering::SeqCst);
                    return Err(e);
                }
            };
            let trimmed = line.trim_end();

            // The continuation acknowledging IDLE entry carries no event.
            if trimmed.starts_with('+') {
                continue;
            }

            // The first real server line ends the cancellable window: a
            // `done` sent after it would race the terminating line.
            self.idling.store(false, Ordering::SeqCst);

            // Every non-continuation line is classified, the terminating
            // tagged line included.
            if trimmed.contains("RECENT") {
                on_event(IdleEvent::NewMail(trimmed.to_string()));
            } else {
                on_event(IdleEvent::Interrupted(trimmed.to_string()));
            }

            if trimmed.starts_with(TAG) {
                return Ok(trimmed.to_string());
            }
        }
    }

    /// Hands out a canceller bound to this session's write half. Cheap;
    /// may be created before the idle starts and kept across idles.
    #[must_use]
    pub fn canceller(&self) -> IdleCanceller<S> {
        IdleCanceller {
            writer: Arc::clone(&self.writer),
            idling: Arc::clone(&self.idling),
        }
    }
}

/// Write-only handle that can break a [`Session::idle`] wait from another
/// task.
pub struct IdleCanceller<S> {
    writer: Arc<Mutex<WriteHalf<S>>>,
    idling: Arc<AtomicBool>,
}

impl<S> Clone for IdleCanceller<S> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
            idling: Arc::clone(&self.idling),
        }
    }
}

impl<S> IdleCanceller<S>
where
    S: AsyncWrite + Unpin,
{
    /// Asks the server to end the current idle by writing `done`.
    ///
    /// No-op when no idle is in flight; the flag swap makes a second
    /// concurrent cancel a no-op too, so `done` is written at most once
    /// per idle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the write fails.
    pub async fn cancel(&self) -> Result<()> {
        if !self.idling.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let mut writer = self.writer.lock().await;
        tracing::trace!(target: "mailhaul_imap::wire", ">> done");
        writer.write_all(b"done\r\n").await.map_err(Error::Io)?;
        writer.flush().await.map_err(Error::Io)?;
        Ok(())
    }

    /// True while the bound session is idling.
    #[must_use]
    pub fn is_idling(&self) -> bool {
        self.idling.load(Ordering::SeqCst)
    }
}

impl<S> std::fmt::Debug for IdleCanceller<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleCanceller")
            .field("idling", &self.idling.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
