//! The IMAP session engine.
//!
//! One `Session` per connection. Every command is a single round trip: write
//! one tagged line, then drain response lines until the terminating tagged
//! line. Methods take `&mut self`, so the half-duplex protocol is serialized
//! at compile time; the only operation valid concurrently with an in-flight
//! command is cancelling an IDLE wait (see [`crate::IdleCanceller`]).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::Mutex;

use crate::connection::LineReader;
use crate::response::{ResponseLine, Status, TAG, capability_tokens, classify, count_after, count_before};
use crate::{Error, Result, sasl};

/// Authentication mechanisms accepted by [`Session::authenticate`].
pub const SUPPORTED_MECHANISMS: &[&str] = &["PLAIN", "XOAUTH2"];

/// Response lines drained for one command.
#[derive(Debug)]
struct Drained {
    /// Untagged (`*`) lines, trailing terminator stripped.
    untagged: Vec<String>,
    /// Status of the terminating tagged line.
    status: Status,
    /// Text after the status token of the terminating line.
    detail: String,
    /// The terminating tagged line, verbatim (terminator stripped).
    line: String,
}

impl Drained {
    /// Fails with the full terminating line unless the status is OK.
    fn require_ok(&self) -> Result<()> {
        if self.status == Status::Ok {
            Ok(())
        } else {
            Err(Error::Protocol(self.line.clone()))
        }
    }
}

/// An IMAP session over a connected byte stream.
///
/// Created by [`Session::connect`]; owns the stream exclusively. The read
/// side belongs to whichever command loop is currently draining responses;
/// the write side is additionally shared with idle cancellers.
pub struct Session<S> {
    pub(crate) reader: LineReader<ReadHalf<S>>,
    pub(crate) writer: Arc<Mutex<WriteHalf<S>>>,
    pub(crate) idling: Arc<AtomicBool>,
    current_folder: String,
    message_count: u32,
    recent_count: u32,
    unseen_count: u32,
    capabilities: Vec<String>,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Establishes a session over an already-connected stream.
    ///
    /// Validates the greeting (must start `* OK`), then issues CAPABILITY
    /// and records the advertised tokens.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] carrying the greeting line if it is not `* OK`;
    /// transport errors propagate as [`Error::Io`].
    pub async fn connect(stream: S) -> Result<Self> {
        let (read_half, write_half) = tokio::io::split(stream);
        let mut session = Self {
            reader: LineReader::new(read_half),
            writer: Arc::new(Mutex::new(write_half)),
            idling: Arc::new(AtomicBool::new(false)),
            current_folder: String::new(),
            message_count: 0,
            recent_count: 0,
            unseen_count: 0,
            capabilities: Vec::new(),
        };

        let greeting = session.reader.read_line().await?;
        if !greeting.starts_with("* OK") {
            return Err(Error::Protocol(greeting.trim_end().to_string()));
        }

        session.refresh_capabilities().await?;
        Ok(session)
    }

    /// Writes one command line (tag not included; CRLF appended).
    pub(crate) async fn write_line(&self, line: &str) -> Result<()> {
        let mut writer = self.writer.lock().await;
        tracing::trace!(target: "mailhaul_imap::wire", ">> {line}");
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\r\n").await?;
        writer.flush().await?;
        Ok(())
    }

    /// Reads lines until the terminating tagged line, collecting untagged
    /// payload lines along the way. Continuations and raw data lines are
    /// skipped.
    async fn drain_until_tagged(&mut self) -> Result<Drained> {
        let mut untagged = Vec::new();
        loop {
            let line = self.reader.read_line().await?;
            let trimmed = line.trim_end();
            match classify(trimmed) {
                ResponseLine::Untagged(_) => untagged.push(trimmed.to_string()),
                ResponseLine::Tagged { status, detail } => {
                    return Ok(Drained {
                        untagged,
                        status,
                        detail,
                        line: trimmed.to_string(),
                    });
                }
                ResponseLine::Continuation | ResponseLine::Other => {}
            }
        }
    }

    /// Re-issues CAPABILITY and replaces the stored capability set.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] on a non-OK tagged response.
    pub async fn refresh_capabilities(&mut self) -> Result<&[String]> {
        self.write_line(&format!("{TAG} CAPABILITY")).await?;
        let drained = self.drain_until_tagged().await?;
        drained.require_ok()?;

        let mut capabilities = Vec::new();
        for line in &drained.untagged {
            if let Some(tokens) = capability_tokens(line) {
                capabilities.extend(tokens);
            }
        }
        self.capabilities = capabilities;
        Ok(&self.capabilities)
    }

    /// Authenticates with LOGIN (plaintext credentials on the wire; use
    /// only over TLS).
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] on a non-OK tagged response.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.write_line(&format!("{TAG} login {username} {password}"))
            .await?;
        self.drain_until_tagged().await?.require_ok()
    }

    /// Authenticates via SASL. `mechanism` must be `PLAIN` or `XOAUTH2`
    /// (case-insensitive); anything else fails before any bytes are written.
    ///
    /// For PLAIN, `secret` is the password; for XOAUTH2 it is the OAuth2
    /// access token.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedMechanism`] for unknown mechanisms;
    /// [`Error::Protocol`] if the server withholds the continuation or
    /// rejects the credentials.
    pub async fn authenticate(&mut self, mechanism: &str, user: &str, secret: &str) -> Result<()> {
        let mech = mechanism.to_ascii_uppercase();
        let initial_response = match mech.as_str() {
            "PLAIN" => sasl::plain_initial_response(user, secret),
            "XOAUTH2" => sasl::xoauth2_initial_response(user, secret),
            _ => return Err(Error::UnsupportedMechanism(mechanism.to_string())),
        };

        self.write_line(&format!("{TAG} AUTHENTICATE {mech}")).await?;

        let line = self.reader.read_line().await?;
        if classify(&line) != ResponseLine::Continuation {
            return Err(Error::Protocol(line.trim_end().to_string()));
        }

        self.write_line(&initial_response).await?;
        self.drain_until_tagged().await?.require_ok()
    }

    /// Authenticates with SASL PLAIN.
    ///
    /// # Errors
    ///
    /// See [`Session::authenticate`].
    pub async fn authenticate_plain(&mut self, user: &str, password: &str) -> Result<()> {
        self.authenticate("PLAIN", user, password).await
    }

    /// Authenticates with XOAUTH2 using an OAuth2 access token.
    ///
    /// # Errors
    ///
    /// See [`Session::authenticate`].
    pub async fn authenticate_xoauth2(&mut self, user: &str, access_token: &str) -> Result<()> {
        self.authenticate("XOAUTH2", user, access_token).await
    }

    /// Lists folder names matching `filter` (`*` for all).
    ///
    /// Each untagged line contributes its last whitespace-delimited token,
    /// trimmed of quotes. Folder names containing spaces are therefore
    /// truncated to their last word.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] if the terminating tagged line is not OK.
    pub async fn list_folders(&mut self, filter: &str) -> Result<Vec<String>> {
        self.write_line(&format!("{TAG} list \"\" \"{filter}\"")).await?;
        let drained = self.drain_until_tagged().await?;
        drained.require_ok()?;

        let mut folders = Vec::new();
        for line in &drained.untagged {
            if let Some(last) = line.split_whitespace().next_back() {
                folders.push(
                    last.trim_matches(|c: char| c.is_whitespace() || c == '"')
                        .to_string(),
                );
            }
        }
        Ok(folders)
    }

    /// Selects `folder` as the current mailbox, recording its message,
    /// recent, and unseen counts.
    ///
    /// # Errors
    ///
    /// On a non-OK tagged response the folder selection and all counts are
    /// reset and [`Error::Protocol`] carries the server's detail text.
    pub async fn select_folder(&mut self, folder: &str) -> Result<()> {
        self.write_line(&format!("{TAG} select \"{folder}\"")).await?;
        self.current_folder = folder.to_string();

        let drained = self.drain_until_tagged().await?;
        for line in &drained.untagged {
            if line.contains("EXISTS") {
                if let Some(n) = count_before(line, "EXISTS") {
                    self.message_count = n;
                }
            } else if line.contains("RECENT") {
                if let Some(n) = count_before(line, "RECENT") {
                    self.recent_count = n;
                }
            } else if line.contains("UNSEEN")
                && let Some(n) = count_after(line, "UNSEEN")
            {
                self.unseen_count = n;
            }
        }

        if drained.status == Status::Ok {
            return Ok(());
        }

        self.current_folder.clear();
        self.message_count = 0;
        self.recent_count = 0;
        self.unseen_count = 0;
        Err(Error::Protocol(drained.detail))
    }

    /// Fetches the raw payload of message `id` (`FETCH <id> BODY[]`).
    ///
    /// The first response line must acknowledge the fetch; body lines are
    /// then concatenated verbatim (terminators preserved) until the tagged
    /// line, skipping the `.`/`)`/`*`-prefixed delimiter lines.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] if the fetch is not acknowledged or the
    /// terminating line is not OK (a `NO` status is a fetch failure).
    pub async fn fetch_raw(&mut self, id: u32) -> Result<String> {
        self.write_line(&format!("{TAG} fetch {id} body[]")).await?;

        let first = self.reader.read_line().await?;
        if !first.contains(&format!("{id} FETCH")) {
            return Err(Error::Protocol(first.trim_end().to_string()));
        }

        let mut raw = String::new();
        loop {
            let line = self.reader.read_line().await?;
            let trimmed = line.trim_end();

            if let ResponseLine::Tagged { status, .. } = classify(trimmed) {
                if status != Status::Ok || trimmed.contains(" NO") {
                    return Err(Error::Protocol(trimmed.to_string()));
                }
                return Ok(raw);
            }

            if !trimmed.starts_with('.') && !trimmed.starts_with(')') && !trimmed.starts_with('*') {
                raw.push_str(&line);
            }
        }
    }

    /// Flags message `id` as `\Deleted` (by UID) and expunges the mailbox.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] with the server's detail text if either step
    /// completes non-OK.
    pub async fn delete(&mut self, id: u32) -> Result<()> {
        self.write_line(&format!("{TAG} UID STORE {id} +FLAGS (\\Deleted)"))
            .await?;
        let drained = self.drain_until_tagged().await?;
        if drained.status != Status::Ok {
            return Err(Error::Protocol(drained.detail));
        }

        self.write_line(&format!("{TAG} EXPUNGE")).await?;
        let drained = self.drain_until_tagged().await?;
        if drained.status != Status::Ok {
            return Err(Error::Protocol(drained.detail));
        }
        Ok(())
    }

    /// Sets `flag` on message `id`. Returns whether the server confirmed
    /// the store (`OK STORE` in the terminating line); a refusal is a
    /// `false`, not an error.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidFlag`] (before any network I/O) if `flag` does not
    /// start with a backslash.
    pub async fn set_flag(&mut self, id: u32, flag: &str) -> Result<bool> {
        self.store_flag(id, flag, '+').await
    }

    /// Removes `flag` from message `id`. Same contract as [`Session::set_flag`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidFlag`] if `flag` does not start with a backslash.
    pub async fn remove_flag(&mut self, id: u32, flag: &str) -> Result<bool> {
        self.store_flag(id, flag, '-').await
    }

    async fn store_flag(&mut self, id: u32, flag: &str, op: char) -> Result<bool> {
        if !flag.starts_with('\\') {
            return Err(Error::InvalidFlag(flag.to_string()));
        }

        self.write_line(&format!("{TAG} store {id} {op}flags {flag}"))
            .await?;
        let drained = self.drain_until_tagged().await?;
        Ok(drained.line.contains("OK STORE"))
    }

    /// Marks message `id` as read (`\Seen`).
    ///
    /// # Errors
    ///
    /// See [`Session::set_flag`].
    pub async fn mark_as_read(&mut self, id: u32) -> Result<bool> {
        self.set_flag(id, "\\Seen").await
    }

    /// Keep-alive.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] on a non-OK tagged response.
    pub async fn noop(&mut self) -> Result<()> {
        self.write_line(&format!("{TAG} NOOP")).await?;
        self.drain_until_tagged().await?.require_ok()
    }

    /// Logs out and consumes the session. The server must answer `* BYE`.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] carrying the response line if it is not `* BYE`.
    pub async fn logout(mut self) -> Result<()> {
        self.write_line(&format!("{TAG} logout")).await?;
        let line = self.reader.read_line().await?;
        if !line.starts_with("* BYE") {
            return Err(Error::Protocol(line.trim_end().to_string()));
        }
        Ok(())
    }

    /// The currently selected folder, or empty if none is selected.
    #[must_use]
    pub fn current_folder(&self) -> &str {
        &self.current_folder
    }

    /// Total messages in the selected folder.
    #[must_use]
    pub const fn message_count(&self) -> u32 {
        self.message_count
    }

    /// Recent messages in the selected folder.
    #[must_use]
    pub const fn recent_count(&self) -> u32 {
        self.recent_count
    }

    /// First-unseen / unseen count reported at selection time.
    #[must_use]
    pub const fn unseen_count(&self) -> u32 {
        self.unseen_count
    }

    /// Capability tokens advertised by the server.
    #[must_use]
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Checks a capability token, case-insensitively.
    #[must_use]
    pub fn has_capability(&self, token: &str) -> bool {
        self.capabilities.iter().any(|c| c.eq_ignore_ascii_case(token))
    }

    /// True while an IDLE wait is in flight.
    #[must_use]
    pub fn is_idling(&self) -> bool {
        self.idling.load(Ordering::SeqCst)
    }
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("current_folder", &self.current_folder)
            .field("message_count", &self.message_count)
            .field("recent_count", &self.recent_count)
            .field("unseen_count", &self.unseen_count)
            .field("idling", &self.idling.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
