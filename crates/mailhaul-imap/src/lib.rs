//! # mailhaul-imap
//!
//! A small async IMAP4 client session engine built on tokio and rustls.
//!
//! The design is deliberately minimal: one fixed request tag, one command in
//! flight at a time, responses drained line by line until the tagged
//! completion. That covers the mailbox workflows a mail-ingesting service
//! actually needs (list, select, fetch, flag, delete, idle) without a full
//! protocol model.
//!
//! ## Features
//!
//! - **Session operations**: LOGIN, AUTHENTICATE (PLAIN / XOAUTH2), LIST,
//!   SELECT with message/recent/unseen counts, FETCH BODY[], STORE flags,
//!   UID delete + EXPUNGE, NOOP, LOGOUT
//! - **IDLE support**: push-notification waits with a write-only
//!   [`IdleCanceller`] usable from another task
//! - **TLS via rustls**: implicit TLS with webpki roots, no OpenSSL
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailhaul_imap::{IdleEvent, Session, connect_tls};
//!
//! #[tokio::main]
//! async fn main() -> mailhaul_imap::Result<()> {
//!     let stream = connect_tls("imap.example.com", 993).await?;
//!     let mut session = Session::connect(stream).await?;
//!
//!     session.login("user@example.com", "password").await?;
//!
//!     for folder in session.list_folders("*").await? {
//!         println!("folder: {folder}");
//!     }
//!
//!     session.select_folder("INBOX").await?;
//!     println!("{} messages", session.message_count());
//!
//!     let raw = session.fetch_raw(1).await?;
//!     println!("{raw}");
//!
//!     // Wait for new mail, cancelling after 29 minutes from another task.
//!     let canceller = session.canceller();
//!     tokio::spawn(async move {
//!         tokio::time::sleep(std::time::Duration::from_secs(29 * 60)).await;
//!         let _ = canceller.cancel().await;
//!     });
//!     session
//!         .idle(|event| {
//!             if let IdleEvent::NewMail(line) = event {
//!                 println!("new mail: {line}");
//!             }
//!         })
//!         .await?;
//!
//!     session.logout().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod connection;
mod error;
mod idle;
pub mod response;
mod sasl;
mod session;

pub use connection::{ImapStream, connect_plain, connect_tls};
pub use error::{Error, Result};
pub use idle::{IdleCanceller, IdleEvent};
pub use response::{ResponseLine, Status, TAG};
pub use sasl::{plain_initial_response, xoauth2_initial_response};
pub use session::{SUPPORTED_MECHANISMS, Session};
