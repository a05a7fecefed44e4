//! # relaymail-smtp
//!
//! Async SMTP relay client implementing the submission side of RFC 5321.
//!
//! ## Features
//!
//! - **Explicit session state machine**: connect, greeting, EHLO, STARTTLS
//!   and AUTH LOGIN as separately testable transitions
//! - **TLS support**: Both implicit TLS (port 465) and STARTTLS, with strict
//!   verification unless the caller relaxes it
//! - **Half-duplex command channel**: one command, one (possibly multiline)
//!   reply, bounded line reads and per-operation timeouts
//! - **Scoped teardown**: QUIT and close on disconnect, on failure and on drop
//!
//! ## Quick Start
//!
//! ```ignore
//! use relaymail_smtp::command::Command;
//! use relaymail_smtp::{Address, Config, Session};
//!
//! #[tokio::main]
//! async fn main() -> relaymail_smtp::Result<()> {
//!     let config = Config::builder("smtp.example.com")
//!         .credentials("user@example.com", "password")
//!         .build();
//!
//!     let mut session = Session::new(config);
//!     session.ensure_ready().await?;
//!
//!     let from = Address::new("sender@example.com")?;
//!     session.send_command(&Command::MailFrom { from }).await?;
//!
//!     session.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Session States
//!
//! ```text
//! ┌──────────────┐
//! │ Disconnected │ ─── connect() ───→ Connected ─── start_tls() ───→ TlsUpgraded
//! └──────────────┘                        │                              │
//!                                         └──── authenticate() ──────────┴──→ Authenticated
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command builders
//! - [`config`]: Relay, credential and TLS configuration
//! - [`connection`]: Transport, command channel and session
//! - [`parser`]: Response parser
//! - [`types`]: Core SMTP types (addresses, extensions, replies)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod config;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use config::{Config, ConfigBuilder, Credentials, Security, TlsOptions, TlsOverrides};
pub use connection::{
    CommandChannel, Dialer, ServerInfo, Session, SessionState, SmtpStream, TcpDialer, Transport,
};
pub use error::{Error, Result};
pub use types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
