//! # relaymail
//!
//! Send mail through an authenticated SMTP relay.
//!
//! This crate ties together:
//! - [`smtp`]: the relay session (TCP or implicit TLS, `STARTTLS`,
//!   `AUTH LOGIN`, reply parsing)
//! - [`mime`]: the RFC 5322 / MIME message serializer
//! - [`Mailer`]: the send orchestration (`MAIL FROM`, `RCPT TO`, `DATA`,
//!   payload) with redirect, hooks and failure logging
//!
//! ## Quick Start
//!
//! ```ignore
//! use relaymail::{Config, Mailer, MessageBuilder, Security};
//!
//! relaymail::logging::init();
//!
//! let config = Config::builder("smtp.example.com")
//!     .port(587)
//!     .security(Security::StartTls)
//!     .credentials("user@example.com", "secret")
//!     .build();
//!
//! let mut mailer = Mailer::new(config);
//! let message = MessageBuilder::new()
//!     .subject("Hi")
//!     .text_body("Hello")
//!     .build();
//!
//! let delivered = mailer.send("a@x.com", "b@y.com", message).await?;
//! mailer.close().await;
//! ```
//!
//! ## Failure Logging
//!
//! ```ignore
//! use std::sync::Arc;
//! use relaymail::{Mailer, MailerOptions};
//!
//! let options = MailerOptions::new()
//!     .log_to(Arc::new(|message: &str, severity: i32| eprintln!("[{severity}] {message}")));
//! let mut mailer = Mailer::with_options(config, options);
//!
//! // Failures now come back as Ok(false) and reach the sink as
//! // "Message: <error>, File: <file>, line: <line>".
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod log;
pub mod logging;
mod mailer;

pub use relaymail_mime as mime;
pub use relaymail_smtp as smtp;

pub use error::{Error, Result};
pub use log::{FAILURE_SEVERITY, LogSink, TracingSink, failure_message};
pub use mailer::{FailurePolicy, Mailer, MailerOptions};

pub use relaymail_mime::{
    Attachment, BodyKind, Mailbox, MessageBuilder, MessageDescription, Recipient, RecipientList,
    SCHEDULE_FORMAT, SCHEDULE_HEADER, Schedule,
};
pub use relaymail_smtp::{Config, ConfigBuilder, Credentials, Security, Session, TlsOverrides};
