//! # relaymail-mime
//!
//! RFC 5322 / MIME message serializer for SMTP submission.
//!
//! ## Features
//!
//! - **Fixed header order**: Subject, From, To, Cc, Bcc, Reply-To, custom
//!   headers, then the body section
//! - **Attachments**: `multipart/mixed` bodies with base64 parts, read from
//!   disk at construction time
//! - **Wire safe**: CRLF everywhere, dot-stuffed bodies, header injection
//!   rejected
//! - **Bulk recipients**: ordered recipient lists joined into one `To` value
//! - **Send later**: `X-Scheduled-Time` timestamps
//!
//! ## Quick Start
//!
//! ### Plain Message
//!
//! ```ignore
//! use relaymail_mime::MessageBuilder;
//!
//! let message = MessageBuilder::new()
//!     .from("sender@example.com")
//!     .to("recipient@example.com")
//!     .subject("Test Message")
//!     .text_body("Hello, World!")
//!     .build();
//!
//! let bytes = message.to_bytes()?;
//! ```
//!
//! ### Working with Attachments
//!
//! ```ignore
//! use relaymail_mime::{Attachment, MessageBuilder};
//!
//! let message = MessageBuilder::new()
//!     .subject("Document")
//!     .text_body("Please find the attached document.")
//!     .attach(Attachment::from_file("document.pdf")?)
//!     .build();
//! ```
//!
//! ### Bulk Recipients and Scheduling
//!
//! ```ignore
//! use relaymail_mime::{MessageBuilder, RecipientList, Schedule};
//!
//! let list = RecipientList::new()
//!     .add("alice@example.com", "Alice")
//!     .add("bob@example.com", "");
//!
//! let message = MessageBuilder::new()
//!     .to_list(list)
//!     .schedule(&Schedule::now().add_days(1))?
//!     .build();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod mailbox;
mod message;
mod schedule;

pub mod encoding;
pub mod serializer;

pub use content_type::{ContentType, OCTET_STREAM, Parameter};
pub use error::{Error, Result};
pub use header::Headers;
pub use mailbox::{
    DEFAULT_RECIPIENT_NAME, DEFAULT_SENDER_NAME, DEFAULT_SEPARATOR, Mailbox, Recipient,
    RecipientList,
};
pub use message::{Attachment, BodyKind, MessageBuilder, MessageDescription};
pub use schedule::{SCHEDULE_FORMAT, SCHEDULE_HEADER, Schedule};
pub use serializer::{Boundary, build};
