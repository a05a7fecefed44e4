//! Structured message description and its builder.

use crate::content_type::ContentType;
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::mailbox::{Mailbox, Recipient, RecipientList};
use crate::schedule::{SCHEDULE_HEADER, Schedule};
use crate::serializer::{self, Boundary};
use std::fmt;
use std::path::{Path, PathBuf};

/// Body flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BodyKind {
    /// `text/plain`
    #[default]
    Plain,
    /// `text/html`
    Html,
}

impl BodyKind {
    /// Returns the content type of a body of this kind.
    #[must_use]
    pub fn content_type(self) -> ContentType {
        match self {
            Self::Plain => ContentType::text_plain(),
            Self::Html => ContentType::text_html(),
        }
    }
}

/// File attached to a message. Bytes are held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Source path, if read from disk.
    pub path: Option<PathBuf>,
    /// File name shown to the recipient.
    pub name: String,
    /// Resolved MIME type.
    pub content_type: ContentType,
    /// Raw file contents.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment from bytes already in memory.
    #[must_use]
    pub fn new(name: impl Into<String>, content_type: ContentType, data: Vec<u8>) -> Self {
        Self {
            path: None,
            name: name.into(),
            content_type,
            data,
        }
    }

    /// Reads a file now and names the attachment after it.
    ///
    /// The MIME type is resolved from the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attachment`] if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_file_named(path, name)
    }

    /// Reads a file now, showing it under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attachment`] if the file cannot be read.
    pub fn from_file_named(path: impl AsRef<Path>, name: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| Error::Attachment {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: Some(path.to_path_buf()),
            name: name.into(),
            content_type: ContentType::from_path(path),
            data,
        })
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("content_type", &self.content_type.essence())
            .field("size", &self.data.len())
            .finish()
    }
}

/// Everything needed to serialize one message.
///
/// Fields are public so send hooks can adjust them before serialization.
#[derive(Debug, Clone, Default)]
pub struct MessageDescription {
    /// Envelope and `From` sender.
    pub sender: Mailbox,
    /// Envelope and `To` recipient(s).
    pub recipient: Recipient,
    /// Subject line.
    pub subject: String,
    /// Body text.
    pub body: String,
    /// Body flavour.
    pub body_kind: BodyKind,
    /// Custom headers in insertion order.
    pub headers: Headers,
    /// Carbon-copy recipients.
    pub cc: Vec<Mailbox>,
    /// Blind-carbon-copy recipients. Emitted as a visible `Bcc` header.
    pub bcc: Vec<Mailbox>,
    /// `Reply-To` address.
    pub reply_to: Option<String>,
    /// Attachments in order.
    pub attachments: Vec<Attachment>,
    /// Multipart boundary, fixed for the lifetime of this description.
    pub boundary: Boundary,
}

impl MessageDescription {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> MessageBuilder {
        MessageBuilder::new()
    }

    /// Sets the sender address, keeping a display name already set.
    pub fn set_sender_address(&mut self, address: impl Into<String>) {
        self.sender.address = address.into();
    }

    /// Replaces the recipient.
    ///
    /// A single unnamed recipient inherits the display name of the single
    /// recipient it replaces.
    pub fn set_recipient(&mut self, recipient: Recipient) {
        let mut recipient = recipient;
        if let (Recipient::Single(new), Recipient::Single(old)) = (&mut recipient, &mut self.recipient)
        {
            if new.name.is_none() {
                new.name = old.name.take();
            }
        }
        self.recipient = recipient;
    }

    /// Serializes the message to wire bytes, terminator line included.
    ///
    /// # Errors
    ///
    /// See [`serializer::build`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serializer::build(self)
    }
}

/// Builder for [`MessageDescription`].
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct MessageBuilder {
    message: MessageDescription,
}

impl MessageBuilder {
    /// Creates an empty builder with a fresh boundary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender address.
    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.message.set_sender_address(address);
        self
    }

    /// Sets the sender address and display name.
    pub fn from_named(mut self, address: impl Into<String>, name: impl Into<String>) -> Self {
        self.message.sender = Mailbox::with_name(address, name);
        self
    }

    /// Sets a single recipient.
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.message.recipient = Recipient::Single(Mailbox::new(address));
        self
    }

    /// Sets a single recipient with a display name.
    pub fn to_named(mut self, address: impl Into<String>, name: impl Into<String>) -> Self {
        self.message.recipient = Recipient::Single(Mailbox::with_name(address, name));
        self
    }

    /// Sets a bulk recipient list; its joined form becomes the `To` header.
    pub fn to_list(mut self, list: RecipientList) -> Self {
        self.message.recipient = Recipient::Bulk(list);
        self
    }

    /// Sets the subject.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.message.subject = subject.into();
        self
    }

    /// Sets a plain text body.
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.message.body = body.into();
        self.message.body_kind = BodyKind::Plain;
        self
    }

    /// Sets an HTML body.
    pub fn html_body(mut self, body: impl Into<String>) -> Self {
        self.message.body = body.into();
        self.message.body_kind = BodyKind::Html;
        self
    }

    /// Appends a custom header. Repeated names are all kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the name or value could break
    /// header framing.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        self.message.headers.add(name, value)?;
        Ok(self)
    }

    /// Adds an `X-Scheduled-Time` header for a send-later relay.
    ///
    /// # Errors
    ///
    /// Same as [`MessageBuilder::header`].
    pub fn schedule(self, schedule: &Schedule) -> Result<Self> {
        self.header(SCHEDULE_HEADER, schedule.format())
    }

    /// Adds a carbon-copy recipient. An empty name means a bare address.
    pub fn cc(mut self, address: impl Into<String>, name: impl Into<String>) -> Self {
        self.message.cc.push(Mailbox::with_name(address, name));
        self
    }

    /// Adds a blind-carbon-copy recipient. An empty name means a bare address.
    pub fn bcc(mut self, address: impl Into<String>, name: impl Into<String>) -> Self {
        self.message.bcc.push(Mailbox::with_name(address, name));
        self
    }

    /// Sets the `Reply-To` address.
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.message.reply_to = Some(address.into());
        self
    }

    /// Adds an attachment.
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.message.attachments.push(attachment);
        self
    }

    /// Reads a file now and attaches it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attachment`] if the file cannot be read.
    pub fn attach_file(self, path: impl AsRef<Path>) -> Result<Self> {
        Ok(self.attach(Attachment::from_file(path)?))
    }

    /// Reads a file now and attaches it under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attachment`] if the file cannot be read.
    pub fn attach_file_named(self, path: impl AsRef<Path>, name: impl Into<String>) -> Result<Self> {
        Ok(self.attach(Attachment::from_file_named(path, name)?))
    }

    /// Uses a fixed boundary instead of a random one.
    pub fn boundary(mut self, boundary: Boundary) -> Self {
        self.message.boundary = boundary;
        self
    }

    /// Finishes the description. Sender and recipient are checked at
    /// serialization time, since a mailer may still supply them.
    #[must_use]
    pub fn build(self) -> MessageDescription {
        self.message
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builder_sets_fields() {
        let message = MessageBuilder::new()
            .from_named("a@x.com", "Alice")
            .to("b@y.com")
            .subject("Hi")
            .html_body("<p>Hello</p>")
            .cc("c@z.com", "")
            .reply_to("r@x.com")
            .header("X-Tag", "one")
            .unwrap()
            .build();

        assert_eq!(message.sender.to_string(), "Alice <a@x.com>");
        assert_eq!(message.recipient.addresses(), vec!["b@y.com"]);
        assert_eq!(message.body_kind, BodyKind::Html);
        assert_eq!(message.cc, vec![Mailbox::new("c@z.com")]);
        assert_eq!(message.reply_to.as_deref(), Some("r@x.com"));
        assert_eq!(message.headers.get("X-Tag"), Some("one"));
    }

    #[test]
    fn test_header_injection_rejected() {
        let err = MessageBuilder::new()
            .header("X-Evil", "a\r\nBcc: victim@example.com")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }

    #[test]
    fn test_leading_dot_header_name_rejected() {
        let err = MessageBuilder::new().header(".", "x").unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }

    #[test]
    fn test_schedule_header() {
        let schedule = Schedule::now().add_days(2);
        let message = MessageBuilder::new().schedule(&schedule).unwrap().build();
        assert_eq!(
            message.headers.get(SCHEDULE_HEADER),
            Some(schedule.format().as_str())
        );
    }

    #[test]
    fn test_boundary_is_stable_per_description() {
        let message = MessageBuilder::new().build();
        let copy = message.clone();
        assert_eq!(message.boundary, copy.boundary);
        assert_ne!(message.boundary, MessageBuilder::new().build().boundary);
    }

    #[test]
    fn test_set_recipient_keeps_name() {
        let mut message = MessageBuilder::new().to_named("old@x.com", "Bob").build();
        message.set_recipient(Recipient::from("new@y.com"));
        assert_eq!(message.recipient.to_header_value(), "Bob <new@y.com>");

        message.set_recipient(Recipient::Single(Mailbox::with_name("z@z.com", "Zed")));
        assert_eq!(message.recipient.to_header_value(), "Zed <z@z.com>");
    }

    #[test]
    fn test_attachment_from_file() {
        let dir = std::env::temp_dir().join(format!("relaymail-att-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("report.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.4")
            .unwrap();

        let attachment = Attachment::from_file(&path).unwrap();
        assert_eq!(attachment.name, "report.pdf");
        assert_eq!(attachment.content_type.essence(), "application/pdf");
        assert_eq!(attachment.data, b"%PDF-1.4");

        let renamed = Attachment::from_file_named(&path, "q3.pdf").unwrap();
        assert_eq!(renamed.name, "q3.pdf");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unreadable_attachment_fails_at_construction() {
        let err = MessageBuilder::new()
            .attach_file("/definitely/not/here/missing.txt")
            .unwrap_err();
        match err {
            Error::Attachment { path, .. } => {
                assert_eq!(path, PathBuf::from("/definitely/not/here/missing.txt"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
