//! RFC 5322 / MIME serializer.
//!
//! Header block order is fixed: `Subject`, `From`, `To`, `Cc`, `Bcc`,
//! `Reply-To`, custom headers, then either a single `Content-Type` with the
//! body or a `multipart/mixed` body with one part per attachment. The output
//! ends with the lone `.` line that closes the SMTP DATA phase.

use crate::content_type::ContentType;
use crate::encoding::{
    BASE64_LINE_WIDTH, CRLF, dot_stuff, encode_base64_lines, encode_rfc2047,
    normalize_line_endings,
};
use crate::error::{Error, Result};
use crate::header::{validate_name, validate_value};
use crate::mailbox::{DEFAULT_RECIPIENT_NAME, DEFAULT_SENDER_NAME, Mailbox, Recipient};
use crate::message::{Attachment, MessageDescription};
use std::fmt;

/// Charset label used for encoded header words.
const HEADER_CHARSET: &str = "UTF-8";

/// Line between the multipart headers and the first part.
pub const MULTIPART_PREAMBLE: &str = "This is a multi-part message in MIME format.";

/// Opaque multipart delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Boundary(String);

impl Boundary {
    /// Creates a fresh random boundary (128 random bits, hex encoded).
    #[must_use]
    pub fn random() -> Self {
        Self(format!("{:032x}", rand::random::<u128>()))
    }

    /// Uses a caller-chosen boundary.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the boundary text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Boundary {
    fn default() -> Self {
        Self::random()
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serializes a message into wire bytes ready for the DATA phase.
///
/// # Errors
///
/// Returns [`Error::MissingSender`] or [`Error::MissingRecipient`] when an
/// address is empty, and [`Error::InvalidHeader`] when a generated header
/// line would contain CR or LF.
pub fn build(message: &MessageDescription) -> Result<Vec<u8>> {
    if message.sender.is_empty() {
        return Err(Error::MissingSender);
    }
    if message.recipient.is_empty() {
        return Err(Error::MissingRecipient);
    }

    let mut out = Writer::default();

    out.header("Subject", &encode_rfc2047(&message.subject, HEADER_CHARSET))?;
    out.header("From", &named(&message.sender, Some(DEFAULT_SENDER_NAME)))?;
    out.header("To", &to_value(&message.recipient))?;

    if !message.cc.is_empty() {
        out.header("Cc", &join_mailboxes(&message.cc))?;
    }
    if !message.bcc.is_empty() {
        // Written as a visible header; strip it before relaying if the
        // copies must stay hidden.
        out.header("Bcc", &join_mailboxes(&message.bcc))?;
    }
    if let Some(reply_to) = message.reply_to.as_deref().filter(|r| !r.is_empty()) {
        out.header("Reply-To", reply_to)?;
    }

    for (name, value) in message.headers.iter() {
        validate_name(name)?;
        out.header(name, value)?;
    }

    let body_type = message.body_kind.content_type();
    if message.attachments.is_empty() {
        out.header("Content-Type", &body_type.to_string())?;
        out.line("");
        out.body(&message.body);
    } else {
        let boundary = message.boundary.as_str();
        out.header("MIME-Version", "1.0")?;
        out.header(
            "Content-Type",
            &ContentType::multipart_mixed(boundary).to_string(),
        )?;
        out.line("");
        out.line(MULTIPART_PREAMBLE);

        out.delimiter(boundary);
        out.header("Content-Type", &body_type.to_string())?;
        out.header("Content-Transfer-Encoding", "8bit")?;
        out.line("");
        out.body(&message.body);

        for attachment in &message.attachments {
            out.delimiter(boundary);
            out.attachment(attachment)?;
        }

        out.line(&format!("--{boundary}--"));
    }

    out.line(".");
    Ok(out.finish())
}

/// `name <address>` with the name RFC 2047-encoded, falling back to
/// `default_name`, or the bare address when neither is set.
fn named(mailbox: &Mailbox, default_name: Option<&str>) -> String {
    match mailbox.name.as_deref().or(default_name) {
        Some(name) => format!(
            "{} <{}>",
            encode_rfc2047(name, HEADER_CHARSET),
            mailbox.address
        ),
        None => mailbox.address.clone(),
    }
}

fn to_value(recipient: &Recipient) -> String {
    match recipient {
        Recipient::Single(mailbox) => named(mailbox, Some(DEFAULT_RECIPIENT_NAME)),
        // Bulk lists are pre-joined by the caller and written verbatim.
        Recipient::Bulk(list) => list.to_header_value(),
    }
}

fn join_mailboxes(mailboxes: &[Mailbox]) -> String {
    mailboxes
        .iter()
        .map(|m| named(m, None))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Default)]
struct Writer {
    buf: String,
}

impl Writer {
    fn header(&mut self, name: &str, value: &str) -> Result<()> {
        validate_value(name, value)?;
        self.buf.push_str(name);
        self.buf.push_str(": ");
        self.buf.push_str(value);
        self.buf.push_str(CRLF);
        Ok(())
    }

    fn line(&mut self, line: &str) {
        self.buf.push_str(line);
        self.buf.push_str(CRLF);
    }

    fn delimiter(&mut self, boundary: &str) {
        self.line(&format!("--{boundary}"));
    }

    fn body(&mut self, body: &str) {
        let body = dot_stuff(&normalize_line_endings(body));
        self.line(&body);
    }

    fn attachment(&mut self, attachment: &Attachment) -> Result<()> {
        let name = &attachment.name;
        let content_type = attachment
            .content_type
            .clone()
            .with_quoted_parameter("name", name.as_str());

        self.header("Content-Type", &content_type.to_string())?;
        self.header(
            "Content-Disposition",
            &format!("attachment; filename=\"{name}\""),
        )?;
        self.header("Content-Transfer-Encoding", "base64")?;
        self.line("");
        self.buf
            .push_str(&encode_base64_lines(&attachment.data, BASE64_LINE_WIDTH));
        self.buf.push_str(CRLF);
        Ok(())
    }

    fn finish(self) -> Vec<u8> {
        self.buf.into_bytes()
    }
}
