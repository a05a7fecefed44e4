//! Server replies.

use std::fmt;

/// One complete server reply: a three-digit code and its text lines.
///
/// A multiline reply repeats the code on every line; only the text is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Status code shared by every line.
    pub code: ReplyCode,
    /// Text after the code and separator, one entry per line.
    pub message: Vec<String>,
}

impl Reply {
    /// Creates a reply from a code and its text lines.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(code: ReplyCode, message: Vec<String>) -> Self {
        Self { code, message }
    }

    /// 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// 4xx.
    #[must_use]
    pub const fn is_transient_error(&self) -> bool {
        self.code.is_transient()
    }

    /// 5xx.
    #[must_use]
    pub const fn is_permanent_error(&self) -> bool {
        self.code.is_permanent()
    }

    /// 3xx.
    #[must_use]
    pub const fn is_intermediate(&self) -> bool {
        self.code.is_intermediate()
    }

    /// Returns true if the reply carries exactly `code`.
    #[must_use]
    pub fn is(&self, code: ReplyCode) -> bool {
        self.code == code
    }

    /// Text lines joined with `\n`.
    #[must_use]
    pub fn message_text(&self) -> String {
        self.message.join("\n")
    }
}

impl fmt::Display for Reply {
    /// Wire form: `250-first`, ..., `250 last`, each CRLF terminated.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((last, rest)) = self.message.split_last() else {
            return write!(f, "{}\r\n", self.code);
        };
        for line in rest {
            write!(f, "{}-{line}\r\n", self.code)?;
        }
        write!(f, "{} {last}\r\n", self.code)
    }
}

/// Three-digit reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// Wraps a raw code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    const fn class(self) -> u16 {
        self.0 / 100
    }

    /// 2xx.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.class() == 2
    }

    /// 3xx.
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        self.class() == 3
    }

    /// 4xx.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        self.class() == 4
    }

    /// 5xx.
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        self.class() == 5
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Codes the session and the send transaction wait for.
impl ReplyCode {
    /// 220 Service ready, also the STARTTLS go-ahead.
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Closing channel, the answer to QUIT.
    pub const CLOSING: Self = Self(221);
    /// 235 Authentication succeeded.
    pub const AUTH_SUCCEEDED: Self = Self(235);
    /// 250 Requested action completed.
    pub const OK: Self = Self(250);
    /// 334 Send the next AUTH LOGIN line.
    pub const AUTH_CONTINUE: Self = Self(334);
    /// 354 Start message input, end with a lone dot.
    pub const START_DATA: Self = Self(354);
}
