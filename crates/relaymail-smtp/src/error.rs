//! Error types for SMTP operations.

use std::io;
use std::time::Duration;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS handshake or configuration error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Dial, greeting or EHLO failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// STARTTLS negotiation or handshake failure.
    #[error("STARTTLS failed: {0}")]
    StartTls(String),

    /// AUTH LOGIN rejected at one of its steps.
    #[error("Authentication failed ({code}): {message}")]
    Auth {
        /// Reply code returned by the server.
        code: u16,
        /// Server message.
        message: String,
    },

    /// The server closed the stream before sending a complete reply line.
    #[error("No response from the server")]
    NoResponse,

    /// Protocol error (unexpected or malformed response).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// No live connection is held by the session.
    #[error("Not connected")]
    NotConnected,
}

impl Error {
    /// Returns the server reply code carried by this error, if any.
    #[must_use]
    pub const fn code(&self) -> Option<u16> {
        match self {
            Self::Auth { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self.code(), Some(code) if code >= 500 && code < 600)
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.code(), Some(code) if code >= 400 && code < 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_classification() {
        let err = Error::Auth {
            code: 535,
            message: "Authentication credentials invalid".into(),
        };
        assert!(err.is_permanent());
        assert!(!err.is_transient());
        assert_eq!(err.code(), Some(535));

        let err = Error::Auth {
            code: 454,
            message: "Temporary authentication failure".into(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn non_reply_errors_have_no_code() {
        assert_eq!(Error::NoResponse.code(), None);
        assert!(!Error::NotConnected.is_permanent());
        assert_eq!(Error::NoResponse.to_string(), "No response from the server");
    }
}
