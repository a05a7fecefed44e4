//! Error types for sending mail.

use thiserror::Error;

/// Errors that can occur while sending a message.
#[derive(Debug, Error)]
pub enum Error {
    /// Session or transaction failure.
    #[error("SMTP error: {0}")]
    Smtp(#[from] relaymail_smtp::Error),

    /// Message could not be serialized.
    #[error("Message error: {0}")]
    Mime(#[from] relaymail_mime::Error),

    /// Sender or recipient missing.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Returns true if the error was caused by caller input rather than by
    /// the relay or the network.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::Mime(
                    relaymail_mime::Error::MissingSender
                        | relaymail_mime::Error::MissingRecipient
                        | relaymail_mime::Error::Attachment { .. }
                )
        )
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(Error::Configuration("no sender".into()).is_configuration());
        assert!(Error::from(relaymail_mime::Error::MissingRecipient).is_configuration());
        assert!(!Error::from(relaymail_smtp::Error::NoResponse).is_configuration());
    }

    #[test]
    fn test_display_wraps_source() {
        let err = Error::from(relaymail_smtp::Error::Auth {
            code: 535,
            message: "bad credentials".into(),
        });
        assert_eq!(
            err.to_string(),
            "SMTP error: Authentication failed (535): bad credentials"
        );
    }
}
