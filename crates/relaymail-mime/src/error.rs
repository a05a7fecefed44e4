//! Error types for MIME operations.

use std::io;
use std::path::PathBuf;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No sender address was set before serialization.
    #[error("Sender address must be set")]
    MissingSender,

    /// No recipient address was set before serialization.
    #[error("Recipient address must be set")]
    MissingRecipient,

    /// Attachment source could not be read.
    #[error("Cannot read attachment {}: {source}", path.display())]
    Attachment {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Invalid MIME header.
    #[error("Invalid MIME header: {0}")]
    InvalidHeader(String),

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),
}
