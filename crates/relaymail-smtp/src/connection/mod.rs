//! SMTP connection management: transport, command channel and session.

mod channel;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
mod session;
mod stream;

pub use channel::{CommandChannel, MAX_LINE_LENGTH};
pub use session::{Session, SessionState};
pub use stream::{
    Dialer, SmtpStream, TcpDialer, Transport, connect, connect_tls, create_tls_connector,
};

use crate::types::{AuthMechanism, Extension, Reply};
use std::collections::HashSet;

/// Server capabilities from EHLO response.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server hostname from the first EHLO line.
    pub hostname: String,
    /// Supported extensions.
    pub extensions: HashSet<Extension>,
}

impl ServerInfo {
    /// Builds server info from a 250 EHLO reply.
    ///
    /// The first line carries the server name, each following line one
    /// capability keyword with its parameters.
    #[must_use]
    pub fn from_ehlo(reply: &Reply) -> Self {
        let hostname = reply
            .message
            .first()
            .and_then(|line| line.split_whitespace().next())
            .unwrap_or_default()
            .to_string();
        let extensions = reply
            .message
            .iter()
            .skip(1)
            .map(|line| Extension::parse(line))
            .collect();

        Self {
            hostname,
            extensions,
        }
    }

    /// Checks if the server supports an extension.
    #[must_use]
    pub fn supports(&self, ext: &Extension) -> bool {
        self.extensions.contains(ext)
    }

    /// Checks if STARTTLS is supported.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.supports(&Extension::StartTls)
    }

    /// Returns the maximum message size, if advertised.
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        self.extensions.iter().find_map(|ext| match ext {
            Extension::Size(size) => *size,
            _ => None,
        })
    }

    /// Returns supported authentication mechanisms.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<AuthMechanism> {
        self.extensions
            .iter()
            .find_map(|ext| match ext {
                Extension::Auth(mechanisms) => Some(mechanisms.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReplyCode;

    #[test]
    fn test_server_info_from_ehlo() {
        let reply = Reply::new(
            ReplyCode::OK,
            vec![
                "relay.example.com Hello client".to_string(),
                "SIZE 35882577".to_string(),
                "AUTH LOGIN PLAIN".to_string(),
                "STARTTLS".to_string(),
                "PIPELINING".to_string(),
            ],
        );
        let info = ServerInfo::from_ehlo(&reply);

        assert_eq!(info.hostname, "relay.example.com");
        assert!(info.supports_starttls());
        assert_eq!(info.max_message_size(), Some(35_882_577));
        assert_eq!(
            info.auth_mechanisms(),
            vec![AuthMechanism::Login, AuthMechanism::Plain]
        );
        assert!(info.supports(&Extension::Unknown("PIPELINING".to_string())));
    }

    #[test]
    fn test_server_info_single_line() {
        let reply = Reply::new(ReplyCode::OK, vec!["relay.example.com".to_string()]);
        let info = ServerInfo::from_ehlo(&reply);

        assert!(!info.supports_starttls());
        assert!(info.auth_mechanisms().is_empty());
        assert_eq!(info.max_message_size(), None);
    }
}
