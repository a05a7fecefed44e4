//! Relay configuration types.

use std::fmt;
use std::time::Duration;

use rustls::pki_types::CertificateDer;

/// Port conventionally used for implicit-TLS submission.
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// Default submission port.
pub const SUBMISSION_PORT: u16 = 587;

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// No encryption. STARTTLS is never attempted.
    None,
    /// Start with plaintext, upgrade with STARTTLS when the server advertises it.
    #[default]
    StartTls,
    /// TLS from the start (port 465).
    Implicit,
}

impl Security {
    /// Returns the security mode implied by a port number.
    #[must_use]
    pub const fn for_port(port: u16) -> Self {
        if port == IMPLICIT_TLS_PORT {
            Self::Implicit
        } else {
            Self::StartTls
        }
    }

    /// Returns the default port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None | Self::StartTls => SUBMISSION_PORT,
            Self::Implicit => IMPLICIT_TLS_PORT,
        }
    }
}

/// Username and password for AUTH LOGIN.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
}

impl Credentials {
    /// Creates a new credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// TLS verification settings.
///
/// The default is strict: the peer certificate chain must verify against the
/// bundled web PKI roots and self-signed certificates are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsOptions {
    /// Verify the peer certificate chain and name.
    pub verify_peer: bool,
    /// Accept certificates that do not chain to a trusted root, such as
    /// self-signed ones. The leaf must still match the server name unless
    /// `verify_peer` is also false.
    pub allow_self_signed: bool,
    /// Name used for SNI and certificate verification instead of the host.
    pub server_name: Option<String>,
    /// Additional trusted roots, on top of the bundled ones.
    pub root_certificates: Vec<CertificateDer<'static>>,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            verify_peer: true,
            allow_self_signed: false,
            server_name: None,
            root_certificates: Vec::new(),
        }
    }
}

impl TlsOptions {
    /// Applies caller overrides on top of these options.
    ///
    /// Only fields the caller set are replaced. Extra root certificates are
    /// appended; the bundled roots are never removed.
    #[must_use]
    pub fn merge(mut self, overrides: TlsOverrides) -> Self {
        if let Some(verify_peer) = overrides.verify_peer {
            self.verify_peer = verify_peer;
        }
        if let Some(allow_self_signed) = overrides.allow_self_signed {
            self.allow_self_signed = allow_self_signed;
        }
        if overrides.server_name.is_some() {
            self.server_name = overrides.server_name;
        }
        self.root_certificates.extend(overrides.root_certificates);
        self
    }

    /// Returns true if chain trust is not enforced.
    #[must_use]
    pub const fn is_permissive(&self) -> bool {
        !self.verify_peer || self.allow_self_signed
    }
}

/// Caller-supplied TLS overrides. Unset fields keep the secure defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsOverrides {
    /// Override for [`TlsOptions::verify_peer`].
    pub verify_peer: Option<bool>,
    /// Override for [`TlsOptions::allow_self_signed`].
    pub allow_self_signed: Option<bool>,
    /// Override for [`TlsOptions::server_name`].
    pub server_name: Option<String>,
    /// Roots to trust in addition to the defaults.
    pub root_certificates: Vec<CertificateDer<'static>>,
}

/// SMTP relay configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Relay hostname.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// AUTH LOGIN credentials.
    pub credentials: Credentials,
    /// Name sent with EHLO.
    pub helo_name: String,
    /// Dial and TLS handshake timeout.
    pub connect_timeout: Duration,
    /// Per read/write timeout on the command channel.
    pub io_timeout: Duration,
    /// TLS verification settings.
    pub tls: TlsOptions,
}

impl Config {
    /// Creates a configuration for the submission port with default settings.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        ConfigBuilder::new(host).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }

    /// Returns the name used for TLS verification.
    #[must_use]
    pub fn tls_server_name(&self) -> &str {
        self.tls.server_name.as_deref().unwrap_or(&self.host)
    }
}

/// Builder for relay configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: Option<u16>,
    security: Option<Security>,
    credentials: Credentials,
    helo_name: String,
    connect_timeout: Duration,
    io_timeout: Duration,
    tls: TlsOptions,
}

impl ConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            security: None,
            credentials: Credentials::default(),
            helo_name: "localhost".to_string(),
            connect_timeout: Duration::from_secs(10),
            io_timeout: Duration::from_secs(60),
            tls: TlsOptions::default(),
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the security mode explicitly.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.security = Some(security);
        self
    }

    /// Sets the AUTH LOGIN credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Credentials::new(username, password);
        self
    }

    /// Sets the name sent with EHLO.
    #[must_use]
    pub fn helo_name(mut self, name: impl Into<String>) -> Self {
        self.helo_name = name.into();
        self
    }

    /// Sets the dial timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the I/O timeout.
    #[must_use]
    pub const fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Merges caller TLS overrides into the secure defaults.
    #[must_use]
    pub fn tls(mut self, overrides: TlsOverrides) -> Self {
        self.tls = self.tls.merge(overrides);
        self
    }

    /// Builds the configuration.
    ///
    /// Without an explicit port the security mode picks one; without an
    /// explicit security mode the port picks one.
    #[must_use]
    pub fn build(self) -> Config {
        let (port, security) = match (self.port, self.security) {
            (Some(port), Some(security)) => (port, security),
            (Some(port), None) => (port, Security::for_port(port)),
            (None, Some(security)) => (security.default_port(), security),
            (None, None) => (SUBMISSION_PORT, Security::StartTls),
        };

        Config {
            host: self.host,
            port,
            security,
            credentials: self.credentials,
            helo_name: self.helo_name,
            connect_timeout: self.connect_timeout,
            io_timeout: self.io_timeout,
            tls: self.tls,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_port_implies_security() {
        assert_eq!(Security::for_port(465), Security::Implicit);
        assert_eq!(Security::for_port(587), Security::StartTls);
        assert_eq!(Security::for_port(25), Security::StartTls);
    }

    #[test]
    fn test_config_new() {
        let config = Config::new("smtp.example.com");
        assert_eq!(config.host, "smtp.example.com");
        assert_eq!(config.port, 587);
        assert_eq!(config.security, Security::StartTls);
        assert_eq!(config.helo_name, "localhost");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_config_builder_implicit_port() {
        let config = Config::builder("smtp.example.com")
            .port(465)
            .credentials("user", "secret")
            .build();

        assert_eq!(config.security, Security::Implicit);
        assert_eq!(config.credentials.username, "user");
    }

    #[test]
    fn test_config_builder_security_picks_port() {
        let config = Config::builder("smtp.example.com")
            .security(Security::Implicit)
            .build();
        assert_eq!(config.port, 465);
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("user", "hunter2");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_tls_defaults_are_strict() {
        let tls = TlsOptions::default();
        assert!(tls.verify_peer);
        assert!(!tls.allow_self_signed);
        assert!(!tls.is_permissive());
    }

    #[test]
    fn test_tls_merge_keeps_unset_defaults() {
        let tls = TlsOptions::default().merge(TlsOverrides {
            allow_self_signed: Some(true),
            ..TlsOverrides::default()
        });
        assert!(tls.verify_peer);
        assert!(tls.allow_self_signed);
        assert!(tls.is_permissive());
        assert!(tls.server_name.is_none());
    }

    #[test]
    fn test_tls_merge_appends_roots() {
        let extra = CertificateDer::from(vec![0x30, 0x00]);
        let tls = TlsOptions::default()
            .merge(TlsOverrides {
                root_certificates: vec![extra.clone()],
                ..TlsOverrides::default()
            })
            .merge(TlsOverrides {
                root_certificates: vec![extra],
                ..TlsOverrides::default()
            });
        assert_eq!(tls.root_certificates.len(), 2);
    }

    #[test]
    fn test_tls_server_name_override() {
        let config = Config::builder("10.0.0.5")
            .tls(TlsOverrides {
                server_name: Some("mail.example.com".into()),
                ..TlsOverrides::default()
            })
            .build();
        assert_eq!(config.tls_server_name(), "mail.example.com");
        assert_eq!(Config::new("mx.example.com").tls_server_name(), "mx.example.com");
    }
}
