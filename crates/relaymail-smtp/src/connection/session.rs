//! Authenticated SMTP session.
//!
//! Drives connect, greeting, EHLO, optional STARTTLS and AUTH LOGIN as an
//! explicit state machine:
//!
//! ```text
//! Disconnected ── connect() ──→ Connected ── start_tls() ──→ TlsUpgraded
//!                                   │                             │
//!                                   └──────── authenticate() ─────┴──→ Authenticated
//! ```
//!
//! Any failure inside [`Session::ensure_ready`] tears the connection down, so
//! the next attempt starts again from `Disconnected`.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::ServerInfo;
use super::channel::CommandChannel;
use super::stream::{Dialer, TcpDialer, Transport};
use crate::command::Command;
use crate::config::{Config, Security};
use crate::error::{Error, Result};
use crate::types::{AuthMechanism, Reply, ReplyCode};

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No transport is held.
    #[default]
    Disconnected,
    /// Greeting and EHLO accepted.
    Connected,
    /// STARTTLS completed and EHLO re-sent.
    TlsUpgraded,
    /// AUTH LOGIN accepted.
    Authenticated,
}

/// SMTP session owning exactly one transport connection.
pub struct Session<D: Dialer = TcpDialer> {
    config: Config,
    dialer: D,
    channel: Option<CommandChannel<D::Stream>>,
    state: SessionState,
    server_info: ServerInfo,
}

impl Session<TcpDialer> {
    /// Creates a disconnected session that dials over TCP.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_dialer(config, TcpDialer)
    }
}

impl<D: Dialer> Session<D> {
    /// Creates a disconnected session using a custom dialer.
    #[must_use]
    pub fn with_dialer(config: Config, dialer: D) -> Self {
        Self {
            config,
            dialer,
            channel: None,
            state: SessionState::Disconnected,
            server_info: ServerInfo::default(),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true once AUTH LOGIN has been accepted.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// Returns the relay configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the capabilities from the latest EHLO reply.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Returns the live command channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if no transport is held.
    pub fn channel(&mut self) -> Result<&mut CommandChannel<D::Stream>> {
        self.channel.as_mut().ok_or(Error::NotConnected)
    }

    /// Sends one command on the live channel and reads its reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] without a transport, or any channel error.
    pub async fn send_command(&mut self, command: &Command) -> Result<Reply> {
        self.channel()?.send_command_and_get_response(command).await
    }

    /// Brings the session to `Authenticated`.
    ///
    /// A no-op when already authenticated. Otherwise runs whatever part of
    /// the handshake is still missing. On failure the connection is closed
    /// and the state reset to `Disconnected`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`], [`Error::StartTls`], [`Error::Auth`] or
    /// a transport error from the failing step.
    pub async fn ensure_ready(&mut self) -> Result<()> {
        if self.is_authenticated() {
            return Ok(());
        }

        match self.establish().await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, host = %self.config.host, "SMTP handshake failed");
                self.disconnect().await;
                Err(e)
            }
        }
    }

    async fn establish(&mut self) -> Result<()> {
        if self.state == SessionState::Disconnected {
            self.connect().await?;
        }
        if self.state == SessionState::Connected && self.wants_start_tls()? {
            self.start_tls().await?;
        }
        self.authenticate().await
    }

    fn wants_start_tls(&mut self) -> Result<bool> {
        if self.config.security != Security::StartTls || self.channel()?.get_ref().is_tls() {
            return Ok(false);
        }
        if !self.server_info.supports_starttls() {
            tracing::warn!(host = %self.config.host, "STARTTLS not advertised; continuing in plaintext");
            return Ok(false);
        }
        Ok(true)
    }

    /// Dials the relay, checks the greeting and sends EHLO.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the dial fails, the greeting is not
    /// 2xx, or EHLO is not answered with 250.
    pub async fn connect(&mut self) -> Result<()> {
        if self.channel.is_some() {
            self.disconnect().await;
        }

        let stream = self.dialer.dial(&self.config).await.map_err(|e| {
            Error::Connection(format!(
                "Failed to connect to {}:{}: {e}",
                self.config.host, self.config.port
            ))
        })?;
        self.channel = Some(CommandChannel::new(stream).with_timeout(self.config.io_timeout));

        let greeting = self.channel()?.read_reply().await?;
        if !greeting.is_success() {
            return Err(Error::Connection(format!(
                "SMTP server did not respond with 220: {} {}",
                greeting.code,
                greeting.message_text()
            )));
        }
        self.state = SessionState::Connected;
        tracing::info!(host = %self.config.host, port = self.config.port, "SMTP connected");

        let reply = self.ehlo().await?;
        if !reply.is(ReplyCode::OK) {
            return Err(Error::Connection(format!(
                "EHLO rejected: {} {}",
                reply.code,
                reply.message_text()
            )));
        }
        self.server_info = ServerInfo::from_ehlo(&reply);
        Ok(())
    }

    /// Upgrades the live connection with STARTTLS and re-sends EHLO.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StartTls`] if the server refuses, the handshake
    /// fails, or the second EHLO is not answered with 250.
    pub async fn start_tls(&mut self) -> Result<()> {
        let reply = self.send_command(&Command::StartTls).await?;
        if !reply.is(ReplyCode::SERVICE_READY) {
            return Err(Error::StartTls(format!(
                "Server refused STARTTLS: {} {}",
                reply.code,
                reply.message_text()
            )));
        }

        let channel = self.channel.take().ok_or(Error::NotConnected)?;
        self.state = SessionState::Disconnected;

        let stream = channel
            .into_inner()
            .upgrade_to_tls(
                self.config.tls_server_name(),
                &self.config.tls,
                self.config.connect_timeout,
            )
            .await
            .map_err(|e| match e {
                Error::StartTls(_) => e,
                other => Error::StartTls(other.to_string()),
            })?;
        self.channel = Some(CommandChannel::new(stream).with_timeout(self.config.io_timeout));
        self.state = SessionState::Connected;

        let reply = self.ehlo().await?;
        if !reply.is(ReplyCode::OK) {
            return Err(Error::StartTls(format!(
                "EHLO after STARTTLS rejected: {} {}",
                reply.code,
                reply.message_text()
            )));
        }
        self.server_info = ServerInfo::from_ehlo(&reply);
        self.state = SessionState::TlsUpgraded;
        tracing::info!(host = %self.config.host, "SMTP connection upgraded to TLS");
        Ok(())
    }

    /// Runs AUTH LOGIN with the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] carrying the server reply if any of the three
    /// steps is rejected.
    pub async fn authenticate(&mut self) -> Result<()> {
        let credentials = &self.config.credentials;
        let steps = [
            (
                Command::Auth {
                    mechanism: AuthMechanism::Login,
                },
                ReplyCode::AUTH_CONTINUE,
            ),
            (
                Command::AuthResponse(STANDARD.encode(&credentials.username)),
                ReplyCode::AUTH_CONTINUE,
            ),
            (
                Command::AuthResponse(STANDARD.encode(&credentials.password)),
                ReplyCode::AUTH_SUCCEEDED,
            ),
        ];

        for (command, expected) in &steps {
            let reply = self.send_command(command).await?;
            if !reply.is(*expected) {
                return Err(Error::Auth {
                    code: reply.code.as_u16(),
                    message: reply.message_text(),
                });
            }
        }

        self.state = SessionState::Authenticated;
        tracing::info!(host = %self.config.host, "SMTP session authenticated");
        Ok(())
    }

    /// Sends QUIT, closes the transport and resets to `Disconnected`.
    ///
    /// Never fails; errors on an already broken connection are logged.
    pub async fn disconnect(&mut self) {
        if let Some(channel) = self.channel.take() {
            close(channel).await;
            tracing::info!(host = %self.config.host, "SMTP disconnected");
        }
        self.state = SessionState::Disconnected;
        self.server_info = ServerInfo::default();
    }

    async fn ehlo(&mut self) -> Result<Reply> {
        let command = Command::Ehlo {
            hostname: self.config.helo_name.clone(),
        };
        self.send_command(&command).await
    }
}

async fn close<S: Transport>(mut channel: CommandChannel<S>) {
    if let Err(e) = channel.send_command_and_get_response(&Command::Quit).await {
        tracing::debug!(error = %e, "QUIT failed during teardown");
    }
    if let Err(e) = channel.shutdown().await {
        tracing::debug!(error = %e, "Shutdown failed during teardown");
    }
}

impl<D: Dialer> Drop for Session<D> {
    fn drop(&mut self) {
        let Some(channel) = self.channel.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(close(channel));
            }
            Err(_) => tracing::warn!("No tokio runtime; dropping SMTP connection without QUIT"),
        }
    }
}

impl<D: Dialer> fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("state", &self.state)
            .field("connected", &self.channel.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::connection::mock::ScriptedDialer;

    const EHLO_WITH_STARTTLS: &str =
        "250-relay.example.com\r\n250-STARTTLS\r\n250 AUTH LOGIN PLAIN\r\n";
    const EHLO_PLAIN: &str = "250-relay.example.com\r\n250 AUTH LOGIN\r\n";

    fn config() -> Config {
        Config::builder("relay.example.com")
            .credentials("user", "pass")
            .helo_name("client.example.com")
            .build()
    }

    fn session(replies: &[&str]) -> (Session<ScriptedDialer>, ScriptedDialer) {
        let dialer = ScriptedDialer::with_replies(replies);
        (Session::with_dialer(config(), dialer.clone()), dialer)
    }

    #[tokio::test]
    async fn test_full_handshake_without_starttls() {
        let (mut session, dialer) = session(&[
            "220 relay.example.com ESMTP",
            EHLO_PLAIN,
            "334 VXNlcm5hbWU6",
            "334 UGFzc3dvcmQ6",
            "235 Authentication successful",
        ]);

        session.ensure_ready().await.unwrap();

        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(
            dialer.sent_lines(),
            vec![
                "EHLO client.example.com",
                "AUTH LOGIN",
                "dXNlcg==",
                "cGFzcw==",
            ]
        );
        assert_eq!(session.server_info().hostname, "relay.example.com");
        assert!(dialer.is_drained());
    }

    #[tokio::test]
    async fn test_handshake_with_starttls() {
        let (mut session, dialer) = session(&[
            "220 relay.example.com ESMTP",
            EHLO_WITH_STARTTLS,
            "220 Ready to start TLS",
            EHLO_PLAIN,
            "334 VXNlcm5hbWU6",
            "334 UGFzc3dvcmQ6",
            "235 Authentication successful",
        ]);

        session.ensure_ready().await.unwrap();

        assert!(session.is_authenticated());
        assert_eq!(dialer.upgrade_count(), 1);
        assert!(session.channel().unwrap().get_ref().is_tls());
        assert_eq!(
            dialer.sent_lines(),
            vec![
                "EHLO client.example.com",
                "STARTTLS",
                "EHLO client.example.com",
                "AUTH LOGIN",
                "dXNlcg==",
                "cGFzcw==",
            ]
        );
    }

    #[tokio::test]
    async fn test_security_none_skips_starttls() {
        let dialer = ScriptedDialer::with_replies([
            "220 ready",
            EHLO_WITH_STARTTLS,
            "334 VXNlcm5hbWU6",
            "334 UGFzc3dvcmQ6",
            "235 ok",
        ]);
        let config = Config::builder("relay.example.com")
            .security(Security::None)
            .credentials("user", "pass")
            .build();
        let mut session = Session::with_dialer(config, dialer.clone());

        session.ensure_ready().await.unwrap();
        assert_eq!(dialer.upgrade_count(), 0);
        assert!(!dialer.sent_lines().contains(&"STARTTLS".to_string()));
    }

    #[tokio::test]
    async fn test_implicit_tls_does_not_upgrade_again() {
        let dialer = ScriptedDialer::with_replies([
            "220 ready",
            EHLO_WITH_STARTTLS,
            "334 VXNlcm5hbWU6",
            "334 UGFzc3dvcmQ6",
            "235 ok",
        ]);
        let config = Config::builder("relay.example.com")
            .port(465)
            .credentials("user", "pass")
            .build();
        let mut session = Session::with_dialer(config, dialer.clone());

        session.ensure_ready().await.unwrap();
        assert!(session.is_authenticated());
        assert_eq!(dialer.upgrade_count(), 0);
    }

    #[tokio::test]
    async fn test_ensure_ready_is_idempotent() {
        let (mut session, dialer) = session(&[
            "220 ready",
            EHLO_PLAIN,
            "334 VXNlcm5hbWU6",
            "334 UGFzc3dvcmQ6",
            "235 ok",
        ]);

        session.ensure_ready().await.unwrap();
        let sent = dialer.sent();

        session.ensure_ready().await.unwrap();
        assert_eq!(dialer.dial_count(), 1);
        assert_eq!(dialer.sent(), sent);
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_password_rejected() {
        let (mut session, dialer) = session(&[
            "220 ready",
            EHLO_PLAIN,
            "334 VXNlcm5hbWU6",
            "334 UGFzc3dvcmQ6",
            "535 5.7.8 Authentication credentials invalid",
            "221 Bye",
        ]);

        let err = session.ensure_ready().await.unwrap_err();

        assert!(matches!(err, Error::Auth { code: 535, .. }));
        assert!(err.is_permanent());
        assert!(!session.is_authenticated());
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(dialer.sent_lines().last().unwrap(), "QUIT");
        assert_eq!(dialer.shutdown_count(), 1);
    }

    #[tokio::test]
    async fn test_auth_login_refused() {
        let (mut session, _dialer) = session(&["220 ready", EHLO_PLAIN, "504 Unrecognized"]);

        let err = session.ensure_ready().await.unwrap_err();
        assert!(matches!(err, Error::Auth { code: 504, .. }));
    }

    #[tokio::test]
    async fn test_bad_greeting() {
        let (mut session, _dialer) = session(&["554 No SMTP service here"]);

        let err = session.ensure_ready().await.unwrap_err();
        assert!(matches!(err, Error::Connection(ref msg) if msg.contains("554")));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_ehlo_rejected() {
        let (mut session, _dialer) = session(&["220 ready", "502 Command not implemented"]);

        let err = session.ensure_ready().await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }

    #[tokio::test]
    async fn test_dial_failure() {
        let dialer = ScriptedDialer::new().failing();
        let mut session = Session::with_dialer(config(), dialer);

        let err = session.ensure_ready().await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }

    #[tokio::test]
    async fn test_starttls_refused() {
        let (mut session, _dialer) =
            session(&["220 ready", EHLO_WITH_STARTTLS, "454 TLS not available"]);

        let err = session.ensure_ready().await.unwrap_err();
        assert!(matches!(err, Error::StartTls(_)));
    }

    #[tokio::test]
    async fn test_tls_handshake_failure() {
        let dialer = ScriptedDialer::with_replies(["220 ready", EHLO_WITH_STARTTLS, "220 go ahead"])
            .failing_upgrade();
        let mut session = Session::with_dialer(config(), dialer);

        let err = session.ensure_ready().await.unwrap_err();
        assert!(matches!(err, Error::StartTls(_)));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_no_response_from_server() {
        let (mut session, _dialer) = session(&[]);

        let err = session.ensure_ready().await.unwrap_err();
        assert!(matches!(err, Error::NoResponse));
    }

    #[tokio::test]
    async fn test_disconnect_when_never_connected() {
        let (mut session, dialer) = session(&[]);
        session.disconnect().await;
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(dialer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_drop_sends_quit() {
        let (mut session, dialer) = session(&[
            "220 ready",
            EHLO_PLAIN,
            "334 VXNlcm5hbWU6",
            "334 UGFzc3dvcmQ6",
            "235 ok",
            "221 Bye",
        ]);
        session.ensure_ready().await.unwrap();

        drop(session);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(dialer.sent_lines().last().unwrap(), "QUIT");
        assert_eq!(dialer.shutdown_count(), 1);
    }

    #[tokio::test]
    async fn test_send_command_without_connection() {
        let (mut session, _dialer) = session(&[]);
        let err = session.send_command(&Command::Rset).await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }
}
