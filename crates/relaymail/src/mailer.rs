//! Send orchestration.
//!
//! A [`Mailer`] owns one SMTP session. Each [`Mailer::send`] validates the
//! addresses, serializes the message, makes sure the session is
//! authenticated, then runs `MAIL FROM`, `RCPT TO`, `DATA` and the payload
//! strictly in that order.

use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use relaymail_mime::{MessageDescription, Recipient};
use relaymail_smtp::command::Command;
use relaymail_smtp::{Address, Config, Dialer, Reply, ReplyCode, Session, TcpDialer, parser};

use crate::error::{Error, Result};
use crate::log::{FAILURE_SEVERITY, LogSink, TracingSink, failure_message};

type BeforeSend = Box<dyn FnMut(&mut MessageDescription) + Send>;
type AfterSend = Box<dyn FnMut(&MessageDescription) + Send>;
type Inspect = Box<dyn FnMut(&[u8]) + Send>;

/// What to do with a failed send.
#[derive(Clone, Default)]
pub enum FailurePolicy {
    /// Return the error to the caller.
    #[default]
    Propagate,
    /// Report the error to a sink and return `Ok(false)`.
    Log(Arc<dyn LogSink>),
}

impl fmt::Debug for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Propagate => f.write_str("Propagate"),
            Self::Log(_) => f.write_str("Log(..)"),
        }
    }
}

/// Per-mailer behaviour switches.
#[derive(Debug, Clone, Default)]
pub struct MailerOptions {
    /// Deliver every message to this address instead of the caller's recipient.
    pub force_to: Option<String>,
    /// Whether failures are returned or logged.
    pub failure_policy: FailurePolicy,
    /// Also issue `RCPT TO` for Cc and Bcc addresses.
    pub copy_recipients: bool,
}

impl MailerOptions {
    /// Creates default options: no redirect, failures propagate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirects every message to `address`.
    #[must_use]
    pub fn force_to(mut self, address: impl Into<String>) -> Self {
        self.force_to = Some(address.into());
        self
    }

    /// Logs failures to `sink` instead of returning them.
    #[must_use]
    pub fn log_to(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.failure_policy = FailurePolicy::Log(sink);
        self
    }

    /// Logs failures through `tracing` instead of returning them.
    #[must_use]
    pub fn log_to_tracing(self) -> Self {
        self.log_to(Arc::new(TracingSink))
    }

    /// Also delivers to Cc and Bcc addresses.
    #[must_use]
    pub const fn copy_recipients(mut self, enabled: bool) -> Self {
        self.copy_recipients = enabled;
        self
    }
}

/// Sends messages over one authenticated SMTP session.
pub struct Mailer<D: Dialer = TcpDialer> {
    session: Session<D>,
    options: MailerOptions,
    before_send: Option<BeforeSend>,
    after_send: Option<AfterSend>,
    inspect: Option<Inspect>,
}

impl Mailer<TcpDialer> {
    /// Creates a mailer for the relay in `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_options(config, MailerOptions::default())
    }

    /// Creates a mailer with explicit options.
    #[must_use]
    pub fn with_options(config: Config, options: MailerOptions) -> Self {
        Self::with_session(Session::new(config), options)
    }
}

impl<D: Dialer> Mailer<D> {
    /// Wraps an existing session.
    #[must_use]
    pub fn with_session(session: Session<D>, options: MailerOptions) -> Self {
        Self {
            session,
            options,
            before_send: None,
            after_send: None,
            inspect: None,
        }
    }

    /// Registers a hook that may edit each message before serialization.
    #[must_use]
    pub fn before_send<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut MessageDescription) + Send + 'static,
    {
        self.before_send = Some(Box::new(hook));
        self
    }

    /// Registers a hook run after the relay accepted a message.
    #[must_use]
    pub fn after_send<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&MessageDescription) + Send + 'static,
    {
        self.after_send = Some(Box::new(hook));
        self
    }

    /// Registers a callback that sees each serialized payload before it is
    /// transmitted.
    #[must_use]
    pub fn inspect<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        self.inspect = Some(Box::new(callback));
        self
    }

    /// Returns the options.
    #[must_use]
    pub const fn options(&self) -> &MailerOptions {
        &self.options
    }

    /// Returns the underlying session.
    #[must_use]
    pub const fn session(&self) -> &Session<D> {
        &self.session
    }

    /// Returns the underlying session mutably.
    pub const fn session_mut(&mut self) -> &mut Session<D> {
        &mut self.session
    }

    /// Sends `message` from `sender` to `recipient`.
    ///
    /// Returns `Ok(true)` when the relay accepted the message and `Ok(false)`
    /// when it answered the payload, or `DATA`, with anything but 2xx. With
    /// [`FailurePolicy::Log`] every error is reported to the sink, tagged
    /// with the caller's file and line, and turned into `Ok(false)`.
    ///
    /// # Errors
    ///
    /// With [`FailurePolicy::Propagate`], returns [`Error::Configuration`]
    /// for a missing sender or recipient, [`Error::Mime`] if the message
    /// cannot be serialized, and [`Error::Smtp`] for any session or
    /// transport failure. A transport failure mid-transaction also closes
    /// the session.
    #[track_caller]
    pub fn send<R>(
        &mut self,
        sender: &str,
        recipient: R,
        message: MessageDescription,
    ) -> impl Future<Output = Result<bool>> + Send + '_
    where
        R: Into<Recipient>,
    {
        let location = Location::caller();
        let sender = sender.to_string();
        let recipient = recipient.into();

        async move {
            match self.transact(&sender, recipient, message).await {
                Ok(delivered) => Ok(delivered),
                Err(e) => self.fail(e, location),
            }
        }
    }

    /// Sends QUIT and closes the connection.
    pub async fn close(&mut self) {
        self.session.disconnect().await;
    }

    fn fail(&self, error: Error, location: &Location<'_>) -> Result<bool> {
        match &self.options.failure_policy {
            FailurePolicy::Propagate => Err(error),
            FailurePolicy::Log(sink) => {
                sink.log(&failure_message(&error, location), FAILURE_SEVERITY);
                Ok(false)
            }
        }
    }

    async fn transact(
        &mut self,
        sender: &str,
        recipient: Recipient,
        mut message: MessageDescription,
    ) -> Result<bool> {
        let sender = sender.trim();
        if sender.is_empty() {
            return Err(Error::Configuration("Sender address must be set".into()));
        }

        let recipient = match &self.options.force_to {
            Some(forced) => {
                tracing::debug!(forced = %forced, "Redirecting message to forced recipient");
                Recipient::from(forced.as_str())
            }
            None => recipient,
        };
        if recipient.is_empty() {
            return Err(Error::Configuration("Recipient address must be set".into()));
        }

        message.set_sender_address(sender);
        message.set_recipient(recipient);

        if let Some(hook) = self.before_send.as_mut() {
            hook(&mut message);
        }
        // The redirect wins over anything the hook put in the recipient.
        if let Some(forced) = &self.options.force_to {
            message.set_recipient(Recipient::from(forced.as_str()));
        }

        let (from, recipients) = self.envelope(&message)?;
        let payload = message.to_bytes()?;

        if let Some(inspect) = self.inspect.as_mut() {
            inspect(&payload);
        }

        self.session.ensure_ready().await?;

        match self.exchange(from, recipients, payload).await {
            Ok(delivered) => {
                if delivered && let Some(hook) = self.after_send.as_mut() {
                    hook(&message);
                }
                Ok(delivered)
            }
            Err(e) => {
                self.session.disconnect().await;
                Err(e.into())
            }
        }
    }

    fn envelope(&self, message: &MessageDescription) -> Result<(Address, Vec<Address>)> {
        let from = Address::new(message.sender.address.trim())?;

        let mut addresses = message.recipient.addresses();
        if self.options.copy_recipients {
            addresses.extend(
                message
                    .cc
                    .iter()
                    .chain(&message.bcc)
                    .filter(|m| !m.is_empty())
                    .map(|m| m.address.as_str()),
            );
        }

        let recipients = addresses
            .into_iter()
            .map(|a| Address::new(a.trim()))
            .collect::<relaymail_smtp::Result<Vec<_>>>()?;
        if recipients.is_empty() {
            return Err(Error::Configuration("Recipient address must be set".into()));
        }
        Ok((from, recipients))
    }

    async fn exchange(
        &mut self,
        from: Address,
        recipients: Vec<Address>,
        payload: Vec<u8>,
    ) -> relaymail_smtp::Result<bool> {
        let reply = self.session.send_command(&Command::MailFrom { from }).await?;
        note_unexpected("MAIL FROM", &reply);

        for to in recipients {
            let reply = self.session.send_command(&Command::RcptTo { to }).await?;
            note_unexpected("RCPT TO", &reply);
        }

        let reply = self.session.send_command(&Command::Data).await?;
        if !reply.is(ReplyCode::START_DATA) {
            tracing::warn!(
                code = reply.code.as_u16(),
                message = %reply.message_text(),
                "Server refused DATA; resetting transaction"
            );
            let reset = self.session.send_command(&Command::Rset).await?;
            note_unexpected("RSET", &reset);
            return Ok(false);
        }

        let reply = self.session.send_command(&Command::Payload(payload)).await?;
        let delivered = parser::is_success(&reply.to_string());
        if delivered {
            tracing::info!(code = reply.code.as_u16(), "Message accepted by relay");
        } else {
            tracing::warn!(
                code = reply.code.as_u16(),
                message = %reply.message_text(),
                "Message rejected by relay"
            );
        }
        Ok(delivered)
    }
}

fn note_unexpected(step: &str, reply: &Reply) {
    if !reply.is_success() {
        tracing::warn!(
            step,
            code = reply.code.as_u16(),
            message = %reply.message_text(),
            "Unexpected reply"
        );
    }
}

impl<D: Dialer> fmt::Debug for Mailer<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailer")
            .field("session", &self.session)
            .field("options", &self.options)
            .field("before_send", &self.before_send.is_some())
            .field("after_send", &self.after_send.is_some())
            .field("inspect", &self.inspect.is_some())
            .finish()
    }
}
