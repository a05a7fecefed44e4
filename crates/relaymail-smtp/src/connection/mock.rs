//! Scripted in-memory transport.
//!
//! The dialer replays canned server bytes and records everything the client
//! writes, so sessions can be driven without a network.

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::stream::{Dialer, Transport};
use crate::config::{Config, TlsOptions};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<u8>,
    written: Vec<u8>,
    dials: usize,
    upgrades: usize,
    shutdowns: usize,
    fail_dial: bool,
    fail_upgrade: bool,
}

/// Dialer whose streams replay a shared reply script.
///
/// Clones share the same script, so a test can keep one handle while the
/// session owns another.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDialer {
    script: Arc<Mutex<Script>>,
}

impl ScriptedDialer {
    /// Creates a dialer with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dialer that replays `replies` in order. Each entry is one
    /// raw reply line; CRLF is appended when missing.
    #[must_use]
    pub fn with_replies<I, T>(replies: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let dialer = Self::new();
        for reply in replies {
            dialer.push_reply(reply.as_ref());
        }
        dialer
    }

    /// Queues one more raw reply line.
    pub fn push_reply(&self, line: &str) {
        let mut script = self.lock();
        script.replies.extend(line.as_bytes());
        if !line.ends_with("\r\n") {
            script.replies.extend(b"\r\n");
        }
    }

    /// Makes every subsequent dial fail.
    #[must_use]
    pub fn failing(self) -> Self {
        self.lock().fail_dial = true;
        self
    }

    /// Makes every TLS upgrade fail.
    #[must_use]
    pub fn failing_upgrade(self) -> Self {
        self.lock().fail_upgrade = true;
        self
    }

    /// Returns every byte written by the client so far.
    #[must_use]
    pub fn sent(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    /// Returns the written bytes split into CRLF-terminated lines.
    #[must_use]
    pub fn sent_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.sent())
            .split_terminator("\r\n")
            .map(str::to_string)
            .collect()
    }

    /// Returns how many times a stream was dialed.
    #[must_use]
    pub fn dial_count(&self) -> usize {
        self.lock().dials
    }

    /// Returns how many TLS upgrades succeeded.
    #[must_use]
    pub fn upgrade_count(&self) -> usize {
        self.lock().upgrades
    }

    /// Returns how many times a stream was shut down.
    #[must_use]
    pub fn shutdown_count(&self) -> usize {
        self.lock().shutdowns
    }

    /// Returns true when every scripted reply has been read.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.lock().replies.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Dialer for ScriptedDialer {
    type Stream = ScriptedStream;

    async fn dial(&self, config: &Config) -> Result<ScriptedStream> {
        let mut script = self.lock();
        if script.fail_dial {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("scripted refusal for {}:{}", config.host, config.port),
            )));
        }
        script.dials += 1;
        drop(script);

        Ok(ScriptedStream {
            script: Arc::clone(&self.script),
            tls: config.security == crate::config::Security::Implicit,
        })
    }
}

/// Stream half of [`ScriptedDialer`].
///
/// Reads hand out at most one line at a time, so nothing past a STARTTLS
/// reply is buffered before the upgrade.
#[derive(Debug)]
pub struct ScriptedStream {
    script: Arc<Mutex<Script>>,
    tls: bool,
}

impl ScriptedStream {
    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for ScriptedStream {
    async fn upgrade_to_tls(
        mut self,
        _server_name: &str,
        _options: &TlsOptions,
        _timeout: Duration,
    ) -> Result<Self> {
        if self.tls {
            return Err(Error::StartTls("Stream is already TLS".into()));
        }
        let mut script = self.lock();
        if script.fail_upgrade {
            return Err(Error::StartTls("scripted handshake failure".into()));
        }
        script.upgrades += 1;
        drop(script);

        self.tls = true;
        Ok(self)
    }

    fn is_tls(&self) -> bool {
        self.tls
    }
}

impl AsyncRead for ScriptedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let mut script = self.lock();
        while buf.remaining() > 0 {
            let Some(byte) = script.replies.pop_front() else {
                break;
            };
            buf.put_slice(&[byte]);
            if byte == b'\n' {
                break;
            }
        }
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for ScriptedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.lock().written.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.lock().shutdowns += 1;
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    #[tokio::test]
    async fn test_reads_one_line_at_a_time() {
        let dialer = ScriptedDialer::with_replies(["220 ready", "250 OK"]);
        let stream = dialer.dial(&Config::new("localhost")).await.unwrap();
        let mut reader = BufReader::new(stream);

        let buffered = reader.fill_buf().await.unwrap().to_vec();
        assert_eq!(buffered, b"220 ready\r\n");
    }

    #[tokio::test]
    async fn test_records_writes() {
        let dialer = ScriptedDialer::new();
        let mut stream = dialer.dial(&Config::new("localhost")).await.unwrap();
        stream.write_all(b"EHLO localhost\r\n").await.unwrap();
        stream.shutdown().await.unwrap();

        assert_eq!(dialer.sent_lines(), vec!["EHLO localhost"]);
        assert_eq!(dialer.shutdown_count(), 1);
        assert_eq!(dialer.dial_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_dialer() {
        let dialer = ScriptedDialer::new().failing();
        assert!(dialer.dial(&Config::new("localhost")).await.is_err());
        assert_eq!(dialer.dial_count(), 0);
    }
}
