//! Command channel: one command line out, one (possibly multiline) reply in.
//!
//! The channel is strictly half-duplex. Every method takes `&mut self`, so a
//! second command cannot be issued while a reply is still being drained.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::Reply;

/// Maximum bytes taken from the stream per reply line read (512 plus CRLF slack).
pub const MAX_LINE_LENGTH: usize = 514;

/// Default buffer size for reading and writing.
const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Line-framed SMTP command channel over a byte stream.
#[derive(Debug)]
pub struct CommandChannel<S> {
    reader: BufReader<S>,
    write_buffer: BytesMut,
    io_timeout: Option<Duration>,
}

impl<S> CommandChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a channel with no I/O timeout.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
            write_buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
            io_timeout: None,
        }
    }

    /// Bounds every line read and every write by `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }

    /// Returns a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    /// Consumes the channel and returns the underlying stream.
    ///
    /// Any bytes read ahead but not yet consumed are discarded.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }

    /// Writes one command, terminated by CRLF.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or times out.
    pub async fn send(&mut self, command: &Command) -> Result<()> {
        tracing::debug!(command = command.verb(), "C:");

        self.write_buffer.clear();
        self.write_buffer.extend_from_slice(&command.serialize());

        let data = &self.write_buffer[..];
        let stream = self.reader.get_mut();
        with_timeout(self.io_timeout, async move {
            stream.write_all(data).await?;
            stream.flush().await?;
            Ok::<_, Error>(())
        })
        .await
    }

    /// Reads one complete reply.
    ///
    /// Lines are accumulated in receipt order until one carries a space at
    /// position 3.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoResponse`] if the stream ends before any line was
    /// read, or a protocol error if the reply code is malformed.
    pub async fn read_reply(&mut self) -> Result<Reply> {
        let mut lines = Vec::new();

        loop {
            let Some(raw) = with_timeout(self.io_timeout, self.read_line()).await? else {
                break;
            };

            let line = String::from_utf8_lossy(&raw)
                .trim_end_matches(['\r', '\n'])
                .to_string();
            if line.is_empty() {
                continue;
            }

            tracing::trace!(line, "S:");
            let is_last = is_last_reply_line(&line);
            lines.push(line);

            if is_last {
                break;
            }
        }

        if lines.is_empty() {
            return Err(Error::NoResponse);
        }
        parse_reply(&lines)
    }

    /// Sends a command and reads its reply.
    ///
    /// Every SMTP round trip goes through this method.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or no reply arrives.
    pub async fn send_command_and_get_response(&mut self, command: &Command) -> Result<Reply> {
        self.send(command).await?;
        self.read_reply().await
    }

    /// Shuts down the write half of the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown fails.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.reader.get_mut().shutdown().await?;
        Ok(())
    }

    /// Reads up to and including the next LF, or at most [`MAX_LINE_LENGTH`]
    /// bytes. Returns `None` at end of stream.
    async fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        let mut line = Vec::new();

        while line.len() < MAX_LINE_LENGTH {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                break;
            }

            let room = MAX_LINE_LENGTH - line.len();
            let window = &buf[..buf.len().min(room)];

            if let Some(pos) = window.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&window[..=pos]);
                self.reader.consume(pos + 1);
                break;
            }

            let len = window.len();
            line.extend_from_slice(window);
            self.reader.consume(len);
        }

        Ok(if line.is_empty() { None } else { Some(line) })
    }
}

async fn with_timeout<T>(
    timeout: Option<Duration>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout {
        Some(duration) => tokio::time::timeout(duration, fut)
            .await
            .map_err(|_| Error::Timeout(duration))?,
        None => fut.await,
    }
}
