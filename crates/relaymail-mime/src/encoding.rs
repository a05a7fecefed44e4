//! Encoding utilities for the wire form of a message.
//!
//! Base64 with fixed line width, RFC 2047 header words, CRLF line
//! normalisation and SMTP dot-stuffing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Line width for base64 attachment bodies (RFC 2045).
pub const BASE64_LINE_WIDTH: usize = 76;

/// Protocol line terminator.
pub const CRLF: &str = "\r\n";

/// Encodes data as Base64 on a single line.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 split into lines of `width` characters, each
/// terminated by CRLF.
#[must_use]
pub fn encode_base64_lines(data: &[u8], width: usize) -> String {
    let encoded = encode_base64(data);
    let width = width.max(4);
    let mut result = String::with_capacity(encoded.len() + (encoded.len() / width + 1) * 2);

    // Base64 output is pure ASCII, so byte chunks are char boundaries.
    for chunk in encoded.as_bytes().chunks(width) {
        result.push_str(&String::from_utf8_lossy(chunk));
        result.push_str(CRLF);
    }
    result
}

/// Encodes a header value using RFC 2047 `B` encoding when it is not
/// plain ASCII.
///
/// Format: `=?charset?B?encoded-text?=`
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }
    let encoded = encode_base64(text.as_bytes());
    format!("=?{charset}?B?{encoded}?=")
}

/// Rewrites every line ending (`\r\n`, bare `\n` or bare `\r`) as CRLF.
#[must_use]
pub fn normalize_line_endings(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 32);
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                result.push_str(CRLF);
            }
            '\n' => result.push_str(CRLF),
            _ => result.push(ch),
        }
    }
    result
}

/// Doubles a leading `.` on every line so no body line can be mistaken for
/// the end-of-data marker. Expects CRLF line endings.
#[must_use]
pub fn dot_stuff(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for (i, line) in text.split(CRLF).enumerate() {
        if i > 0 {
            result.push_str(CRLF);
        }
        if line.starts_with('.') {
            result.push('.');
        }
        result.push_str(line);
    }
    result
}
