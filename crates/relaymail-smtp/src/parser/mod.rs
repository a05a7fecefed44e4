//! SMTP reply parser.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Parses an SMTP reply from response lines (line terminators already removed).
///
/// SMTP replies can be single-line or multi-line:
/// - Single: `250 OK\r\n`
/// - Multi: `250-First line\r\n250-Second line\r\n250 Last line\r\n`
///
/// # Errors
///
/// Returns an error if there are no lines or the reply code is malformed.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let Some(first) = lines.first() else {
        return Err(Error::NoResponse);
    };

    let code_str = first
        .get(0..3)
        .ok_or_else(|| Error::Protocol(format!("Reply too short: {first}")))?;
    let code = code_str
        .parse::<u16>()
        .map_err(|_| Error::Protocol(format!("Invalid reply code: {code_str}")))?;

    // Skip code and separator (e.g., "250-" or "250 ")
    let message = lines
        .iter()
        .map(|line| line.get(4..).unwrap_or_default().to_string())
        .collect();

    Ok(Reply::new(ReplyCode::new(code), message))
}

/// Checks if a line is the last line of a multi-line reply.
///
/// Continuation lines carry `-` at position 3, the last line carries a space.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    line.as_bytes().get(3) == Some(&b' ')
}

/// Classifies raw reply text: success means non-empty text whose trimmed
/// form starts with the `2` status class.
#[must_use]
pub fn is_success(text: &str) -> bool {
    text.trim_start().starts_with('2')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_line_reply() {
        let lines = vec!["250 OK".to_string()];
        let reply = parse_reply(&lines).unwrap();
        assert_eq!(reply.code.as_u16(), 250);
        assert_eq!(reply.message, vec!["OK"]);
        assert!(reply.is_success());
    }

    #[test]
    fn test_parse_multi_line_reply() {
        let lines = vec![
            "250-smtp.example.com".to_string(),
            "250-AUTH LOGIN PLAIN".to_string(),
            "250 STARTTLS".to_string(),
        ];
        let reply = parse_reply(&lines).unwrap();
        assert_eq!(reply.code.as_u16(), 250);
        assert_eq!(
            reply.message,
            vec!["smtp.example.com", "AUTH LOGIN PLAIN", "STARTTLS"]
        );
    }

    #[test]
    fn test_parse_code_only() {
        let reply = parse_reply(&["354".to_string()]).unwrap();
        assert_eq!(reply.code, ReplyCode::START_DATA);
        assert_eq!(reply.message, vec![""]);
    }

    #[test]
    fn test_is_last_reply_line() {
        assert!(is_last_reply_line("250 OK"));
        assert!(!is_last_reply_line("250-Continuing"));
        assert!(!is_last_reply_line("250"));
    }

    #[test]
    fn test_is_success() {
        assert!(is_success("250 OK"));
        assert!(is_success("  250 OK\r\n"));
        assert!(!is_success("550 Mailbox unavailable"));
        assert!(!is_success(""));
        assert!(!is_success("   "));
    }

    #[test]
    fn test_parse_error_empty() {
        assert!(matches!(parse_reply(&[]), Err(Error::NoResponse)));
    }

    #[test]
    fn test_parse_error_too_short() {
        assert!(parse_reply(&["25".to_string()]).is_err());
    }

    #[test]
    fn test_parse_error_invalid_code() {
        assert!(parse_reply(&["ABC OK".to_string()]).is_err());
    }
}
