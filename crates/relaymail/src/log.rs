//! Failure log sink.

use std::fmt;
use std::panic::Location;

/// Severity passed to the sink for a failed send.
pub const FAILURE_SEVERITY: i32 = 3;

/// Receives one diagnostic per failed send.
pub trait LogSink: Send + Sync {
    /// Records a message at the given severity.
    fn log(&self, message: &str, severity: i32);
}

impl<F> LogSink for F
where
    F: Fn(&str, i32) + Send + Sync,
{
    fn log(&self, message: &str, severity: i32) {
        self(message, severity);
    }
}

/// Forwards failures to `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, message: &str, severity: i32) {
        tracing::error!(severity, "{message}");
    }
}

/// Formats a failure as `Message: <error>, File: <file>, line: <line>`.
#[must_use]
pub fn failure_message(error: &dyn fmt::Display, location: &Location<'_>) -> String {
    format!(
        "Message: {error}, File: {}, line: {}",
        location.file(),
        location.line()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_failure_message_format() {
        let location = Location::caller();
        let message = failure_message(&"No response from the server", location);
        assert_eq!(
            message,
            format!(
                "Message: No response from the server, File: {}, line: {}",
                location.file(),
                location.line()
            )
        );
        assert!(message.contains("log.rs"));
    }

    #[test]
    fn test_closure_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |message: &str, severity: i32| {
                seen.lock().unwrap().push((message.to_string(), severity));
            }
        };

        sink.log("boom", FAILURE_SEVERITY);
        assert_eq!(*seen.lock().unwrap(), vec![("boom".to_string(), 3)]);
    }

    #[test]
    fn test_tracing_sink_does_not_panic() {
        TracingSink.log("relay unreachable", FAILURE_SEVERITY);
    }
}
