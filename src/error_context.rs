//! Per-session "last error" slot.
//!
//! Every failing session operation overwrites the slot with the OS message
//! for that failure. The message is reduced to its first line; Windows'
//! `FormatMessageW` terminates its text with `"\r\n"`.

use crate::error::OsError;

/// Returned by [`ErrorContext::message`] when nothing has been recorded.
pub const NO_ERROR: &str = "Success";

/// The most recently captured failure: the operation, the OS code, and the
/// single-line message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LastError {
    pub op: &'static str,
    pub code: u32,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ErrorContext {
    last: Option<LastError>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture `err` as the result of `op`, replacing any previous message.
    pub fn record(&mut self, op: &'static str, err: &OsError) {
        self.last = Some(LastError {
            op,
            code: err.code,
            message: single_line(&err.message).to_owned(),
        });
    }

    pub fn message(&self) -> &str {
        self.last.as_ref().map_or(NO_ERROR, |e| e.message.as_str())
    }

    pub fn last(&self) -> Option<&LastError> {
        self.last.as_ref()
    }

    /// Release the captured message.
    pub fn clear(&mut self) {
        self.last = None;
    }
}

/// Cut `msg` at its first line terminator.
pub fn single_line(msg: &str) -> &str {
    match msg.find(['\r', '\n']) {
        Some(end) => &msg[..end],
        None => msg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_reports_sentinel() {
        let ctx = ErrorContext::new();
        assert_eq!(ctx.message(), NO_ERROR);
        assert!(ctx.last().is_none());
    }

    #[test]
    fn record_strips_crlf_and_overwrites() {
        let mut ctx = ErrorContext::new();
        ctx.record("WriteFile", &OsError::new(5, "Access is denied.\r\n"));
        assert_eq!(ctx.message(), "Access is denied.");
        assert_eq!(ctx.last().map(|e| (e.op, e.code)), Some(("WriteFile", 5)));

        ctx.record(
            "ReadFile",
            &OsError::new(1167, "The device is not connected.\r\n"),
        );
        assert_eq!(ctx.message(), "The device is not connected.");
        assert_eq!(ctx.last().map(|e| e.op), Some("ReadFile"));
    }

    #[test]
    fn clear_returns_to_sentinel() {
        let mut ctx = ErrorContext::new();
        ctx.record("HidD_GetFeature", &OsError::new(31, "A device attached to the system is not functioning."));
        ctx.clear();
        assert_eq!(ctx.message(), NO_ERROR);
    }

    #[test]
    fn single_line_keeps_plain_text() {
        assert_eq!(single_line("no terminator"), "no terminator");
        assert_eq!(single_line("first\nsecond"), "first");
        assert_eq!(single_line("\r\n"), "");
    }
}
