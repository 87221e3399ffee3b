// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Frame token handling.
//!
//! Every outgoing command is wrapped in the configured start/stop tokens
//! (e.g. `$1` ... `\r\n`). Incoming lines arrive already split on the line
//! terminator; only the start token needs stripping.

/// Configured start/stop token pair.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    start: String,
    stop: String,
}

impl FrameCodec {
    pub fn new(start: impl Into<String>, stop: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            stop: stop.into(),
        }
    }

    /// Wrap a command payload for the wire.
    pub fn encode(&self, payload: &str) -> String {
        format!("{}{}{}", self.start, payload, self.stop)
    }

    /// Strip the start token from a received line, if present.
    pub fn strip<'a>(&self, line: &'a str) -> Option<&'a str> {
        line.strip_prefix(self.start.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_wraps_payload() {
        let framing = FrameCodec::new("$1", "\r\n");
        assert_eq!(framing.encode("st"), "$1st\r\n");
    }

    #[test]
    fn test_strip_start_token() {
        let framing = FrameCodec::new("$1", "\r\n");
        assert_eq!(framing.strip("$101  000.0000"), Some("01  000.0000"));
        assert_eq!(framing.strip("OK"), None);
    }
}
