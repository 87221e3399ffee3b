// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Typed response tokens.
//!
//! `parse_line` decodes one received line; `Display` renders the exact
//! stdout contract (`OK`, `Error <reason>`, `POSHEAD <float>`, `Complete`,
//! `POSTAIL <float>`), so the two directions share one vocabulary.

use std::fmt;

use crate::frame::FrameCodec;

/// One decoded response line.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseToken {
    Ok,
    Error(String),
    PosHead(f64),
    PosTail(f64),
    Complete,
    Telemetry { status: u8, alarm: u8, angle_deg: f64 },
}

/// Decode a raw received line into a token.
///
/// The start token is stripped when present; any line matching no rule
/// decodes to `Error("malformed")`.
pub fn parse_line(framing: &FrameCodec, line: &str) -> ResponseToken {
    let line = line.trim();
    let payload = framing.strip(line).unwrap_or(line);

    if payload.starts_with("OK") {
        return ResponseToken::Ok;
    }
    if let Some(rest) = payload.strip_prefix("Error") {
        return ResponseToken::Error(rest.trim().to_string());
    }
    if let Some(rest) = payload.strip_prefix("POSHEAD") {
        if let Ok(angle) = rest.trim().parse::<f64>() {
            return ResponseToken::PosHead(angle);
        }
        return ResponseToken::Error("malformed".to_string());
    }
    if let Some(rest) = payload.strip_prefix("POSTAIL") {
        if let Ok(angle) = rest.trim().parse::<f64>() {
            return ResponseToken::PosTail(angle);
        }
        return ResponseToken::Error("malformed".to_string());
    }
    if payload == "Complete" {
        return ResponseToken::Complete;
    }
    if let Some(token) = parse_telemetry(payload) {
        return token;
    }
    ResponseToken::Error("malformed".to_string())
}

/// Decode a telemetry frame payload.
///
/// Layout: alarm digit, status digit, two reserved characters, then the
/// eight-character angle field. Angle values above 360.0 encode negative
/// angles and are rebased by subtracting 720.0.
fn parse_telemetry(payload: &str) -> Option<ResponseToken> {
    let bytes = payload.as_bytes();
    if bytes.len() < 12 {
        return None;
    }
    let alarm = (bytes[0] as char).to_digit(10)? as u8;
    let status = (bytes[1] as char).to_digit(10)? as u8;
    let mut angle_deg: f64 = payload.get(4..12)?.trim().parse().ok()?;
    if angle_deg > 360.0 {
        angle_deg -= 720.0;
    }
    Some(ResponseToken::Telemetry {
        status,
        alarm,
        angle_deg,
    })
}

impl fmt::Display for ResponseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Error(reason) => write!(f, "Error {}", reason),
            Self::PosHead(angle) => write!(f, "POSHEAD {:.4}", angle),
            Self::PosTail(angle) => write!(f, "POSTAIL {:.4}", angle),
            Self::Complete => write!(f, "Complete"),
            Self::Telemetry {
                status,
                alarm,
                angle_deg,
            } => write!(
                f,
                "Status: {} | Alarm: {} | Angle: {:.4}",
                status, alarm, angle_deg
            ),
        }
    }
}
