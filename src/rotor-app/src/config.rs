// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Device configuration file support.
//!
//! The configuration is a JSON file passed via `--config`; its field names
//! are fixed by the consumed interface and mapped through serde renames.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),
}

/// One serial device, immutable for the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Serial port path (e.g. `/dev/ttyUSB0`, `COM3`).
    #[serde(rename = "COMPort")]
    pub com_port: String,

    /// Baud rate.
    #[serde(rename = "Baudrate")]
    pub baudrate: u32,

    /// Token prefixed to every command frame.
    #[serde(rename = "UartAsciiStart")]
    pub uart_ascii_start: String,

    /// Token terminating every command frame.
    #[serde(rename = "UartAsciiStop")]
    pub uart_ascii_stop: String,

    /// Protocol dialect selecting the backend (e.g. "RUYA").
    #[serde(rename = "Protocol")]
    pub protocol: String,

    /// Log level (trace, debug, info, warn, error).
    #[serde(rename = "LogLevel", default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl DeviceConfig {
    /// Semantic validation after parsing.
    pub fn validate(&self) -> Result<(), String> {
        if self.com_port.trim().is_empty() {
            return Err("COMPort must not be empty".to_string());
        }
        if self.baudrate == 0 {
            return Err("Baudrate must be non-zero".to_string());
        }
        if self.uart_ascii_stop.is_empty() {
            return Err("UartAsciiStop must not be empty".to_string());
        }
        if self.protocol.trim().is_empty() {
            return Err("Protocol must not be empty".to_string());
        }
        Ok(())
    }

    /// Example configuration for `--print-config`.
    pub fn example_json() -> String {
        let example = Self {
            com_port: "/dev/ttyUSB0".to_string(),
            baudrate: 115200,
            uart_ascii_start: "$1".to_string(),
            uart_ascii_stop: "\r\n".to_string(),
            protocol: "RUYA".to_string(),
            log_level: Some("info".to_string()),
        };
        // Serializing a known-good struct cannot fail.
        serde_json::to_string_pretty(&example).unwrap_or_default()
    }
}

/// Load and parse the device configuration from a JSON file.
pub fn load_device_config(path: &Path) -> Result<DeviceConfig, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

    serde_json::from_str::<DeviceConfig>(&content)
        .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"{
                "COMPort": "/dev/ttyUSB1",
                "Baudrate": 115200,
                "UartAsciiStart": "$1",
                "UartAsciiStop": "\r\n",
                "Protocol": "RUYA"
            }"#,
        );
        let cfg = load_device_config(file.path()).unwrap();
        assert_eq!(cfg.com_port, "/dev/ttyUSB1");
        assert_eq!(cfg.baudrate, 115200);
        assert_eq!(cfg.uart_ascii_start, "$1");
        assert_eq!(cfg.uart_ascii_stop, "\r\n");
        assert_eq!(cfg.protocol, "RUYA");
        assert_eq!(cfg.log_level, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_missing_field_is_a_parse_error() {
        let file = write_config(r#"{"COMPort": "/dev/ttyUSB0"}"#);
        match load_device_config(file.path()) {
            Err(ConfigError::ParseError(_, _)) => {}
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        match load_device_config(Path::new("/nonexistent/rotor.json")) {
            Err(ConfigError::ReadError(_, _)) => {}
            other => panic!("expected read error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_empty_port() {
        let file = write_config(
            r#"{
                "COMPort": "",
                "Baudrate": 115200,
                "UartAsciiStart": "$1",
                "UartAsciiStop": "\r\n",
                "Protocol": "RUYA"
            }"#,
        );
        let cfg = load_device_config(file.path()).unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_example_round_trips() {
        let cfg: DeviceConfig = serde_json::from_str(&DeviceConfig::example_json()).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.protocol, "RUYA");
    }
}
