// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Error type shared by the drive engine.
//!
//! Display strings double as the `Error <reason>` payload on the stdout
//! contract, so they stay short and free of internal detail.

use thiserror::Error;

/// Failure surfaced by a drive command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DriveError {
    /// No response, or a garbled one, within the exchange timeout.
    #[error("{0}")]
    Communication(String),

    /// The device reported a fault code in telemetry.
    #[error("device alarm {0}")]
    DeviceAlarm(u8),

    /// A position move never settled inside the wait budget.
    #[error("timeout")]
    CompletionTimeout,

    /// Auto-repair could not bring the axis to an enabled, stationary state.
    #[error("failed to ready turntable")]
    RepairExhausted,

    /// Bad or missing configuration / command parameters.
    #[error("{0}")]
    Config(String),

    /// Deliberate termination via the safety supervisor. Not a failure:
    /// callers map this to a clean exit and never print it as `Error`.
    #[error("interrupted")]
    Interrupted,
}

impl DriveError {
    /// The canonical reason for an exhausted or empty read.
    pub fn get_data_failed() -> Self {
        Self::Communication("get data failed".to_string())
    }

    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_stdout_contract() {
        assert_eq!(DriveError::get_data_failed().to_string(), "get data failed");
        assert_eq!(DriveError::DeviceAlarm(3).to_string(), "device alarm 3");
        assert_eq!(DriveError::CompletionTimeout.to_string(), "timeout");
    }

    #[test]
    fn test_interrupt_is_not_a_failure() {
        assert!(DriveError::Interrupted.is_interrupt());
        assert!(!DriveError::CompletionTimeout.is_interrupt());
    }
}
