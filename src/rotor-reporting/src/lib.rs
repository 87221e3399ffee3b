// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Telemetry output sinks.
//!
//! Provides [`TelemetryLog`] for the CSV file sink and [`ScreenPrinter`]
//! for live on-screen telemetry. Both receive every sample taken during a
//! polling phase; write failures are logged, never propagated, so a full
//! disk cannot abort a move in progress.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::warn;

use rotor_core::table::TelemetrySample;

/// CSV sink with one row per telemetry sample.
pub struct TelemetryLog {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl TelemetryLog {
    /// Create the file and write the header row, or return `None` when no
    /// path is configured.
    pub fn create(path: Option<&Path>) -> Result<Option<Self>, String> {
        let Some(path) = path else {
            return Ok(None);
        };

        let file = File::create(path)
            .map_err(|e| format!("create CSV file '{}': {}", path.display(), e))?;
        let mut writer = csv::Writer::from_writer(file);
        writer
            .write_record(["Timestamp", "Status", "Alarm", "Angle"])
            .map_err(|e| format!("write CSV header '{}': {}", path.display(), e))?;
        writer
            .flush()
            .map_err(|e| format!("flush CSV file '{}': {}", path.display(), e))?;

        Ok(Some(Self {
            writer,
            path: path.to_path_buf(),
        }))
    }

    /// Append one sample. Rows are flushed immediately so an emergency
    /// teardown loses nothing.
    pub fn record(&mut self, sample: &TelemetrySample) {
        let row = [
            sample.timestamp.format("%H:%M:%S%.6f").to_string(),
            sample.status.to_string(),
            sample.alarm.to_string(),
            format!("{:.4}", sample.angle_deg),
        ];
        if let Err(e) = self.writer.write_record(row) {
            warn!("CSV write failed for '{}': {}", self.path.display(), e);
            return;
        }
        if let Err(e) = self.writer.flush() {
            warn!("CSV flush failed for '{}': {}", self.path.display(), e);
        }
    }
}

/// Live telemetry printing for `--printScreen`.
#[derive(Debug, Clone, Copy)]
pub struct ScreenPrinter {
    enabled: bool,
}

impl ScreenPrinter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn print(&self, sample: &TelemetrySample) {
        if self.enabled {
            println!(
                "Status: {} | Alarm: {} | Angle: {:.4}",
                sample.status, sample.alarm, sample.angle_deg
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample(status: u8, alarm: u8, angle_deg: f64) -> TelemetrySample {
        TelemetrySample {
            timestamp: Utc.with_ymd_and_hms(2026, 1, 15, 12, 30, 45).unwrap(),
            status,
            alarm,
            angle_deg,
        }
    }

    #[test]
    fn test_no_path_means_no_sink() {
        assert!(TelemetryLog::create(None).unwrap().is_none());
    }

    #[test]
    fn test_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.csv");

        let mut log = TelemetryLog::create(Some(&path)).unwrap().unwrap();
        log.record(&sample(1, 0, 36.0));
        log.record(&sample(2, 0, 120.5));
        drop(log);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Timestamp,Status,Alarm,Angle");
        assert!(lines[1].ends_with(",1,0,36.0000"));
        assert!(lines[2].ends_with(",2,0,120.5000"));
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let result = TelemetryLog::create(Some(Path::new("/nonexistent/dir/run.csv")));
        assert!(result.is_err());
    }
}
