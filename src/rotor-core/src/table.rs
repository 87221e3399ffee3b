// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Turntable device model: modes, telemetry samples, and the backend trait.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};

use crate::motion::{MotionPlan, SpeedPlan};
use crate::DriveResult;

/// Alias to reduce type complexity in `Turntable`.
pub type AckFuture<'a> = Pin<Box<dyn Future<Output = DriveResult<()>> + Send + 'a>>;

/// Alias to reduce type complexity in `Turntable`.
pub type TelemetryFuture<'a> = Pin<Box<dyn Future<Output = DriveResult<TelemetrySample>> + Send + 'a>>;

/// How a backend reaches the device.
#[derive(Debug, Clone)]
pub enum TableAccess {
    Serial { path: String, baud: u32 },
}

/// Static info describing a turntable backend.
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub manufacturer: String,
    pub model: String,
    pub protocol: String,
    pub access: TableAccess,
}

/// Device mode decoded from the status digit of a telemetry frame.
///
/// Exactly one mode is current at any instant from the controller's point
/// of view; the device is the source of truth and is re-queried rather
/// than assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    /// Servo released, axis de-energized.
    Free,
    /// Servo engaged, axis holding position.
    ServoHold,
    /// Positional move addressed within one revolution.
    PositionSingleTurn,
    /// Continuous rotation at a commanded speed.
    SpeedRun,
    /// Positional move spanning full revolutions; the device tracks the
    /// turn count internally.
    PositionMultiTurn,
}

impl TableMode {
    /// Decode a status digit. Digits without a stable mode mapping
    /// (transitional states, reserved codes) yield `None`.
    pub fn from_status_digit(digit: u8) -> Option<Self> {
        match digit {
            0 => Some(Self::Free),
            1 => Some(Self::ServoHold),
            2 => Some(Self::PositionSingleTurn),
            3 => Some(Self::SpeedRun),
            5 => Some(Self::PositionMultiTurn),
            _ => None,
        }
    }

    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            Self::PositionSingleTurn | Self::SpeedRun | Self::PositionMultiTurn
        )
    }
}

/// Whether a raw status digit reports a motion state.
///
/// Digits 2-7 and 9 are motion modes of the protocol; 8 is a transitional
/// busy state and 0/1 are stationary.
pub fn status_is_motion(digit: u8) -> bool {
    matches!(digit, 2..=7 | 9)
}

/// One decoded status reading.
///
/// Samples are immutable once created and ordered by acquisition time.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    pub timestamp: DateTime<Utc>,
    /// Raw status digit (0-9).
    pub status: u8,
    /// Raw alarm digit; zero means no fault.
    pub alarm: u8,
    /// Reported absolute angle in degrees, rebased to (-360, 360].
    pub angle_deg: f64,
}

impl TelemetrySample {
    pub fn mode(&self) -> Option<TableMode> {
        TableMode::from_status_digit(self.status)
    }

    pub fn has_alarm(&self) -> bool {
        self.alarm != 0
    }
}

/// Common control operations any turntable backend implements.
///
/// The link is strictly half-duplex: each operation is one send plus one
/// blocking read, and callers never overlap operations on the same backend.
pub trait Turntable: Send {
    fn info(&self) -> &TableInfo;

    /// Issue the status query and decode one telemetry sample.
    fn read_telemetry(&mut self) -> TelemetryFuture<'_>;

    /// Engage the servo (device `Init`).
    fn enable(&mut self) -> AckFuture<'_>;

    /// Release the servo, de-energizing the axis (device `Free Mode`).
    fn release(&mut self) -> AckFuture<'_>;

    /// Halt any motion in progress (device `Stop`).
    fn halt(&mut self) -> AckFuture<'_>;

    /// Start a continuous rotation. Fire-and-forget: acknowledged is done.
    fn run_speed(&mut self, plan: &SpeedPlan) -> AckFuture<'_>;

    /// Start a positional move using the plan's addressing mode.
    fn run_position(&mut self, plan: &MotionPlan) -> AckFuture<'_>;
}
