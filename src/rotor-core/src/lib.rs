// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod controller;
pub mod error;
pub mod motion;
pub mod table;

pub type DriveResult<T> = Result<T, error::DriveError>;

pub use error::DriveError;
pub use motion::{plan_position, plan_speed, Addressing, Direction, MotionPlan, MotionRequest, SpeedPlan};
pub use table::{AckFuture, TableAccess, TableInfo, TableMode, TelemetryFuture, TelemetrySample, Turntable};
