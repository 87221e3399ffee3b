// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Dummy turntable backend for development and testing.
//!
//! Holds axis state in memory and simulates motion one telemetry read at a
//! time: each status query advances the axis by at most one step toward the
//! commanded target. No hardware or serial port required.

use chrono::Utc;
use tracing::debug;

use rotor_core::motion::{wrap_angle, Addressing, Direction, MotionPlan, SpeedPlan};
use rotor_core::table::{
    AckFuture, TableAccess, TableInfo, TableMode, TelemetryFuture, TelemetrySample, Turntable,
};
use rotor_core::DriveError;

use std::sync::{Arc, Mutex};

/// Status digits the simulation reports.
const DIGIT_FREE: u8 = 0;
const DIGIT_SERVO_HOLD: u8 = 1;
const DIGIT_SINGLE_TURN: u8 = 2;
const DIGIT_SPEED_RUN: u8 = 3;
const DIGIT_MULTI_TURN: u8 = 5;

/// Shared simulation state, observable through [`DummyHandle`].
#[derive(Debug)]
pub struct DummyState {
    pub mode: TableMode,
    /// Wrapped angle the device would report.
    pub angle_deg: f64,
    /// Signed travel still to cover; infinite during a speed run.
    remaining_deg: f64,
    /// Largest arc covered per telemetry read.
    step_deg: f64,
    motion_digit: u8,
    alarm: u8,
    fail_reads: u32,
    fail_reads_after_move: u32,

    pub enable_count: u32,
    pub release_count: u32,
    pub halt_count: u32,
    pub speed_plans: Vec<SpeedPlan>,
    pub position_plans: Vec<MotionPlan>,
}

impl DummyState {
    fn advance(&mut self) {
        if self.remaining_deg == 0.0 {
            return;
        }
        if self.remaining_deg.is_infinite() {
            let step = self.step_deg * self.remaining_deg.signum();
            self.angle_deg = wrap_angle(self.angle_deg + step);
            return;
        }
        let step = self
            .step_deg
            .min(self.remaining_deg.abs())
            .copysign(self.remaining_deg);
        self.angle_deg = wrap_angle(self.angle_deg + step);
        self.remaining_deg -= step;
        if self.remaining_deg == 0.0 {
            self.mode = TableMode::ServoHold;
        }
    }

    fn idle_digit(&self) -> u8 {
        match self.mode {
            TableMode::Free => DIGIT_FREE,
            _ => DIGIT_SERVO_HOLD,
        }
    }
}

/// Observer/scripting handle for tests.
#[derive(Clone)]
pub struct DummyHandle(Arc<Mutex<DummyState>>);

impl DummyHandle {
    fn lock(&self) -> std::sync::MutexGuard<'_, DummyState> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_mode(&self, mode: TableMode) {
        self.lock().mode = mode;
    }

    pub fn set_angle(&self, angle_deg: f64) {
        self.lock().angle_deg = wrap_angle(angle_deg);
    }

    pub fn set_alarm(&self, alarm: u8) {
        self.lock().alarm = alarm;
    }

    /// Fail the next `n` telemetry reads with a communication error.
    pub fn fail_next_reads(&self, n: u32) {
        self.lock().fail_reads = n;
    }

    /// Arm read failures that begin once a positional move is accepted.
    pub fn fail_reads_after_move(&self, n: u32) {
        self.lock().fail_reads_after_move = n;
    }

    pub fn set_step(&self, step_deg: f64) {
        self.lock().step_deg = step_deg;
    }

    pub fn angle_deg(&self) -> f64 {
        self.lock().angle_deg
    }

    pub fn mode(&self) -> TableMode {
        self.lock().mode
    }

    pub fn enable_count(&self) -> u32 {
        self.lock().enable_count
    }

    pub fn release_count(&self) -> u32 {
        self.lock().release_count
    }

    pub fn halt_count(&self) -> u32 {
        self.lock().halt_count
    }

    pub fn speed_plans(&self) -> Vec<SpeedPlan> {
        self.lock().speed_plans.clone()
    }

    pub fn position_plans(&self) -> Vec<MotionPlan> {
        self.lock().position_plans.clone()
    }
}

/// In-memory turntable.
pub struct DummyTable {
    info: TableInfo,
    state: Arc<Mutex<DummyState>>,
}

impl DummyTable {
    pub fn new() -> Self {
        Self {
            info: TableInfo {
                manufacturer: "Dummy".to_string(),
                model: "dummy".to_string(),
                protocol: "dummy".to_string(),
                access: TableAccess::Serial {
                    path: "/dev/null".to_string(),
                    baud: 115200,
                },
            },
            state: Arc::new(Mutex::new(DummyState {
                mode: TableMode::ServoHold,
                angle_deg: 0.0,
                remaining_deg: 0.0,
                step_deg: 120.0,
                motion_digit: DIGIT_SINGLE_TURN,
                alarm: 0,
                fail_reads: 0,
                fail_reads_after_move: 0,
                enable_count: 0,
                release_count: 0,
                halt_count: 0,
                speed_plans: Vec::new(),
                position_plans: Vec::new(),
            })),
        }
    }

    pub fn handle(&self) -> DummyHandle {
        DummyHandle(self.state.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DummyState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for DummyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Turntable for DummyTable {
    fn info(&self) -> &TableInfo {
        &self.info
    }

    fn read_telemetry(&mut self) -> TelemetryFuture<'_> {
        let mut st = self.lock();
        if st.fail_reads > 0 {
            st.fail_reads -= 1;
            drop(st);
            return Box::pin(async { Err(DriveError::get_data_failed()) });
        }
        // A read that consumes the final arc still reports the motion
        // digit; the hold digit only shows up once the axis has sat still
        // for a full read.
        let was_moving = st.remaining_deg != 0.0;
        st.advance();
        let sample = TelemetrySample {
            timestamp: Utc::now(),
            status: if was_moving {
                st.motion_digit
            } else {
                st.idle_digit()
            },
            alarm: st.alarm,
            angle_deg: st.angle_deg,
        };
        drop(st);
        Box::pin(async move { Ok(sample) })
    }

    fn enable(&mut self) -> AckFuture<'_> {
        let mut st = self.lock();
        st.enable_count += 1;
        if st.mode == TableMode::Free {
            st.mode = TableMode::ServoHold;
        }
        debug!("dummy: servo enabled");
        Box::pin(async { Ok(()) })
    }

    fn release(&mut self) -> AckFuture<'_> {
        let mut st = self.lock();
        st.release_count += 1;
        st.mode = TableMode::Free;
        st.remaining_deg = 0.0;
        debug!("dummy: servo released");
        Box::pin(async { Ok(()) })
    }

    fn halt(&mut self) -> AckFuture<'_> {
        let mut st = self.lock();
        st.halt_count += 1;
        st.remaining_deg = 0.0;
        if st.mode.is_motion() {
            st.mode = TableMode::ServoHold;
        }
        debug!("dummy: halted");
        Box::pin(async { Ok(()) })
    }

    fn run_speed(&mut self, plan: &SpeedPlan) -> AckFuture<'_> {
        let mut st = self.lock();
        st.speed_plans.push(plan.clone());
        st.mode = TableMode::SpeedRun;
        st.motion_digit = DIGIT_SPEED_RUN;
        st.remaining_deg = match plan.direction {
            Direction::Cw => f64::INFINITY,
            Direction::Ccw => f64::NEG_INFINITY,
        };
        Box::pin(async { Ok(()) })
    }

    fn run_position(&mut self, plan: &MotionPlan) -> AckFuture<'_> {
        let mut st = self.lock();
        st.position_plans.push(plan.clone());
        let sign = match plan.direction {
            Direction::Cw => 1.0,
            Direction::Ccw => -1.0,
        };
        let (mode, digit, travel) = match plan.addressing {
            Addressing::SingleTurn => {
                let arc = match plan.direction {
                    Direction::Cw => wrap_angle(plan.target_abs_deg - st.angle_deg),
                    Direction::Ccw => -wrap_angle(st.angle_deg - plan.target_abs_deg),
                };
                (TableMode::PositionSingleTurn, DIGIT_SINGLE_TURN, arc)
            }
            Addressing::MultiTurn => {
                let arc = match plan.direction {
                    Direction::Cw => wrap_angle(plan.target_abs_deg - st.angle_deg),
                    Direction::Ccw => -wrap_angle(st.angle_deg - plan.target_abs_deg),
                };
                (
                    TableMode::PositionMultiTurn,
                    DIGIT_MULTI_TURN,
                    arc + sign * f64::from(plan.loops) * 360.0,
                )
            }
        };
        st.mode = mode;
        st.motion_digit = digit;
        st.remaining_deg = travel;
        if st.fail_reads_after_move > 0 {
            st.fail_reads = st.fail_reads_after_move;
            st.fail_reads_after_move = 0;
        }
        Box::pin(async { Ok(()) })
    }
}
