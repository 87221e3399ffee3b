// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! One session: one serial connection, one command, one teardown.
//!
//! The session owns the backend for the lifetime of the invocation and is
//! the only component that talks to it, so protocol exchanges stay
//! strictly sequential. Teardown runs exactly once: normally on success,
//! or as the emergency Halt -> Release sequence when the command failed
//! mid-motion or the supervisor raised the cancellation flag.

use tokio::sync::watch;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use rotor_core::controller::{
    repair_action, RepairAction, RepairPolicy, SettleMonitor, SettlePolicy, WaitState,
};
use rotor_core::motion::{
    plan_position, plan_speed, wrap_angle, wrap_delta, MotionPlan, MotionRequest,
};
use rotor_core::table::{status_is_motion, TableMode, TelemetrySample, Turntable};
use rotor_core::DriveError;
use rotor_protocol::ResponseToken;
use rotor_reporting::{ScreenPrinter, TelemetryLog};

/// Acceleration and speed used for `Reset` when the flags are omitted.
const RESET_ACC: f64 = 100.0;
const RESET_SPEED: f64 = 100.0;

/// Command surface consumed from `--command`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Init,
    PositionRun,
    SpeedRun,
    Stop,
    FreeMode,
    Reset,
}

impl Command {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Init" => Some(Self::Init),
            "Position Run" => Some(Self::PositionRun),
            "Speed Run" => Some(Self::SpeedRun),
            "Stop" => Some(Self::Stop),
            "Free Mode" => Some(Self::FreeMode),
            "Reset" => Some(Self::Reset),
            _ => None,
        }
    }

    /// Commands that leave the axis traveling until the monitor settles.
    fn is_positional(self) -> bool {
        matches!(self, Self::PositionRun | Self::Reset)
    }
}

/// Motion parameters from the CLI, validated per command.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionArgs {
    pub acc: Option<f64>,
    pub speed: Option<f64>,
    pub angle: Option<f64>,
}

fn emit(token: ResponseToken) {
    println!("{}", token);
}

pub struct Session {
    table: Box<dyn Turntable>,
    cancel_rx: watch::Receiver<bool>,
    screen: ScreenPrinter,
    csv: Option<TelemetryLog>,
    repair_policy: RepairPolicy,
    settle_policy: SettlePolicy,
    /// Best-known device mode, refreshed from every decoded sample. The
    /// device remains the source of truth; this is diagnostic state only.
    last_mode: Option<TableMode>,
}

impl Session {
    pub fn new(
        table: Box<dyn Turntable>,
        cancel_rx: watch::Receiver<bool>,
        screen: ScreenPrinter,
        csv: Option<TelemetryLog>,
    ) -> Self {
        Self {
            table,
            cancel_rx,
            screen,
            csv,
            repair_policy: RepairPolicy::default(),
            settle_policy: SettlePolicy::default(),
            last_mode: None,
        }
    }

    pub fn with_policies(mut self, repair: RepairPolicy, settle: SettlePolicy) -> Self {
        self.repair_policy = repair;
        self.settle_policy = settle;
        self
    }

    fn cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    fn record_sample(&mut self, sample: &TelemetrySample) {
        if let Some(mode) = sample.mode() {
            self.last_mode = Some(mode);
        }
        if let Some(csv) = self.csv.as_mut() {
            csv.record(sample);
        }
        self.screen.print(sample);
    }

    async fn read_sample(&mut self) -> Result<TelemetrySample, DriveError> {
        let sample = self.table.read_telemetry().await?;
        self.record_sample(&sample);
        Ok(sample)
    }

    /// Execute one command, then release the connection on the single
    /// appropriate teardown path.
    pub async fn execute(mut self, command: Command, args: MotionArgs) -> Result<(), DriveError> {
        let result = self.dispatch(command, args).await;

        if self.cancelled() || matches!(result, Err(DriveError::Interrupted)) {
            self.emergency_stop().await;
        } else if result.is_err() && command.is_positional() {
            // A failed move can leave the axis still traveling.
            self.emergency_stop().await;
        }
        // Dropping the session closes the serial handle exactly once.
        result
    }

    async fn dispatch(&mut self, command: Command, args: MotionArgs) -> Result<(), DriveError> {
        match command {
            Command::Init => {
                self.table.enable().await?;
                emit(ResponseToken::Ok);
                Ok(())
            }
            Command::FreeMode => {
                self.table.release().await?;
                emit(ResponseToken::Ok);
                Ok(())
            }
            Command::Stop => {
                self.table.halt().await?;
                emit(ResponseToken::Ok);
                Ok(())
            }
            Command::SpeedRun => {
                let (Some(acc), Some(speed)) = (args.acc, args.speed) else {
                    return Err(DriveError::Config("Missing params".to_string()));
                };
                self.run_motion(MotionRequest::Speed {
                    acc,
                    speed_deg: speed,
                })
                .await
            }
            Command::PositionRun => {
                let (Some(acc), Some(speed), Some(delta)) = (args.acc, args.speed, args.angle)
                else {
                    return Err(DriveError::Config("Missing params".to_string()));
                };
                self.run_motion(MotionRequest::Position {
                    acc,
                    speed,
                    delta_deg: delta,
                })
                .await
            }
            Command::Reset => {
                let acc = args.acc.unwrap_or(RESET_ACC);
                let speed = args.speed.unwrap_or(RESET_SPEED);
                self.auto_repair().await?;

                let head = self.read_sample().await?;
                if head.has_alarm() {
                    return Err(DriveError::DeviceAlarm(head.alarm));
                }
                // Shortest arc back to absolute zero.
                let wrapped = wrap_angle(head.angle_deg);
                let delta = if wrapped <= 180.0 {
                    -wrapped
                } else {
                    360.0 - wrapped
                };
                let plan = plan_position(head.angle_deg, delta, acc, speed);
                info!("Reset: returning to zero from {:.4}", head.angle_deg);

                self.table.run_position(&plan).await?;
                emit(ResponseToken::Ok);

                let tail = self.await_settle(&plan).await?;
                emit(ResponseToken::Complete);
                emit(ResponseToken::PosTail(tail));
                Ok(())
            }
        }
    }

    /// Auto-repair, then issue the planned motion. Positional intents are
    /// monitored to settlement; speed intents return on acknowledgment.
    async fn run_motion(&mut self, request: MotionRequest) -> Result<(), DriveError> {
        self.auto_repair().await?;

        match request {
            MotionRequest::Speed { acc, speed_deg } => {
                let plan = plan_speed(acc, speed_deg);
                self.table.run_speed(&plan).await?;
                emit(ResponseToken::Ok);
                // Fire-and-forget: the device keeps rotating after exit.
                Ok(())
            }
            MotionRequest::Position {
                acc,
                speed,
                delta_deg,
            } => {
                let head = self.read_sample().await?;
                if head.has_alarm() {
                    return Err(DriveError::DeviceAlarm(head.alarm));
                }
                let plan = plan_position(head.angle_deg, delta_deg, acc, speed);
                info!(
                    "Move: {:?} {:?}, target {:.4}, {} full turns from {:.4}",
                    plan.addressing, plan.direction, plan.target_abs_deg, plan.loops, plan.head_deg
                );

                self.table.run_position(&plan).await?;
                emit(ResponseToken::Ok);
                emit(ResponseToken::PosHead(plan.head_deg));

                let tail = self.await_settle(&plan).await?;
                emit(ResponseToken::Complete);
                emit(ResponseToken::PosTail(tail));
                Ok(())
            }
        }
    }

    /// Bring the axis to an enabled, stationary state.
    ///
    /// Idempotent: an axis already under servo hold and not moving passes
    /// through without a single corrective send.
    async fn auto_repair(&mut self) -> Result<(), DriveError> {
        let deadline = Instant::now() + self.repair_policy.budget;
        let mut prev_angle: Option<f64> = None;

        loop {
            if self.cancelled() {
                return Err(DriveError::Interrupted);
            }
            if Instant::now() >= deadline {
                return Err(DriveError::RepairExhausted);
            }

            let sample = self.read_sample().await?;
            if sample.has_alarm() {
                return Err(DriveError::DeviceAlarm(sample.alarm));
            }

            let drifted = prev_angle
                .map(|prev| {
                    wrap_delta(sample.angle_deg - prev).abs()
                        > self.repair_policy.still_tolerance_deg
                })
                .unwrap_or(false);
            let moving = status_is_motion(sample.status) || drifted;
            prev_angle = Some(sample.angle_deg);

            match repair_action(sample.mode(), moving) {
                RepairAction::Ready => return Ok(()),
                RepairAction::Enable => {
                    info!("Auto-enabling servo");
                    self.table.enable().await?;
                }
                RepairAction::Halt => {
                    info!("Stopping motion before new command");
                    self.table.halt().await?;
                }
                RepairAction::Wait => {}
            }

            time::sleep(self.repair_policy.poll_interval).await;
        }
    }

    /// Drive the settle monitor until the move resolves.
    async fn await_settle(&mut self, plan: &MotionPlan) -> Result<f64, DriveError> {
        let mut monitor = SettleMonitor::new(plan, self.settle_policy.clone());
        let deadline = Instant::now() + self.settle_policy.wait_budget(plan.loops);

        loop {
            // Cancellation wins over whatever the sample would say.
            if self.cancelled() {
                monitor.interrupt();
            } else if Instant::now() >= deadline {
                monitor.note_timeout();
            } else {
                match self.table.read_telemetry().await {
                    Ok(sample) => {
                        self.record_sample(&sample);
                        monitor.observe(&sample);
                    }
                    Err(e) => {
                        debug!("Telemetry read failed: {}", e);
                        monitor.note_read_failure();
                    }
                }
            }

            match monitor.state() {
                WaitState::Settled { angle_deg } => return Ok(*angle_deg),
                WaitState::Failed(e) => return Err(e.clone()),
                WaitState::Interrupted => return Err(DriveError::Interrupted),
                WaitState::AwaitingSettle => {}
            }

            time::sleep(self.settle_policy.poll_interval).await;
        }
    }

    /// Best-effort Halt then Release; failures are logged, never raised.
    async fn emergency_stop(&mut self) {
        info!(
            "Emergency stop (last known mode {:?}): halting axis and releasing servo",
            self.last_mode
        );
        if let Err(e) = self.table.halt().await {
            warn!("Emergency halt failed: {}", e);
        }
        if let Err(e) = self.table.release().await {
            warn!("Emergency release failed: {}", e);
        }
    }
}
