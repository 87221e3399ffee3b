// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Settle monitor for positional moves.
//!
//! Explicit state machine fed one observation per poll cycle. The async
//! loop around it owns the clock and the cancellation flag; the machine
//! itself only sees samples, read failures, and the forced transitions.

use crate::error::DriveError;
use crate::motion::{circular_distance, wrap_angle, wrap_delta, Addressing, MotionPlan};
use crate::table::TelemetrySample;

use super::policies::SettlePolicy;

/// State of a position wait.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitState {
    AwaitingSettle,
    /// Terminal success; carries the angle of the settling sample.
    Settled { angle_deg: f64 },
    /// Terminal failure.
    Failed(DriveError),
    /// Terminal, forced by the safety supervisor.
    Interrupted,
}

impl WaitState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::AwaitingSettle)
    }
}

/// Tracks one positional move until it settles, fails, or is interrupted.
pub struct SettleMonitor {
    addressing: Addressing,
    target_abs_deg: f64,
    target_travel_deg: f64,
    policy: SettlePolicy,
    state: WaitState,
    in_tolerance: u32,
    read_failures: u32,
    /// Continuous travel accumulated from wrapped readings. Valid while the
    /// per-sample arc stays under half a revolution, which the protocol's
    /// speed ceiling guarantees at the default poll interval.
    travel_deg: f64,
    last_wrapped_deg: f64,
}

impl SettleMonitor {
    pub fn new(plan: &MotionPlan, policy: SettlePolicy) -> Self {
        Self {
            addressing: plan.addressing,
            target_abs_deg: plan.target_abs_deg,
            target_travel_deg: plan.travel_deg,
            policy,
            state: WaitState::AwaitingSettle,
            in_tolerance: 0,
            read_failures: 0,
            travel_deg: 0.0,
            last_wrapped_deg: wrap_angle(plan.head_deg),
        }
    }

    pub fn state(&self) -> &WaitState {
        &self.state
    }

    /// Feed one decoded telemetry sample.
    pub fn observe(&mut self, sample: &TelemetrySample) -> &WaitState {
        if self.state.is_terminal() {
            return &self.state;
        }
        self.read_failures = 0;

        if sample.has_alarm() {
            self.state = WaitState::Failed(DriveError::DeviceAlarm(sample.alarm));
            return &self.state;
        }

        let wrapped = wrap_angle(sample.angle_deg);
        self.travel_deg += wrap_delta(wrapped - self.last_wrapped_deg);
        self.last_wrapped_deg = wrapped;

        let deviation = match self.addressing {
            Addressing::SingleTurn => circular_distance(sample.angle_deg, self.target_abs_deg),
            Addressing::MultiTurn => (self.travel_deg - self.target_travel_deg).abs(),
        };

        if deviation <= self.policy.tolerance_deg {
            self.in_tolerance += 1;
            if self.in_tolerance >= self.policy.settle_samples {
                self.state = WaitState::Settled {
                    angle_deg: sample.angle_deg,
                };
            }
        } else {
            self.in_tolerance = 0;
        }
        &self.state
    }

    /// Record a failed telemetry read.
    pub fn note_read_failure(&mut self) -> &WaitState {
        if self.state.is_terminal() {
            return &self.state;
        }
        self.read_failures += 1;
        if self.read_failures >= self.policy.max_read_failures {
            self.state = WaitState::Failed(DriveError::get_data_failed());
        }
        &self.state
    }

    /// The wall-clock budget elapsed without settling.
    pub fn note_timeout(&mut self) -> &WaitState {
        if !self.state.is_terminal() {
            self.state = WaitState::Failed(DriveError::CompletionTimeout);
        }
        &self.state
    }

    /// The cancellation flag was observed at a poll boundary.
    pub fn interrupt(&mut self) -> &WaitState {
        if !self.state.is_terminal() {
            self.state = WaitState::Interrupted;
        }
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::plan_position;
    use chrono::Utc;

    fn sample(status: u8, alarm: u8, angle_deg: f64) -> TelemetrySample {
        TelemetrySample {
            timestamp: Utc::now(),
            status,
            alarm,
            angle_deg,
        }
    }

    fn default_policy() -> SettlePolicy {
        SettlePolicy::default()
    }

    #[test]
    fn test_single_turn_settles_after_debounce() {
        let plan = plan_position(30.0, 90.0, 100.0, 100.0);
        let mut monitor = SettleMonitor::new(&plan, default_policy());

        // Still moving toward 120.
        assert_eq!(*monitor.observe(&sample(2, 0, 60.0)), WaitState::AwaitingSettle);
        assert_eq!(*monitor.observe(&sample(2, 0, 110.0)), WaitState::AwaitingSettle);
        // First touch of the target is not enough.
        assert_eq!(*monitor.observe(&sample(1, 0, 120.0)), WaitState::AwaitingSettle);
        assert_eq!(*monitor.observe(&sample(1, 0, 120.01)), WaitState::AwaitingSettle);
        match monitor.observe(&sample(1, 0, 120.0)) {
            WaitState::Settled { angle_deg } => assert!((angle_deg - 120.0).abs() < 1e-9),
            other => panic!("expected Settled, got {:?}", other),
        }
    }

    #[test]
    fn test_debounce_resets_on_excursion() {
        let plan = plan_position(0.0, 10.0, 100.0, 100.0);
        let mut monitor = SettleMonitor::new(&plan, default_policy());

        monitor.observe(&sample(2, 0, 10.0));
        monitor.observe(&sample(2, 0, 10.0));
        // Overshoot past tolerance clears the streak.
        monitor.observe(&sample(2, 0, 10.5));
        monitor.observe(&sample(1, 0, 10.0));
        monitor.observe(&sample(1, 0, 10.0));
        assert_eq!(*monitor.state(), WaitState::AwaitingSettle);
        assert!(monitor.observe(&sample(1, 0, 10.0)).is_terminal());
    }

    #[test]
    fn test_multi_turn_tracks_travel_across_wraps() {
        // Two full turns: target travel 720, remainder 0.
        let plan = plan_position(0.0, 720.1, 100.0, 100.0);
        assert_eq!(plan.addressing, Addressing::MultiTurn);
        let mut monitor = SettleMonitor::new(&plan, default_policy());

        // Spiral up in 120-degree steps; wrapped readings repeat.
        for angle in [120.0, 240.0, 0.0, 120.0, 240.0] {
            assert_eq!(*monitor.observe(&sample(5, 0, angle)), WaitState::AwaitingSettle);
        }
        // Travel now 600; the remaining arc brings it to ~720.1.
        monitor.observe(&sample(5, 0, 0.1));
        monitor.observe(&sample(1, 0, 0.1));
        match monitor.observe(&sample(1, 0, 0.1)) {
            WaitState::Settled { angle_deg } => assert!((angle_deg - 0.1).abs() < 1e-9),
            other => panic!("expected Settled, got {:?}", other),
        }
    }

    #[test]
    fn test_read_failure_budget() {
        let plan = plan_position(0.0, 90.0, 100.0, 100.0);
        let mut monitor = SettleMonitor::new(&plan, default_policy());

        for _ in 0..4 {
            assert_eq!(*monitor.note_read_failure(), WaitState::AwaitingSettle);
        }
        assert_eq!(
            *monitor.note_read_failure(),
            WaitState::Failed(DriveError::get_data_failed())
        );
    }

    #[test]
    fn test_successful_read_resets_failure_count() {
        let plan = plan_position(0.0, 90.0, 100.0, 100.0);
        let mut monitor = SettleMonitor::new(&plan, default_policy());

        for _ in 0..4 {
            monitor.note_read_failure();
        }
        monitor.observe(&sample(2, 0, 45.0));
        for _ in 0..4 {
            assert_eq!(*monitor.note_read_failure(), WaitState::AwaitingSettle);
        }
    }

    #[test]
    fn test_interrupt_wins_over_settling_sample() {
        let plan = plan_position(0.0, 90.0, 100.0, 100.0);
        let mut monitor = SettleMonitor::new(&plan, default_policy());

        monitor.observe(&sample(1, 0, 90.0));
        monitor.observe(&sample(1, 0, 90.0));
        assert_eq!(*monitor.interrupt(), WaitState::Interrupted);
        // Terminal state is sticky; further samples change nothing.
        assert_eq!(*monitor.observe(&sample(1, 0, 90.0)), WaitState::Interrupted);
    }

    #[test]
    fn test_timeout_and_alarm() {
        let plan = plan_position(0.0, 90.0, 100.0, 100.0);
        let mut monitor = SettleMonitor::new(&plan, default_policy());
        monitor.observe(&sample(2, 4, 10.0));
        assert_eq!(*monitor.state(), WaitState::Failed(DriveError::DeviceAlarm(4)));

        let mut monitor = SettleMonitor::new(&plan, default_policy());
        assert_eq!(
            *monitor.note_timeout(),
            WaitState::Failed(DriveError::CompletionTimeout)
        );
    }
}
