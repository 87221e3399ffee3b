// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Command payload builders.
//!
//! Field widths are fixed by the protocol: four-digit acceleration,
//! nine-character speed (`%09.4f`), eight-character angle (`%08.4f`),
//! two-digit turn count. Values reaching this module are already clamped
//! by the motion planner.

use rotor_core::motion::{Addressing, MotionPlan, SpeedPlan};

/// Status query; the device answers with one telemetry frame.
pub const STATUS_QUERY: &str = "gs";
/// Engage the servo.
pub const ENABLE: &str = "mo=1";
/// Release the servo.
pub const RELEASE: &str = "mo=0";
/// Halt motion.
pub const HALT: &str = "st";

/// Mode 3: continuous rotation.
pub fn speed_run(plan: &SpeedPlan) -> String {
    format!(
        "3{}{:04}{:09.4}",
        plan.direction.code(),
        plan.acc,
        plan.speed_deg
    )
}

/// Mode 2 (single-turn) or mode 5 (multi-turn) positional move.
pub fn position_run(plan: &MotionPlan) -> String {
    match plan.addressing {
        Addressing::SingleTurn => format!(
            "2{}{:04}{:09.4}{:08.4}",
            plan.direction.code(),
            plan.acc,
            plan.speed_deg,
            plan.target_abs_deg
        ),
        Addressing::MultiTurn => format!(
            "5{}{:04}{:09.4}{:08.4}{:02}",
            plan.direction.code(),
            plan.acc,
            plan.speed_deg,
            plan.target_abs_deg,
            plan.loops
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotor_core::motion::{plan_position, plan_speed};

    #[test]
    fn test_speed_run_layout() {
        let plan = plan_speed(10.0, 50.0);
        assert_eq!(speed_run(&plan), "3000100050.0000");
    }

    #[test]
    fn test_single_turn_layout() {
        let plan = plan_position(30.0, 90.0, 100.0, 100.0);
        assert_eq!(position_run(&plan), "2001000100.0000120.0000");
    }

    #[test]
    fn test_multi_turn_layout() {
        // 100 turns caps at 99; remainder lands back on the head angle.
        let plan = plan_position(0.0, 36000.0, 100.0, 100.0);
        assert_eq!(position_run(&plan), "5001000100.0000000.000099");
    }

    #[test]
    fn test_counter_clockwise_direction_digit() {
        let plan = plan_position(30.0, -90.0, 100.0, 100.0);
        assert_eq!(position_run(&plan), "2101000100.0000300.0000");
    }
}
