// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Motion planning: turning a requested angle increment or speed into the
//! concrete device command parameters, including the single-turn vs.
//! multi-turn addressing decision.

use tracing::warn;

/// Protocol field bounds.
pub const ACC_MIN: i64 = 1;
pub const ACC_MAX: i64 = 1000;
pub const SPEED_MIN: f64 = 0.0001;
pub const SPEED_MAX: f64 = 1000.0;
/// The multi-turn command carries a two-digit turn count.
pub const LOOPS_MAX: u16 = 99;

/// High-level motion intent as received from the command surface.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionRequest {
    Position { acc: f64, speed: f64, delta_deg: f64 },
    Speed { acc: f64, speed_deg: f64 },
}

/// Rotation direction on the wire: clockwise is 0, counter-clockwise is 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Cw,
    Ccw,
}

impl Direction {
    pub fn code(self) -> u8 {
        match self {
            Self::Cw => 0,
            Self::Ccw => 1,
        }
    }
}

/// Device addressing mode for a positional move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// Target interpreted modulo one revolution.
    SingleTurn,
    /// Commanded delta may span revolutions; the device tracks turn count.
    MultiTurn,
}

/// Concrete positional command parameters, ready for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionPlan {
    pub addressing: Addressing,
    pub direction: Direction,
    /// Clamped integer acceleration, 1..=1000.
    pub acc: u16,
    /// Clamped speed in degrees per second.
    pub speed_deg: f64,
    /// Wrapped absolute device target in [0, 360).
    pub target_abs_deg: f64,
    /// Full turns commanded (zero for single-turn addressing).
    pub loops: u16,
    /// Absolute angle sampled when the plan was made.
    pub head_deg: f64,
    /// Signed travel actually commanded after clamping. The completion
    /// monitor tracks this, not the raw request.
    pub travel_deg: f64,
}

/// Concrete speed command parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedPlan {
    pub direction: Direction,
    pub acc: u16,
    pub speed_deg: f64,
}

/// Normalize an angle to [0, 360).
pub fn wrap_angle(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Shortest signed arc from one wrapped angle reading to the next,
/// in (-180, 180].
pub fn wrap_delta(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Unsigned circular distance between two angles, in [0, 180].
pub fn circular_distance(a_deg: f64, b_deg: f64) -> f64 {
    wrap_delta(a_deg - b_deg).abs()
}

pub fn clamp_acc(acc: f64) -> u16 {
    (acc as i64).clamp(ACC_MIN, ACC_MAX) as u16
}

pub fn clamp_speed(speed: f64) -> f64 {
    speed.max(SPEED_MIN).min(SPEED_MAX)
}

/// Plan a positional move of `delta_deg` from the sampled `current_deg`.
///
/// Increments of at most one revolution select single-turn addressing; the
/// device wraps the absolute target within the current revolution. Larger
/// increments select multi-turn addressing with the full-turn count in the
/// command, capped at the protocol's two-digit limit.
pub fn plan_position(current_deg: f64, delta_deg: f64, acc: f64, speed: f64) -> MotionPlan {
    let direction = if delta_deg >= 0.0 {
        Direction::Cw
    } else {
        Direction::Ccw
    };
    let abs_delta = delta_deg.abs();

    let (addressing, loops, remainder) = if abs_delta <= 360.0 {
        (Addressing::SingleTurn, 0u16, abs_delta)
    } else {
        let full_turns = (abs_delta / 360.0).floor() as u64;
        let loops = if full_turns > u64::from(LOOPS_MAX) {
            warn!(
                "Requested {} full turns exceeds the protocol limit, capping at {}",
                full_turns, LOOPS_MAX
            );
            LOOPS_MAX
        } else {
            full_turns as u16
        };
        (Addressing::MultiTurn, loops, abs_delta % 360.0)
    };

    let sign = match direction {
        Direction::Cw => 1.0,
        Direction::Ccw => -1.0,
    };
    let target_abs_deg = wrap_angle(current_deg + sign * remainder);
    let travel_deg = sign * (f64::from(loops) * 360.0 + remainder);

    MotionPlan {
        addressing,
        direction,
        acc: clamp_acc(acc),
        speed_deg: clamp_speed(speed),
        target_abs_deg,
        loops,
        head_deg: current_deg,
        travel_deg,
    }
}

/// Plan a continuous rotation. The protocol only drives speed runs
/// clockwise; the rate and acceleration are clamped to the field bounds.
pub fn plan_speed(acc: f64, speed: f64) -> SpeedPlan {
    SpeedPlan {
        direction: Direction::Cw,
        acc: clamp_acc(acc),
        speed_deg: clamp_speed(speed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_turn_selected_up_to_one_revolution() {
        for delta in [0.0, 1.0, 90.0, 359.9, 360.0, -360.0, -45.0] {
            let plan = plan_position(0.0, delta, 100.0, 100.0);
            assert_eq!(
                plan.addressing,
                Addressing::SingleTurn,
                "delta {} should be single-turn",
                delta
            );
            assert_eq!(plan.loops, 0);
        }
    }

    #[test]
    fn test_multi_turn_selected_beyond_one_revolution() {
        for delta in [360.1, 400.0, 720.0, -1000.0] {
            let plan = plan_position(0.0, delta, 100.0, 100.0);
            assert_eq!(
                plan.addressing,
                Addressing::MultiTurn,
                "delta {} should be multi-turn",
                delta
            );
            assert!(plan.loops >= 1);
        }
    }

    #[test]
    fn test_direction_from_delta_sign() {
        assert_eq!(plan_position(0.0, 90.0, 100.0, 100.0).direction, Direction::Cw);
        assert_eq!(plan_position(0.0, -90.0, 100.0, 100.0).direction, Direction::Ccw);
        assert_eq!(Direction::Cw.code(), 0);
        assert_eq!(Direction::Ccw.code(), 1);
    }

    #[test]
    fn test_target_wraps_into_one_revolution() {
        let plan = plan_position(300.0, 90.0, 100.0, 100.0);
        assert!((plan.target_abs_deg - 30.0).abs() < 1e-9);

        let plan = plan_position(30.0, -90.0, 100.0, 100.0);
        assert!((plan.target_abs_deg - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_hundred_turns_capped_to_protocol_limit() {
        // 36000 degrees is 100 full turns; the two-digit field caps at 99.
        let plan = plan_position(0.0, 36000.0, 100.0, 100.0);
        assert_eq!(plan.addressing, Addressing::MultiTurn);
        assert_eq!(plan.loops, 99);
        assert!((plan.target_abs_deg - 0.0).abs() < 1e-9);
        assert!((plan.travel_deg - 99.0 * 360.0).abs() < 1e-9);
    }

    #[test]
    fn test_multi_turn_remainder_and_travel() {
        let plan = plan_position(10.0, -750.0, 100.0, 100.0);
        assert_eq!(plan.addressing, Addressing::MultiTurn);
        assert_eq!(plan.direction, Direction::Ccw);
        assert_eq!(plan.loops, 2);
        assert!((plan.target_abs_deg - wrap_angle(10.0 - 30.0)).abs() < 1e-9);
        assert!((plan.travel_deg + 750.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamping_bounds() {
        assert_eq!(clamp_acc(0.0), 1);
        assert_eq!(clamp_acc(100.7), 100);
        assert_eq!(clamp_acc(5000.0), 1000);
        assert!((clamp_speed(0.0) - SPEED_MIN).abs() < 1e-12);
        assert!((clamp_speed(2000.0) - SPEED_MAX).abs() < 1e-12);
        assert!((clamp_speed(50.0) - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_wrap_helpers() {
        assert!((wrap_angle(370.0) - 10.0).abs() < 1e-9);
        assert!((wrap_angle(-30.0) - 330.0).abs() < 1e-9);
        assert!((wrap_delta(350.0) + 10.0).abs() < 1e-9);
        assert!((wrap_delta(-350.0) - 10.0).abs() < 1e-9);
        assert!((circular_distance(359.0, 1.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_speed_plan_clamps_only() {
        let plan = plan_speed(10.0, 50.0);
        assert_eq!(plan.direction, Direction::Cw);
        assert_eq!(plan.acc, 10);
        assert!((plan.speed_deg - 50.0).abs() < 1e-12);
    }
}
