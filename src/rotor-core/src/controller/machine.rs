// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Auto-repair transition table.
//!
//! Before any motion-affecting command the axis must be enabled and
//! stationary. The corrective step is a deterministic function of the
//! reported mode and the movement judgement, encoded here as an explicit
//! table rather than ad hoc branching in the command handlers.

use crate::table::TableMode;

/// Corrective step required before the axis may accept a motion command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairAction {
    /// Enabled and stationary; nothing to do.
    Ready,
    /// Servo released; send the enable command and wait for its ack.
    Enable,
    /// A motion mode is active; send the halt command.
    Halt,
    /// Transitional state (busy digit, or decelerating under servo hold);
    /// poll again after one interval.
    Wait,
}

/// Decide the corrective step for one telemetry reading.
///
/// `moving` is the caller's movement judgement: a motion status digit, or
/// an angle delta above the stillness tolerance between consecutive
/// samples.
pub fn repair_action(mode: Option<TableMode>, moving: bool) -> RepairAction {
    match (mode, moving) {
        (Some(TableMode::Free), _) => RepairAction::Enable,
        (Some(TableMode::ServoHold), false) => RepairAction::Ready,
        (Some(TableMode::ServoHold), true) => RepairAction::Wait,
        // Remaining decoded modes are all motion modes.
        (Some(_), _) => RepairAction::Halt,
        (None, true) => RepairAction::Halt,
        (None, false) => RepairAction::Wait,
    }
}
