// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Drive controller components.
//!
//! The pure decision logic lives here (repair transition table, settle
//! state machine, operational policies); the async loops that drive it
//! against a backend live in the binary.

pub mod machine;
pub mod monitor;
pub mod policies;

pub use machine::{repair_action, RepairAction};
pub use monitor::{SettleMonitor, WaitState};
pub use policies::{RepairPolicy, SettlePolicy};
