// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! ASCII wire dialect of the turntable: frame tokens, command payloads,
//! and typed response parsing. Pure string handling, no I/O.

pub mod command;
pub mod frame;
pub mod response;

pub use frame::FrameCodec;
pub use response::{parse_line, ResponseToken};
