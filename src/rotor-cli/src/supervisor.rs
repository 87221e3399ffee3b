// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Safety supervisor: watches for the process interrupt signal and raises
//! the session's cancellation flag.
//!
//! The watcher only observes; it never touches the serial link. The
//! session notices the flag at its next poll boundary and, owning the
//! connection, runs the emergency-stop teardown after the in-flight
//! exchange completes.

use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Spawn the interrupt watcher. The returned receiver flips to `true` at
/// most once per process lifetime, on the first Ctrl+C.
pub fn spawn_interrupt_watcher() -> (watch::Receiver<bool>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, requesting emergency stop");
                let _ = tx.send(true);
            }
            Err(e) => warn!("Interrupt handler unavailable: {}", e),
        }
    });
    (rx, handle)
}
