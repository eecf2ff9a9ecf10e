// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Signal Handling
//!
//! Listens for SIGTERM/SIGINT (and SIGHUP on Unix) and drives a
//! [`ShutdownCoordinator`](crate::shutdown::ShutdownCoordinator) so stage
//! binaries stop polling the bus, flush their current batch, and exit
//! cleanly instead of being killed mid-write.

use crate::shutdown::ShutdownCoordinator;

/// Install OS signal handlers that call [`ShutdownCoordinator::initiate_shutdown`].
///
/// Spawns a background task and returns immediately; the task runs for the
/// lifetime of the process.
pub fn install(coordinator: ShutdownCoordinator) {
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("received shutdown signal");
        coordinator.initiate_shutdown();
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    let mut sighup = signal(SignalKind::hangup()).expect("failed to install SIGHUP handler");

    tokio::select! {
        _ = sigterm.recv() => tracing::debug!("signal: SIGTERM"),
        _ = sigint.recv() => tracing::debug!("signal: SIGINT"),
        _ = sighup.recv() => tracing::debug!("signal: SIGHUP"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::debug!("signal: Ctrl-C");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_install_does_not_trigger_shutdown_without_signal() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(1));
        install(coordinator.clone());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!coordinator.is_shutting_down());
    }
}
