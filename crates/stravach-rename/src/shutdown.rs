// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! A SIGTERM or SIGINT cancels a [`CancellationToken`] watched by the
//! consumer loop and the inbound dispatcher. In-flight inbound handlers are
//! drained before the process exits.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            error!(error = %e, "failed to install SIGTERM handler, only Ctrl+C will stop the bot");
            let _ = tokio::signal::ctrl_c().await;
            info!("received SIGINT (Ctrl+C), initiating shutdown");
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received SIGINT (Ctrl+C), initiating shutdown");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, initiating shutdown");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received Ctrl+C, initiating shutdown");
}

/// Waits up to `timeout` for tracked inbound handlers to finish.
pub async fn drain_tasks(tracker: &TaskTracker, timeout: Duration) {
    tracker.close();
    if tracker.is_empty() {
        info!("no in-flight handlers to drain");
        return;
    }

    info!(count = tracker.len(), "waiting for in-flight handlers to complete");
    if tokio::time::timeout(timeout, tracker.wait()).await.is_err() {
        warn!(
            remaining = tracker.len(),
            "drain timeout reached, abandoning remaining handlers"
        );
    } else {
        info!("all in-flight handlers drained");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drain_returns_immediately_when_idle() {
        let tracker = TaskTracker::new();
        drain_tasks(&tracker, Duration::from_secs(5)).await;
        assert!(tracker.is_closed());
    }

    #[tokio::test]
    async fn drain_waits_for_running_handlers() {
        let tracker = TaskTracker::new();
        let (tx, rx) = tokio::sync::oneshot::channel();
        tracker.spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(());
        });

        drain_tasks(&tracker, Duration::from_secs(5)).await;
        assert!(rx.await.is_ok());
        assert!(tracker.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn drain_gives_up_after_timeout() {
        let tracker = TaskTracker::new();
        tracker.spawn(std::future::pending::<()>());

        drain_tasks(&tracker, Duration::from_secs(1)).await;
        assert_eq!(tracker.len(), 1);
    }
}
