// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded rename queue between producers (webhooks, manual triggers,
//! regenerate taps) and the single consumer loop.
//!
//! A producer blocks for at most the configured enqueue timeout when the
//! queue is full, then drops the event with a warning. A (chat, activity)
//! pair that is already waiting in the queue is not enqueued twice.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use stravach_core::types::{ActivityForUpdate, ActivityId, ChatId};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tracing::{debug, warn};

type PendingKey = (ChatId, ActivityId);

/// What happened to an enqueue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Enqueued,
    /// The same pair is already waiting to be consumed.
    Duplicate,
    /// The queue stayed full (or closed) for the whole enqueue timeout.
    Dropped,
}

/// Producer handle. Cheap to clone.
#[derive(Clone)]
pub struct RenameQueue {
    tx: mpsc::Sender<ActivityForUpdate>,
    pending: Arc<DashSet<PendingKey>>,
    enqueue_timeout: Duration,
}

/// Consumer handle, owned by the consumer loop.
pub struct QueueReceiver {
    rx: mpsc::Receiver<ActivityForUpdate>,
    pending: Arc<DashSet<PendingKey>>,
}

/// Create a queue holding at most `capacity` events.
pub fn rename_queue(capacity: usize, enqueue_timeout: Duration) -> (RenameQueue, QueueReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let pending = Arc::new(DashSet::new());
    (
        RenameQueue {
            tx,
            pending: Arc::clone(&pending),
            enqueue_timeout,
        },
        QueueReceiver { rx, pending },
    )
}

impl RenameQueue {
    pub async fn enqueue(&self, item: ActivityForUpdate) -> EnqueueOutcome {
        let key = (item.chat_id, item.activity.id);
        if !self.pending.insert(key) {
            debug!(
                chat_id = key.0,
                activity_id = key.1,
                "activity already queued, skipping duplicate"
            );
            return EnqueueOutcome::Duplicate;
        }

        match self.tx.send_timeout(item, self.enqueue_timeout).await {
            Ok(()) => {
                debug!(chat_id = key.0, activity_id = key.1, "activity queued for rename");
                EnqueueOutcome::Enqueued
            }
            Err(SendTimeoutError::Timeout(_)) => {
                self.pending.remove(&key);
                warn!(
                    chat_id = key.0,
                    activity_id = key.1,
                    timeout_ms = self.enqueue_timeout.as_millis() as u64,
                    "rename queue full, dropping activity"
                );
                EnqueueOutcome::Dropped
            }
            Err(SendTimeoutError::Closed(_)) => {
                self.pending.remove(&key);
                warn!(
                    chat_id = key.0,
                    activity_id = key.1,
                    "rename queue closed, dropping activity"
                );
                EnqueueOutcome::Dropped
            }
        }
    }

    /// Number of events waiting to be consumed.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl QueueReceiver {
    /// Wait for the next event. `None` once every producer is gone.
    pub async fn recv(&mut self) -> Option<ActivityForUpdate> {
        let item = self.rx.recv().await?;
        self.pending.remove(&(item.chat_id, item.activity.id));
        Some(item)
    }

    /// Take the next event if one is ready.
    pub fn try_recv(&mut self) -> Option<ActivityForUpdate> {
        let item = self.rx.try_recv().ok()?;
        self.pending.remove(&(item.chat_id, item.activity.id));
        Some(item)
    }
}
