// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound events
//! and captured outbound messages and callback answers for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use stravach_core::StravachError;
use stravach_core::traits::{ChannelAdapter, PluginAdapter};
use stravach_core::types::{
    AdapterType, HealthStatus, InboundMessage, MessageId, OutboundMessage,
};

/// A recorded `answer_callback` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackAnswer {
    pub query_id: String,
    pub text: Option<String>,
}

/// A mock chat transport for testing.
///
/// Provides two queues:
/// - **inbound**: events injected via `inject_message()` are returned by `receive()`
/// - **sent**: messages passed to `send()` are captured and retrievable via `sent_messages()`
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<InboundMessage>>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    answers: Arc<Mutex<Vec<CallbackAnswer>>>,
    notify: Arc<Notify>,
    closed: AtomicBool,
    next_id: AtomicU64,
}

impl MockChannel {
    /// Create a new mock channel with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            answers: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            closed: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }

    /// Inject an inbound event into the receive queue.
    pub async fn inject_message(&self, msg: InboundMessage) {
        self.inbound.lock().await.push_back(msg);
        self.notify.notify_one();
    }

    /// Make `receive()` fail once the inbound queue is empty.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Get all messages that were sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Get the count of sent messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Text of the most recent sent message.
    pub async fn last_text(&self) -> Option<String> {
        self.sent.lock().await.last().map(|m| m.text.clone())
    }

    /// Clear all sent messages.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    pub async fn callback_answers(&self) -> Vec<CallbackAnswer> {
        self.answers.lock().await.clone()
    }

    /// Poll until at least `count` messages were sent. Returns false on timeout.
    pub async fn wait_for_sent(&self, count: usize, timeout: Duration) -> bool {
        let wait = async {
            while self.sent_count().await < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, StravachError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), StravachError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), StravachError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, StravachError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().await.push(msg);
        Ok(MessageId(format!("mock-msg-{id}")))
    }

    async fn receive(&self) -> Result<InboundMessage, StravachError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(msg) = queue.pop_front() {
                    return Ok(msg);
                }
            }
            if self.closed.load(Ordering::SeqCst) {
                return Err(StravachError::Channel {
                    message: "mock channel closed".into(),
                    source: None,
                });
            }
            self.notify.notified().await;
        }
    }

    async fn answer_callback(
        &self,
        query_id: &str,
        text: Option<&str>,
    ) -> Result<(), StravachError> {
        self.answers.lock().await.push(CallbackAnswer {
            query_id: query_id.to_string(),
            text: text.map(str::to_string),
        });
        Ok(())
    }
}
