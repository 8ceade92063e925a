// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end rename workflow tests.
//!
//! `TestHarness` wires a [`RenameEngine`] over the in-memory adapters. Tests
//! can either drive it step by step (`process_queue`, `send_callback`,
//! `send_text`) or take the queue receiver and run the real loops.

use std::sync::Arc;
use std::time::Duration;

use stravach_core::types::{ActivityForUpdate, ChatId, User, UserActivity};
use stravach_rename::queue::{EnqueueOutcome, QueueReceiver};
use stravach_rename::{EngineSettings, RenameEngine, rename_queue};

use crate::fixtures;
use crate::memory_storage::MemoryStorage;
use crate::mock_channel::MockChannel;
use crate::mock_strava::MockStrava;
use crate::mock_suggester::MockSuggester;
use crate::OpLog;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    queue_capacity: usize,
    enqueue_timeout: Duration,
    step_timeout: Duration,
    max_options: usize,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            queue_capacity: 16,
            enqueue_timeout: Duration::from_millis(100),
            step_timeout: Duration::from_secs(5),
            max_options: 9,
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub fn with_max_options(mut self, max: usize) -> Self {
        self.max_options = max;
        self
    }

    pub fn build(self) -> TestHarness {
        let log = OpLog::new();
        let channel = Arc::new(MockChannel::new());
        let storage = Arc::new(MemoryStorage::new().with_log(log.clone()));
        let strava = Arc::new(MockStrava::new().with_log(log.clone()));
        let suggester = Arc::new(MockSuggester::new());
        let (queue, receiver) = rename_queue(self.queue_capacity, self.enqueue_timeout);

        let engine = Arc::new(RenameEngine::new(
            channel.clone(),
            storage.clone(),
            strava.clone(),
            suggester.clone(),
            queue,
            EngineSettings {
                step_timeout: self.step_timeout,
                max_options: self.max_options,
                public_url: "https://bot.example.com".into(),
            },
        ));

        TestHarness {
            channel,
            storage,
            strava,
            suggester,
            log,
            engine,
            receiver: Some(receiver),
        }
    }
}

/// A rename engine over mock adapters.
pub struct TestHarness {
    pub channel: Arc<MockChannel>,
    pub storage: Arc<MemoryStorage>,
    pub strava: Arc<MockStrava>,
    pub suggester: Arc<MockSuggester>,
    /// Shared by `storage` and `strava`.
    pub log: OpLog,
    pub engine: Arc<RenameEngine>,
    receiver: Option<QueueReceiver>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Register an authorized user for `chat_id`.
    pub fn seed_user(&self, chat_id: ChatId) -> User {
        self.storage.insert_user(fixtures::user(chat_id))
    }

    /// Store an activity both locally and upstream.
    pub fn seed_activity(&self, id: i64, user_id: i64, name: &str) -> UserActivity {
        let activity = fixtures::activity(id, user_id, name);
        self.storage.insert_activity(activity.clone());
        self.strava.insert_activity(activity.clone());
        activity
    }

    pub async fn enqueue(&self, activity: UserActivity, chat_id: ChatId) -> EnqueueOutcome {
        self.engine
            .ingestion()
            .queue()
            .enqueue(ActivityForUpdate { activity, chat_id })
            .await
    }

    /// Run the consumer step for every queued event. Returns how many ran.
    ///
    /// Panics if the receiver was taken.
    pub async fn process_queue(&mut self) -> usize {
        let receiver = self
            .receiver
            .as_mut()
            .expect("queue receiver was taken by take_receiver");
        let mut processed = 0;
        while let Some(item) = receiver.try_recv() {
            self.engine.offer_suggestions(item).await;
            processed += 1;
        }
        processed
    }

    /// Hand the queue receiver to a real consumer loop.
    pub fn take_receiver(&mut self) -> Option<QueueReceiver> {
        self.receiver.take()
    }

    pub async fn send_callback(&self, chat_id: ChatId, data: &str) {
        self.engine
            .handle_inbound(fixtures::callback(chat_id, data))
            .await;
    }

    pub async fn send_text(&self, chat_id: ChatId, text: &str) {
        self.engine.handle_inbound(fixtures::text(chat_id, text)).await;
    }
}
