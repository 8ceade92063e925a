// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Stravach integration tests.
//!
//! Provides in-memory adapters and a test harness for fast, deterministic
//! tests without Telegram, Strava, an LLM endpoint or a database.
//!
//! # Components
//!
//! - [`MockChannel`] - chat transport with event injection and capture
//! - [`MockSuggester`] - scripted name suggestions
//! - [`MockStrava`] - in-memory upstream with failure toggles
//! - [`MemoryStorage`] - in-memory persistence with failure injection
//! - [`OpLog`] - shared operation log for ordering assertions
//! - [`TestHarness`] - a fully wired rename engine over the mocks

pub mod fixtures;
pub mod harness;
pub mod memory_storage;
pub mod mock_channel;
pub mod mock_strava;
pub mod mock_suggester;

use std::sync::{Arc, Mutex, PoisonError};

pub use harness::TestHarness;
pub use memory_storage::MemoryStorage;
pub use mock_channel::MockChannel;
pub use mock_strava::MockStrava;
pub use mock_suggester::{MockSuggester, SuggestCall};

/// Append-only log shared between mocks to assert call ordering.
#[derive(Debug, Clone, Default)]
pub struct OpLog(Arc<Mutex<Vec<String>>>);

impl OpLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Position of the first entry equal to `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }
}
