// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock name suggester with scripted responses.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use stravach_core::error::StravachError;
use stravach_core::traits::{NameSuggester, PluginAdapter};
use stravach_core::types::{ActivityId, AdapterType, HealthStatus, UserActivity};

/// One recorded generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestCall {
    pub activity_id: ActivityId,
    pub language: String,
    pub prompt: Option<String>,
}

#[derive(Default)]
struct State {
    scripted: VecDeque<Result<Vec<String>, String>>,
    calls: Vec<SuggestCall>,
    delay: Option<Duration>,
}

/// A [`NameSuggester`] that replays scripted responses in order, then falls
/// back to [`MockSuggester::DEFAULT_NAMES`].
#[derive(Default)]
pub struct MockSuggester {
    state: Mutex<State>,
}

impl MockSuggester {
    pub const DEFAULT_NAMES: [&'static str; 3] =
        ["Sunrise Sprint", "Dawn Patrol", "Tempo Tantrum"];

    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a successful response.
    pub fn push_names(&self, names: &[&str]) {
        self.state()
            .scripted
            .push_back(Ok(names.iter().map(|n| n.to_string()).collect()));
    }

    /// Queue a `GenerationFailed` response.
    pub fn push_failure(&self, message: &str) {
        self.state().scripted.push_back(Err(message.to_string()));
    }

    /// Sleep this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<SuggestCall> {
        self.state().calls.clone()
    }

    async fn respond(
        &self,
        activity: &UserActivity,
        language: &str,
        prompt: Option<&str>,
    ) -> Result<Vec<String>, StravachError> {
        let (delay, next) = {
            let mut state = self.state();
            state.calls.push(SuggestCall {
                activity_id: activity.id,
                language: language.to_string(),
                prompt: prompt.map(str::to_string),
            });
            (state.delay, state.scripted.pop_front())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match next {
            Some(Ok(names)) => Ok(names),
            Some(Err(message)) => Err(StravachError::GenerationFailed { message }),
            None => Ok(Self::DEFAULT_NAMES.iter().map(|n| n.to_string()).collect()),
        }
    }
}

#[async_trait]
impl PluginAdapter for MockSuggester {
    fn name(&self) -> &str {
        "mock-suggester"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Suggester
    }

    async fn health_check(&self) -> Result<HealthStatus, StravachError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), StravachError> {
        Ok(())
    }
}

#[async_trait]
impl NameSuggester for MockSuggester {
    async fn generate(
        &self,
        activity: &UserActivity,
        language: &str,
    ) -> Result<Vec<String>, StravachError> {
        self.respond(activity, language, None).await
    }

    async fn generate_with_prompt(
        &self,
        activity: &UserActivity,
        language: &str,
        prompt: &str,
    ) -> Result<Vec<String>, StravachError> {
        self.respond(activity, language, Some(prompt)).await
    }
}
