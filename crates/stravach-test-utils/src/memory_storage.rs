// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory persistence store with failure injection.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use stravach_core::error::StravachError;
use stravach_core::traits::{PluginAdapter, StorageAdapter};
use stravach_core::types::{ActivityId, AdapterType, ChatId, HealthStatus, User, UserActivity};

use crate::OpLog;

#[derive(Default)]
struct State {
    users: BTreeMap<i64, User>,
    activities: BTreeMap<ActivityId, UserActivity>,
    next_user_id: i64,
    fail_update_user: bool,
    fail_update_activity: bool,
}

/// A [`StorageAdapter`] backed by maps.
///
/// Mutating trait calls are recorded in the optional [`OpLog`] as
/// `storage.<operation>:<id>`. The synchronous helpers (`insert_*`, getters)
/// bypass both the log and failure injection.
#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
    log: Option<OpLog>,
}

fn injected(operation: &str) -> StravachError {
    StravachError::storage(std::io::Error::other(format!(
        "injected {operation} failure"
    )))
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(mut self, log: OpLog) -> Self {
        self.log = Some(log);
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, entry: String) {
        if let Some(log) = &self.log {
            log.push(entry);
        }
    }

    /// Insert a user, assigning the next id. Returns the stored user.
    pub fn insert_user(&self, mut user: User) -> User {
        let mut state = self.state();
        state.next_user_id += 1;
        user.id = state.next_user_id;
        state.users.insert(user.id, user.clone());
        user
    }

    pub fn insert_activity(&self, activity: UserActivity) {
        self.state().activities.insert(activity.id, activity);
    }

    pub fn user_by_chat(&self, chat_id: ChatId) -> Option<User> {
        self.state()
            .users
            .values()
            .find(|u| u.chat_id == chat_id)
            .cloned()
    }

    pub fn activity(&self, id: ActivityId) -> Option<UserActivity> {
        self.state().activities.get(&id).cloned()
    }

    pub fn activity_count(&self) -> usize {
        self.state().activities.len()
    }

    /// Make every following `update_user` fail.
    pub fn fail_update_user(&self, fail: bool) {
        self.state().fail_update_user = fail;
    }

    /// Make every following `update_activity` fail.
    pub fn fail_update_activity(&self, fail: bool) {
        self.state().fail_update_activity = fail;
    }
}

#[async_trait]
impl PluginAdapter for MemoryStorage {
    fn name(&self) -> &str {
        "memory-storage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, StravachError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), StravachError> {
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn initialize(&self) -> Result<(), StravachError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), StravachError> {
        Ok(())
    }

    async fn get_user_by_chat_id(&self, chat_id: ChatId) -> Result<Option<User>, StravachError> {
        Ok(self.user_by_chat(chat_id))
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, StravachError> {
        Ok(self.state().users.get(&id).cloned())
    }

    async fn get_user_by_strava_id(
        &self,
        strava_id: i64,
    ) -> Result<Option<User>, StravachError> {
        Ok(self
            .state()
            .users
            .values()
            .find(|u| u.strava_id == Some(strava_id))
            .cloned())
    }

    async fn user_exists_by_chat_id(&self, chat_id: ChatId) -> Result<bool, StravachError> {
        Ok(self.user_by_chat(chat_id).is_some())
    }

    async fn create_user(&self, user: &User) -> Result<User, StravachError> {
        if self.user_by_chat(user.chat_id).is_some() {
            return Err(StravachError::storage(std::io::Error::other(
                "UNIQUE constraint failed: users.telegram_chat_id",
            )));
        }
        let created = self.insert_user(user.clone());
        self.record(format!("storage.create_user:{}", created.id));
        Ok(created)
    }

    async fn update_user(&self, user: &User) -> Result<(), StravachError> {
        self.record(format!("storage.update_user:{}", user.id));
        let mut state = self.state();
        if state.fail_update_user {
            return Err(injected("update_user"));
        }
        match state.users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(StravachError::NotFound {
                entity: "user",
                id: user.id.to_string(),
            }),
        }
    }

    async fn get_activity(&self, id: ActivityId) -> Result<Option<UserActivity>, StravachError> {
        Ok(self.activity(id))
    }

    async fn activity_exists(&self, id: ActivityId) -> Result<bool, StravachError> {
        Ok(self.state().activities.contains_key(&id))
    }

    async fn create_activity(&self, activity: &UserActivity) -> Result<(), StravachError> {
        self.record(format!("storage.create_activity:{}", activity.id));
        let mut state = self.state();
        if state.activities.contains_key(&activity.id) {
            return Err(StravachError::storage(std::io::Error::other(
                "UNIQUE constraint failed: user_activities.id",
            )));
        }
        state.activities.insert(activity.id, activity.clone());
        Ok(())
    }

    async fn create_activities(
        &self,
        activities: &[UserActivity],
    ) -> Result<usize, StravachError> {
        let mut state = self.state();
        let mut created = 0;
        for activity in activities {
            if !state.activities.contains_key(&activity.id) {
                state.activities.insert(activity.id, activity.clone());
                created += 1;
            }
        }
        drop(state);
        self.record(format!("storage.create_activities:{created}"));
        Ok(created)
    }

    async fn update_activity(&self, activity: &UserActivity) -> Result<(), StravachError> {
        self.record(format!("storage.update_activity:{}", activity.id));
        let mut state = self.state();
        if state.fail_update_activity {
            return Err(injected("update_activity"));
        }
        match state.activities.get_mut(&activity.id) {
            Some(stored) => {
                *stored = activity.clone();
                Ok(())
            }
            None => Err(StravachError::NotFound {
                entity: "activity",
                id: activity.id.to_string(),
            }),
        }
    }

    async fn list_user_activities(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<UserActivity>, StravachError> {
        let mut activities: Vec<UserActivity> = self
            .state()
            .activities
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        activities.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));
        activities.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(activities)
    }
}
