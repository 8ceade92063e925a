// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the persistence store.

use async_trait::async_trait;

use crate::error::StravachError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ActivityId, ChatId, User, UserActivity};

/// Adapter for the persistence store holding users and activity mirrors.
///
/// Lookups that find nothing return `Ok(None)`; only backend failures are errors.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), StravachError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), StravachError>;

    async fn get_user_by_chat_id(&self, chat_id: ChatId) -> Result<Option<User>, StravachError>;

    async fn get_user(&self, id: i64) -> Result<Option<User>, StravachError>;

    async fn get_user_by_strava_id(&self, strava_id: i64)
    -> Result<Option<User>, StravachError>;

    async fn user_exists_by_chat_id(&self, chat_id: ChatId) -> Result<bool, StravachError>;

    /// Inserts a user and returns it with its assigned id.
    async fn create_user(&self, user: &User) -> Result<User, StravachError>;

    async fn update_user(&self, user: &User) -> Result<(), StravachError>;

    async fn get_activity(&self, id: ActivityId) -> Result<Option<UserActivity>, StravachError>;

    async fn activity_exists(&self, id: ActivityId) -> Result<bool, StravachError>;

    async fn create_activity(&self, activity: &UserActivity) -> Result<(), StravachError>;

    /// Inserts activities that are not stored yet. Returns how many were new.
    async fn create_activities(&self, activities: &[UserActivity]) -> Result<usize, StravachError>;

    async fn update_activity(&self, activity: &UserActivity) -> Result<(), StravachError>;

    /// Most recent activities first.
    async fn list_user_activities(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<UserActivity>, StravachError>;
}
