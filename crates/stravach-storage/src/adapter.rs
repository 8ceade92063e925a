// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use stravach_config::model::StorageConfig;
use stravach_core::types::{ActivityId, ChatId, User, UserActivity};
use stravach_core::{AdapterType, HealthStatus, PluginAdapter, StorageAdapter, StravachError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened by [`StorageAdapter::initialize`]; every other call
/// fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// The connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, StravachError> {
        self.db.get().ok_or_else(|| StravachError::Storage {
            source: "storage not initialized, call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, StravachError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), StravachError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), StravachError> {
        let db = Database::open_with_wal(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| StravachError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), StravachError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn get_user_by_chat_id(&self, chat_id: ChatId) -> Result<Option<User>, StravachError> {
        queries::users::get_user_by_chat_id(self.db()?, chat_id).await
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, StravachError> {
        queries::users::get_user(self.db()?, id).await
    }

    async fn get_user_by_strava_id(
        &self,
        strava_id: i64,
    ) -> Result<Option<User>, StravachError> {
        queries::users::get_user_by_strava_id(self.db()?, strava_id).await
    }

    async fn user_exists_by_chat_id(&self, chat_id: ChatId) -> Result<bool, StravachError> {
        queries::users::user_exists_by_chat_id(self.db()?, chat_id).await
    }

    async fn create_user(&self, user: &User) -> Result<User, StravachError> {
        queries::users::create_user(self.db()?, user).await
    }

    async fn update_user(&self, user: &User) -> Result<(), StravachError> {
        queries::users::update_user(self.db()?, user).await
    }

    async fn get_activity(&self, id: ActivityId) -> Result<Option<UserActivity>, StravachError> {
        queries::activities::get_activity(self.db()?, id).await
    }

    async fn activity_exists(&self, id: ActivityId) -> Result<bool, StravachError> {
        queries::activities::activity_exists(self.db()?, id).await
    }

    async fn create_activity(&self, activity: &UserActivity) -> Result<(), StravachError> {
        queries::activities::create_activity(self.db()?, activity).await
    }

    async fn create_activities(&self, activities: &[UserActivity]) -> Result<usize, StravachError> {
        queries::activities::create_activities(self.db()?, activities).await
    }

    async fn update_activity(&self, activity: &UserActivity) -> Result<(), StravachError> {
        queries::activities::update_activity(self.db()?, activity).await
    }

    async fn list_user_activities(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<UserActivity>, StravachError> {
        queries::activities::list_user_activities(self.db()?, user_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &std::path::Path) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string_lossy().into_owned(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(&dir.path().join("x.db")));
        let err = storage.get_user_by_chat_id(1).await.unwrap_err();
        assert!(err.to_string().contains("not initialized"));
    }

    #[tokio::test]
    async fn initialize_twice_fails() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(&dir.path().join("x.db")));
        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn full_lifecycle_through_trait() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let storage = SqliteStorage::new(make_config(&db_path));
        storage.initialize().await.unwrap();
        assert!(db_path.exists());
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);

        let user = storage.create_user(&User::new(777, "runner")).await.unwrap();
        let activity = UserActivity {
            id: 42,
            user_id: user.id,
            name: "Morning Jog".into(),
            distance: 5000.0,
            moving_time: 1500,
            elapsed_time: 1600,
            activity_type: "Run".into(),
            start_date: "2024-05-01T06:00:00Z".into(),
            average_heartrate: 0.0,
            average_speed: 0.0,
            renamed: false,
        };
        storage.create_activity(&activity).await.unwrap();
        assert!(storage.activity_exists(42).await.unwrap());

        storage.close().await.unwrap();
        storage.shutdown().await.unwrap();
    }
}
