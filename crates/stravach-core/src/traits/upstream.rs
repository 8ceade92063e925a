// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upstream fitness provider trait.

use async_trait::async_trait;

use crate::error::StravachError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ActivityId, Credentials, UserActivity};

/// Client for the upstream provider that owns the canonical activity names.
///
/// A rejected access token surfaces as [`StravachError::Unauthorized`] so the
/// caller can refresh and retry once.
#[async_trait]
pub trait ActivityProvider: PluginAdapter {
    /// Exchanges an OAuth authorization code for credentials.
    async fn authorize(&self, code: &str) -> Result<Credentials, StravachError>;

    /// Exchanges a refresh token for a new credential set.
    async fn refresh_token(&self, refresh_token: &str) -> Result<Credentials, StravachError>;

    async fn get_activity(
        &self,
        access_token: &str,
        id: ActivityId,
    ) -> Result<UserActivity, StravachError>;

    /// Writes a new display name and returns the upstream's view of the activity.
    async fn update_activity_name(
        &self,
        access_token: &str,
        id: ActivityId,
        name: &str,
    ) -> Result<UserActivity, StravachError>;

    /// Lists the athlete's activities, paginating internally.
    async fn list_activities(&self, access_token: &str)
    -> Result<Vec<UserActivity>, StravachError>;
}
