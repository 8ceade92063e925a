// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Writes a chosen name upstream, then marks the local mirror renamed.
//!
//! The two writes are not transactional. When the upstream write succeeds and
//! the local one fails, the outcome is [`StravachError::PartialSyncFailure`]:
//! upstream already holds the new name and the operation must not be retried
//! as a whole.

use std::sync::Arc;
use std::time::Duration;

use stravach_core::error::StravachError;
use stravach_core::traits::{ActivityProvider, StorageAdapter};
use stravach_core::types::{ActivityId, ChatId, User, UserActivity};
use tracing::{error, info};

use crate::bounded;
use crate::token_guard::TokenGuard;

#[derive(Clone)]
pub struct UpdateCommitter {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    provider: Arc<dyn ActivityProvider + Send + Sync>,
    token_guard: TokenGuard,
    step_timeout: Duration,
}

impl UpdateCommitter {
    pub fn new(
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        provider: Arc<dyn ActivityProvider + Send + Sync>,
        token_guard: TokenGuard,
        step_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            provider,
            token_guard,
            step_timeout,
        }
    }

    /// Rename `activity_id` to `name` (already sanitized) for the chat's user.
    ///
    /// Returns the updated local mirror.
    pub async fn commit(
        &self,
        chat_id: ChatId,
        activity_id: ActivityId,
        name: &str,
    ) -> Result<UserActivity, StravachError> {
        let mut user = bounded(self.step_timeout, self.storage.get_user_by_chat_id(chat_id))
            .await?
            .ok_or_else(|| StravachError::NotFound {
                entity: "user",
                id: chat_id.to_string(),
            })?;

        let provider = Arc::clone(&self.provider);
        let new_name = name.to_string();
        self.token_guard
            .with_reauth(&mut user, move |token| {
                let provider = Arc::clone(&provider);
                let new_name = new_name.clone();
                async move {
                    provider
                        .update_activity_name(&token, activity_id, &new_name)
                        .await
                }
            })
            .await
            .map_err(|e| match e {
                e @ StravachError::CredentialRefreshFailed { .. } => e,
                other => StravachError::UpstreamWriteFailed {
                    message: other.to_string(),
                },
            })?;
        info!(chat_id, activity_id, new_name = name, "activity renamed upstream");

        self.mark_renamed(&user, activity_id, name)
            .await
            .map_err(|e| {
                error!(chat_id, activity_id, error = %e, "local mirror out of sync after rename");
                StravachError::PartialSyncFailure {
                    message: e.to_string(),
                }
            })
    }

    async fn mark_renamed(
        &self,
        user: &User,
        activity_id: ActivityId,
        name: &str,
    ) -> Result<UserActivity, StravachError> {
        let local = bounded(self.step_timeout, self.storage.get_activity(activity_id)).await?;
        match local {
            Some(mut activity) => {
                activity.name = name.to_string();
                activity.renamed = true;
                bounded(self.step_timeout, self.storage.update_activity(&activity)).await?;
                Ok(activity)
            }
            None => {
                let provider = Arc::clone(&self.provider);
                let mut owner = user.clone();
                let mut activity = self
                    .token_guard
                    .with_reauth(&mut owner, move |token| {
                        let provider = Arc::clone(&provider);
                        async move { provider.get_activity(&token, activity_id).await }
                    })
                    .await?;
                activity.user_id = user.id;
                activity.name = name.to_string();
                activity.renamed = true;
                bounded(self.step_timeout, self.storage.create_activity(&activity)).await?;
                Ok(activity)
            }
        }
    }
}
