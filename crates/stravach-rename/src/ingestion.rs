// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Producers feeding the rename queue.
//!
//! Webhook ingestion never enqueues an activity that is already renamed.
//! Manual requests are direct user actions and always enqueue.

use std::sync::Arc;
use std::time::Duration;

use stravach_core::error::StravachError;
use stravach_core::traits::{ActivityProvider, StorageAdapter};
use stravach_core::types::{ActivityForUpdate, ActivityId, ChatId, UserActivity};
use tracing::{debug, info};

use crate::bounded;
use crate::queue::{EnqueueOutcome, RenameQueue};
use crate::token_guard::TokenGuard;

/// Result of ingesting one upstream activity event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The event was handed to the queue (which may still drop or dedupe it).
    Queued(EnqueueOutcome),
    /// The activity is already renamed and is not offered again.
    AlreadyRenamed,
    /// No registered user owns this athlete id.
    UnknownOwner,
}

#[derive(Clone)]
pub struct Ingestion {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    provider: Arc<dyn ActivityProvider + Send + Sync>,
    token_guard: TokenGuard,
    queue: RenameQueue,
    step_timeout: Duration,
}

impl Ingestion {
    pub fn new(
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        provider: Arc<dyn ActivityProvider + Send + Sync>,
        token_guard: TokenGuard,
        queue: RenameQueue,
        step_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            provider,
            token_guard,
            queue,
            step_timeout,
        }
    }

    pub fn queue(&self) -> &RenameQueue {
        &self.queue
    }

    /// Handle an activity event for the athlete `owner_id`.
    ///
    /// A locally known activity is reused as is. An unknown one is fetched
    /// with a fresh credential and stored first.
    pub async fn ingest_activity(
        &self,
        owner_id: i64,
        activity_id: ActivityId,
    ) -> Result<IngestOutcome, StravachError> {
        let Some(mut user) =
            bounded(self.step_timeout, self.storage.get_user_by_strava_id(owner_id)).await?
        else {
            debug!(owner_id, activity_id, "activity event for unknown athlete");
            return Ok(IngestOutcome::UnknownOwner);
        };

        let exists = bounded(self.step_timeout, self.storage.activity_exists(activity_id)).await?;
        let activity = if exists {
            debug!(activity_id, "activity already mirrored");
            bounded(self.step_timeout, self.storage.get_activity(activity_id))
                .await?
                .ok_or_else(|| StravachError::NotFound {
                    entity: "activity",
                    id: activity_id.to_string(),
                })?
        } else {
            let provider = Arc::clone(&self.provider);
            let mut activity = self
                .token_guard
                .with_reauth(&mut user, move |token| {
                    let provider = Arc::clone(&provider);
                    async move { provider.get_activity(&token, activity_id).await }
                })
                .await?;
            activity.user_id = user.id;
            activity.renamed = false;
            bounded(self.step_timeout, self.storage.create_activity(&activity)).await?;
            info!(activity_id, user_id = user.id, "new activity mirrored");
            activity
        };

        if activity.renamed {
            debug!(activity_id, "activity already renamed, not offering again");
            return Ok(IngestOutcome::AlreadyRenamed);
        }

        let outcome = self
            .queue
            .enqueue(ActivityForUpdate {
                activity,
                chat_id: user.chat_id,
            })
            .await;
        Ok(IngestOutcome::Queued(outcome))
    }

    /// Explicit user request to rename a stored activity, renamed or not.
    pub async fn request_rename(
        &self,
        activity_id: ActivityId,
    ) -> Result<EnqueueOutcome, StravachError> {
        let activity = self.stored_activity(activity_id).await?;
        let user = bounded(self.step_timeout, self.storage.get_user(activity.user_id))
            .await?
            .ok_or_else(|| StravachError::NotFound {
                entity: "user",
                id: activity.user_id.to_string(),
            })?;

        Ok(self
            .queue
            .enqueue(ActivityForUpdate {
                activity,
                chat_id: user.chat_id,
            })
            .await)
    }

    /// Re-offer an activity from a chat, checking the chat owns it.
    pub async fn regenerate(
        &self,
        chat_id: ChatId,
        activity_id: ActivityId,
    ) -> Result<EnqueueOutcome, StravachError> {
        let activity = self.stored_activity(activity_id).await?;
        let owner = bounded(self.step_timeout, self.storage.get_user_by_chat_id(chat_id)).await?;
        if owner.is_none_or(|user| user.id != activity.user_id) {
            return Err(StravachError::InvalidCallback(format!(
                "activity {activity_id} does not belong to chat {chat_id}"
            )));
        }

        Ok(self
            .queue
            .enqueue(ActivityForUpdate { activity, chat_id })
            .await)
    }

    /// Pull the athlete's activity list and store the ones not seen yet.
    /// Returns how many were new. Nothing is enqueued.
    pub async fn refresh_activities(&self, chat_id: ChatId) -> Result<usize, StravachError> {
        let mut user = bounded(self.step_timeout, self.storage.get_user_by_chat_id(chat_id))
            .await?
            .ok_or_else(|| StravachError::NotFound {
                entity: "user",
                id: chat_id.to_string(),
            })?;

        let provider = Arc::clone(&self.provider);
        let mut activities: Vec<UserActivity> = self
            .token_guard
            .with_reauth(&mut user, move |token| {
                let provider = Arc::clone(&provider);
                async move { provider.list_activities(&token).await }
            })
            .await?;
        for activity in &mut activities {
            activity.user_id = user.id;
            activity.renamed = false;
        }

        let created =
            bounded(self.step_timeout, self.storage.create_activities(&activities)).await?;
        info!(
            chat_id,
            fetched = activities.len(),
            created,
            "activities refreshed"
        );
        Ok(created)
    }

    async fn stored_activity(&self, activity_id: ActivityId) -> Result<UserActivity, StravachError> {
        bounded(self.step_timeout, self.storage.get_activity(activity_id))
            .await?
            .ok_or_else(|| StravachError::NotFound {
                entity: "activity",
                id: activity_id.to_string(),
            })
    }
}
