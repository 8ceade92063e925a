// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Activity rename orchestrator for the Stravach bot.
//!
//! The [`RenameEngine`] is the central coordinator that:
//! - Drains the bounded rename queue one activity at a time
//! - Asks the name suggester for options and offers them in the chat
//! - Interprets button taps and free-text prompts against conversation state
//! - Commits the chosen name upstream and to the local mirror
//!
//! Inbound chat events run concurrently with the consumer loop; all of them
//! meet in the [`ConversationStore`], which serializes access per
//! (chat, activity) pair.

pub mod codec;
pub mod commands;
pub mod committer;
pub mod conversation;
pub mod ingestion;
pub mod naming;
pub mod queue;
pub mod render;
pub mod shutdown;
pub mod token_guard;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use stravach_config::model::StravachConfig;
use stravach_core::error::StravachError;
use stravach_core::traits::{ActivityProvider, ChannelAdapter, NameSuggester, StorageAdapter};
use stravach_core::types::{
    ActivityForUpdate, ActivityId, ChatId, InboundContent, InboundMessage, OutboundMessage, User,
    UserActivity,
};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::codec::CallbackAction;
use crate::committer::UpdateCommitter;
use crate::conversation::Selection;
use crate::queue::{EnqueueOutcome, QueueReceiver, RenameQueue};
use crate::token_guard::TokenGuard;

pub use crate::conversation::{ConversationStore, RenameState};
pub use crate::ingestion::{IngestOutcome, Ingestion};
pub use crate::queue::rename_queue;

const INVALID_SELECTION: &str = "Invalid selection, please regenerate.";
const NO_LONGER_AVAILABLE: &str = "These options are no longer available, please regenerate.";
const RENAME_IN_PROGRESS: &str = "A rename for this activity is already in progress.";
const CUSTOM_PROMPT_REQUEST: &str =
    "Send me a few words about this activity and I will suggest names based on them.";
const INBOUND_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Run `fut` with an upper bound. Expiry is reported as [`StravachError::Timeout`].
pub async fn bounded<T, F>(duration: Duration, fut: F) -> Result<T, StravachError>
where
    F: Future<Output = Result<T, StravachError>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(StravachError::Timeout { duration }),
    }
}

/// Tunables of the workflow, taken from `[bot]` and `[gateway]`.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Upper bound for every external call made by a workflow step.
    pub step_timeout: Duration,
    /// Most options offered per activity.
    pub max_options: usize,
    /// Public base URL, used for the OAuth link sent on `/start`.
    pub public_url: String,
}

impl EngineSettings {
    pub fn from_config(config: &StravachConfig) -> Self {
        Self {
            step_timeout: Duration::from_secs(config.bot.step_timeout_secs),
            max_options: config.bot.max_options,
            public_url: config.gateway.public_url.clone(),
        }
    }
}

/// The rename workflow engine.
pub struct RenameEngine {
    channel: Arc<dyn ChannelAdapter + Send + Sync>,
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    suggester: Arc<dyn NameSuggester + Send + Sync>,
    conversations: ConversationStore,
    token_guard: TokenGuard,
    committer: UpdateCommitter,
    ingestion: Ingestion,
    settings: EngineSettings,
}

impl RenameEngine {
    pub fn new(
        channel: Arc<dyn ChannelAdapter + Send + Sync>,
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        provider: Arc<dyn ActivityProvider + Send + Sync>,
        suggester: Arc<dyn NameSuggester + Send + Sync>,
        queue: RenameQueue,
        settings: EngineSettings,
    ) -> Self {
        let step = settings.step_timeout;
        let token_guard = TokenGuard::new(Arc::clone(&storage), Arc::clone(&provider), step);
        let committer = UpdateCommitter::new(
            Arc::clone(&storage),
            Arc::clone(&provider),
            token_guard.clone(),
            step,
        );
        let ingestion = Ingestion::new(
            Arc::clone(&storage),
            provider,
            token_guard.clone(),
            queue,
            step,
        );

        info!(
            step_timeout_secs = step.as_secs(),
            max_options = settings.max_options,
            "rename engine initialized"
        );

        Self {
            channel,
            storage,
            suggester,
            conversations: ConversationStore::new(),
            token_guard,
            committer,
            ingestion,
            settings,
        }
    }

    /// Producers for the rename queue, shared with the HTTP gateway.
    pub fn ingestion(&self) -> &Ingestion {
        &self.ingestion
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    /// Drains the rename queue until it closes or `cancel` fires.
    ///
    /// Events are processed strictly one at a time. A step that has started
    /// runs to completion before cancellation is observed.
    pub async fn run_consumer(
        self: Arc<Self>,
        mut queue: QueueReceiver,
        cancel: CancellationToken,
    ) {
        info!("rename consumer running");

        loop {
            tokio::select! {
                item = queue.recv() => match item {
                    Some(item) => self.offer_suggestions(item).await,
                    None => {
                        info!("rename queue closed, stopping consumer");
                        break;
                    }
                },
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping rename consumer");
                    break;
                }
            }
        }
    }

    /// Receives chat events until the channel closes or `cancel` fires.
    ///
    /// Each event is handled on its own task; in-flight handlers are drained
    /// before this returns.
    pub async fn run_inbound(self: Arc<Self>, cancel: CancellationToken) {
        info!("inbound dispatcher running");
        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                msg = self.channel.receive() => match msg {
                    Ok(inbound) => {
                        let engine = Arc::clone(&self);
                        tracker.spawn(async move { engine.handle_inbound(inbound).await });
                    }
                    Err(e) => {
                        error!(error = %e, "channel receive error, stopping inbound dispatcher");
                        break;
                    }
                },
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping inbound dispatcher");
                    break;
                }
            }
        }

        shutdown::drain_tasks(&tracker, INBOUND_DRAIN_TIMEOUT).await;
    }

    /// Idle -> SuggestionsOffered for one queued activity.
    pub async fn offer_suggestions(&self, item: ActivityForUpdate) {
        let ActivityForUpdate { activity, chat_id } = item;
        info!(chat_id, activity_id = activity.id, "offering name suggestions");

        let mut user = match self.user_for_chat(chat_id).await {
            Ok(user) => user,
            Err(e) => {
                warn!(chat_id, activity_id = activity.id, error = %e, "no user for queued activity");
                return;
            }
        };
        if let Err(e) = self.token_guard.ensure_fresh(&mut user).await {
            warn!(chat_id, activity_id = activity.id, error = %e, "credential check failed");
            self.reply(chat_id, failure_text(&e)).await;
            return;
        }

        let result = self.generate(&activity, &user.language, None).await;
        self.present(chat_id, &activity, result).await;
    }

    /// Route one inbound chat event.
    pub async fn handle_inbound(&self, msg: InboundMessage) {
        let chat_id = msg.chat_id;
        match msg.content {
            InboundContent::Callback { query_id, data } => {
                self.handle_callback(chat_id, &query_id, &data).await;
            }
            InboundContent::Text(text) => match commands::parse(&text) {
                Some(command) => {
                    self.handle_command(chat_id, msg.username.as_deref(), command)
                        .await;
                }
                None => self.handle_text(chat_id, &text).await,
            },
        }
    }

    async fn handle_callback(&self, chat_id: ChatId, query_id: &str, data: &str) {
        let payload = match codec::decode(data) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(chat_id, error = %e, "ignoring invalid callback");
                self.answer(query_id, Some(INVALID_SELECTION)).await;
                return;
            }
        };

        let activity_id = payload.activity_id;
        match payload.action {
            CallbackAction::Select(index) => {
                self.answer(query_id, None).await;
                self.select(chat_id, activity_id, index).await;
            }
            CallbackAction::Regenerate => self.regenerate(chat_id, activity_id, query_id).await,
            CallbackAction::CustomPrompt => {
                self.request_custom_prompt(chat_id, activity_id, query_id)
                    .await;
            }
        }
    }

    /// SuggestionsOffered -> Committing -> Idle.
    async fn select(&self, chat_id: ChatId, activity_id: ActivityId, index: usize) {
        match self.conversations.claim_selection(chat_id, activity_id, index) {
            Selection::Claimed(name) => {
                let outcome = self.committer.commit(chat_id, activity_id, &name).await;
                self.conversations.finish_commit(chat_id, activity_id);
                let text = match outcome {
                    Ok(_) => format!("✅ Activity renamed to \"{name}\"."),
                    Err(e) => {
                        warn!(chat_id, activity_id, error = %e, "commit failed");
                        commit_failure_text(&name, &e)
                    }
                };
                self.reply(chat_id, text).await;
            }
            Selection::OutOfRange { available } => {
                debug!(chat_id, activity_id, index, available, "selection out of range");
                self.reply(chat_id, INVALID_SELECTION).await;
            }
            Selection::NoLongerAvailable => {
                debug!(chat_id, activity_id, index, "selection no longer available");
                self.reply(chat_id, NO_LONGER_AVAILABLE).await;
            }
        }
    }

    /// Drops the current offer and re-enters the queue.
    async fn regenerate(&self, chat_id: ChatId, activity_id: ActivityId, query_id: &str) {
        if let Err(e) = self.conversations.regenerate(chat_id, activity_id) {
            debug!(chat_id, activity_id, error = %e, "regenerate rejected");
            self.answer(query_id, Some(RENAME_IN_PROGRESS)).await;
            return;
        }

        let ack = match self.ingestion.regenerate(chat_id, activity_id).await {
            Ok(EnqueueOutcome::Enqueued | EnqueueOutcome::Duplicate) => "Generating new names…",
            Ok(EnqueueOutcome::Dropped) => "Too busy right now, please try again in a moment.",
            Err(e @ StravachError::InvalidCallback(_)) => {
                debug!(chat_id, activity_id, error = %e, "regenerate for foreign activity");
                INVALID_SELECTION
            }
            Err(StravachError::NotFound { .. }) => "Activity not found.",
            Err(e) => {
                error!(chat_id, activity_id, error = %e, "failed to re-enqueue activity");
                "Something went wrong, please try again later."
            }
        };
        self.answer(query_id, Some(ack)).await;
    }

    /// SuggestionsOffered -> AwaitingFreeTextPrompt.
    async fn request_custom_prompt(
        &self,
        chat_id: ChatId,
        activity_id: ActivityId,
        query_id: &str,
    ) {
        match self.conversations.begin_custom_prompt(chat_id, activity_id) {
            Ok(()) => {
                self.answer(query_id, None).await;
                self.reply(chat_id, CUSTOM_PROMPT_REQUEST).await;
            }
            Err(e) => {
                debug!(chat_id, activity_id, error = %e, "custom prompt rejected");
                self.answer(query_id, Some(RENAME_IN_PROGRESS)).await;
            }
        }
    }

    /// AwaitingFreeTextPrompt -> SuggestionsOffered. Other free text is ignored.
    async fn handle_text(&self, chat_id: ChatId, text: &str) {
        let Some(activity_id) = self.conversations.take_prompt_target(chat_id) else {
            debug!(chat_id, "ignoring free text outside a custom prompt");
            return;
        };

        let (user, activity) = match self.prompt_context(chat_id, activity_id).await {
            Ok(context) => context,
            Err(e) => {
                warn!(chat_id, activity_id, error = %e, "cannot resolve custom prompt target");
                self.conversations.clear(chat_id, activity_id);
                self.reply(chat_id, failure_text(&e)).await;
                return;
            }
        };

        let result = self
            .generate(&activity, &user.language, Some(text.trim()))
            .await;
        self.present(chat_id, &activity, result).await;
    }

    async fn prompt_context(
        &self,
        chat_id: ChatId,
        activity_id: ActivityId,
    ) -> Result<(User, UserActivity), StravachError> {
        let user = self.user_for_chat(chat_id).await?;
        let activity = bounded(
            self.settings.step_timeout,
            self.storage.get_activity(activity_id),
        )
        .await?
        .ok_or_else(|| StravachError::NotFound {
            entity: "activity",
            id: activity_id.to_string(),
        })?;
        if activity.user_id != user.id {
            return Err(StravachError::InvalidCallback(format!(
                "activity {activity_id} does not belong to chat {chat_id}"
            )));
        }
        Ok((user, activity))
    }

    /// Ask the suggester, bounded by the step timeout. Every failure is a
    /// [`StravachError::GenerationFailed`].
    pub(crate) async fn generate(
        &self,
        activity: &UserActivity,
        language: &str,
        prompt: Option<&str>,
    ) -> Result<Vec<String>, StravachError> {
        let step = self.settings.step_timeout;
        let result = match prompt {
            Some(prompt) => {
                bounded(
                    step,
                    self.suggester.generate_with_prompt(activity, language, prompt),
                )
                .await
            }
            None => bounded(step, self.suggester.generate(activity, language)).await,
        };

        result.map_err(|e| match e {
            e @ StravachError::GenerationFailed { .. } => e,
            other => StravachError::GenerationFailed {
                message: other.to_string(),
            },
        })
    }

    /// Store and send a fresh batch, or the failure message with controls.
    async fn present(
        &self,
        chat_id: ChatId,
        activity: &UserActivity,
        generated: Result<Vec<String>, StravachError>,
    ) {
        let options = generated.and_then(|names| {
            let options = naming::sanitize_all(&names, self.settings.max_options);
            if options.is_empty() {
                Err(StravachError::GenerationFailed {
                    message: "no usable names in the response".into(),
                })
            } else {
                Ok(options)
            }
        });

        match options {
            Ok(options) => {
                if let Err(e) = self
                    .conversations
                    .set_options(chat_id, activity.id, options.clone())
                {
                    debug!(chat_id, activity_id = activity.id, error = %e, "offer superseded");
                    return;
                }
                self.send(render::suggestions(chat_id, activity.id, &options))
                    .await;
            }
            Err(e) => {
                warn!(chat_id, activity_id = activity.id, error = %e, "name generation failed");
                self.send(render::generation_failed(
                    chat_id,
                    activity.id,
                    &activity.name,
                    &e.to_string(),
                ))
                .await;
            }
        }
    }

    pub(crate) async fn user_for_chat(&self, chat_id: ChatId) -> Result<User, StravachError> {
        bounded(
            self.settings.step_timeout,
            self.storage.get_user_by_chat_id(chat_id),
        )
        .await?
        .ok_or_else(|| StravachError::NotFound {
            entity: "user",
            id: chat_id.to_string(),
        })
    }

    pub(crate) async fn reply(&self, chat_id: ChatId, text: impl Into<String>) {
        self.send(OutboundMessage::text(chat_id, text)).await;
    }

    async fn send(&self, msg: OutboundMessage) {
        let chat_id = msg.chat_id;
        if let Err(e) = bounded(self.settings.step_timeout, self.channel.send(msg)).await {
            error!(chat_id, error = %e, "failed to send message");
        }
    }

    async fn answer(&self, query_id: &str, text: Option<&str>) {
        if let Err(e) = bounded(
            self.settings.step_timeout,
            self.channel.answer_callback(query_id, text),
        )
        .await
        {
            debug!(error = %e, "failed to answer callback");
        }
    }
}

fn failure_text(err: &StravachError) -> String {
    match err {
        StravachError::CredentialRefreshFailed { .. } => {
            "🔑 Strava authorization expired, send /start to reconnect.".to_string()
        }
        StravachError::NotFound { entity, .. } => format!("Sorry, that {entity} was not found."),
        StravachError::InvalidCallback(_) => INVALID_SELECTION.to_string(),
        _ => "Something went wrong, please try again later.".to_string(),
    }
}

fn commit_failure_text(name: &str, err: &StravachError) -> String {
    match err {
        StravachError::PartialSyncFailure { .. } => format!(
            "⚠️ Renamed on Strava to \"{name}\", but local sync failed. \
             No need to rename again, run /refresh_activities later."
        ),
        StravachError::UpstreamWriteFailed { message } => format!(
            "❌ Strava did not accept the new name ({message}). Regenerate to try again."
        ),
        other => failure_text(other),
    }
}
