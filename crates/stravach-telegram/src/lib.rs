// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram chat transport for Stravach.
//!
//! Implements [`ChannelAdapter`] over teloxide long polling. Text messages and
//! inline-keyboard taps from private chats are forwarded as [`InboundMessage`]s;
//! outbound messages may carry an inline keyboard.

pub mod handler;

use std::sync::Arc;

use async_trait::async_trait;
use stravach_config::model::TelegramConfig;
use stravach_core::error::StravachError;
use stravach_core::traits::{ChannelAdapter, PluginAdapter};
use stravach_core::types::{AdapterType, HealthStatus, InboundMessage, MessageId, OutboundMessage};
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, ParseMode};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Buffer between the polling task and `receive()`.
const INBOUND_BUFFER: usize = 100;

/// Telegram channel adapter implementing [`ChannelAdapter`].
pub struct TelegramChannel {
    bot: Bot,
    config: TelegramConfig,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    /// Requires `config.bot_token` to be set and non-empty.
    pub fn new(config: TelegramConfig) -> Result<Self, StravachError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            StravachError::Config("telegram.bot_token is required for Telegram adapter".into())
        })?;
        if token.is_empty() {
            return Err(StravachError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);
        Ok(Self {
            bot,
            config,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

fn send_error(e: teloxide::RequestError) -> StravachError {
    StravachError::Channel {
        message: format!("failed to send message: {e}"),
        source: Some(Box::new(e)),
    }
}

async fn forward(tx: &mpsc::Sender<InboundMessage>, inbound: InboundMessage) {
    if tx.send(inbound).await.is_err() {
        warn!("inbound channel closed, dropping update");
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, StravachError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), StravachError> {
        if let Some(handle) = &self.polling_handle {
            handle.abort();
        }
        debug!("Telegram channel shut down");
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    async fn connect(&mut self) -> Result<(), StravachError> {
        if self.polling_handle.is_some() {
            return Ok(());
        }

        let bot = self.bot.clone();
        let allowed_users: Arc<Vec<String>> = Arc::new(self.config.allowed_users.clone());
        let message_tx = self.inbound_tx.clone();
        let callback_tx = self.inbound_tx.clone();
        let message_allowed = Arc::clone(&allowed_users);
        let callback_allowed = allowed_users;

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = dptree::entry()
                .branch(Update::filter_message().endpoint(move |msg: Message| {
                    let tx = message_tx.clone();
                    let allowed = Arc::clone(&message_allowed);
                    async move {
                        if !handler::is_dm(&msg) {
                            debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                        } else if !handler::is_authorized(msg.from.as_ref(), &allowed) {
                            debug!(chat_id = msg.chat.id.0, "ignoring unauthorized user");
                        } else if let Some(inbound) = handler::message_to_inbound(&msg) {
                            forward(&tx, inbound).await;
                        } else {
                            debug!(msg_id = msg.id.0, "ignoring non-text message");
                        }
                        respond(())
                    }
                }))
                .branch(Update::filter_callback_query().endpoint(
                    move |q: CallbackQuery, bot: Bot| {
                        let tx = callback_tx.clone();
                        let allowed = Arc::clone(&callback_allowed);
                        async move {
                            if !handler::is_authorized(Some(&q.from), &allowed) {
                                warn!(user_id = q.from.id.0, "unauthorized callback");
                                dismiss_callback(&bot, q.id.clone()).await;
                            } else if let Some(inbound) = handler::callback_to_inbound(&q) {
                                forward(&tx, inbound).await;
                            } else {
                                dismiss_callback(&bot, q.id.clone()).await;
                            }
                            respond(())
                        }
                    },
                ));

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, StravachError> {
        let chat_id = ChatId(msg.chat_id);
        let keyboard = (!msg.buttons.is_empty()).then(|| handler::to_keyboard(&msg.buttons));

        let mut request = self.bot.send_message(chat_id, &msg.text);
        if let Some(markup) = keyboard.clone() {
            request = request.reply_markup(markup);
        }

        let sent = if msg.parse_mode.as_deref() == Some("MarkdownV2") {
            match request.parse_mode(ParseMode::MarkdownV2).await {
                Ok(sent) => sent,
                Err(e) => {
                    warn!(error = %e, "MarkdownV2 failed, sending as plain text");
                    let mut plain = self.bot.send_message(chat_id, strip_escapes(&msg.text));
                    if let Some(markup) = keyboard {
                        plain = plain.reply_markup(markup);
                    }
                    plain.await.map_err(send_error)?
                }
            }
        } else {
            request.await.map_err(send_error)?
        };

        Ok(MessageId(sent.id.0.to_string()))
    }

    async fn receive(&self) -> Result<InboundMessage, StravachError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| StravachError::Channel {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }

    async fn answer_callback(
        &self,
        query_id: &str,
        text: Option<&str>,
    ) -> Result<(), StravachError> {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(query_id.to_string()));
        if let Some(text) = text {
            request = request.text(text);
        }
        request.await.map_err(|e| StravachError::Channel {
            message: format!("failed to answer callback: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(())
    }
}

/// Stop the loading spinner on a tap that is not forwarded.
async fn dismiss_callback(bot: &Bot, id: CallbackQueryId) {
    if let Err(e) = bot.answer_callback_query(id).await {
        debug!(error = %e, "failed to answer callback query");
    }
}

/// Remove MarkdownV2 backslash escapes for the plain-text fallback.
fn strip_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else if c != '*' {
            out.push(c);
        }
    }
    out
}
