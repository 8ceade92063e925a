// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key fails
//! at startup instead of silently falling back to a default.

use serde::{Deserialize, Serialize};

/// Top-level Stravach configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StravachConfig {
    /// Bot identity and workflow tuning.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram transport settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Upstream fitness provider (Strava) settings.
    #[serde(default)]
    pub strava: StravaConfig,

    /// Language-generation service settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP ingestion surface settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Bot identity and rename workflow tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Capacity of the bounded rename queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long a producer waits on a full queue before the event is dropped.
    #[serde(default = "default_enqueue_timeout_ms")]
    pub enqueue_timeout_ms: u64,

    /// Outer timeout applied to every external call made by a workflow step.
    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,

    /// Maximum number of name options offered at once (1..=9).
    #[serde(default = "default_max_options")]
    pub max_options: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
            queue_capacity: default_queue_capacity(),
            enqueue_timeout_ms: default_enqueue_timeout_ms(),
            step_timeout_secs: default_step_timeout_secs(),
            max_options: default_max_options(),
        }
    }
}

fn default_bot_name() -> String {
    "stravach".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_queue_capacity() -> usize {
    64
}

fn default_enqueue_timeout_ms() -> u64 {
    2_000
}

fn default_step_timeout_secs() -> u64 {
    30
}

fn default_max_options() -> usize {
    9
}

/// Telegram bot configuration.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required to serve.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Telegram user ids or usernames allowed to talk to the bot. Empty allows everyone.
    #[serde(default)]
    pub allowed_users: Vec<String>,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("allowed_users", &self.allowed_users)
            .finish()
    }
}

/// Strava API configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StravaConfig {
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    /// Base URL for the REST API, without trailing slash.
    #[serde(default = "default_strava_api_base_url")]
    pub api_base_url: String,

    /// OAuth authorize page the user is redirected to.
    #[serde(default = "default_strava_oauth_url")]
    pub oauth_url: String,

    /// Token endpoint for code exchange and refresh.
    #[serde(default = "default_strava_token_url")]
    pub token_url: String,

    /// Token echoed during webhook subscription verification.
    #[serde(default)]
    pub verify_token: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for StravaConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_base_url: default_strava_api_base_url(),
            oauth_url: default_strava_oauth_url(),
            token_url: default_strava_token_url(),
            verify_token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for StravaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StravaConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("api_base_url", &self.api_base_url)
            .field("oauth_url", &self.oauth_url)
            .field("token_url", &self.token_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish_non_exhaustive()
    }
}

fn default_strava_api_base_url() -> String {
    "https://www.strava.com/api/v3".to_string()
}

fn default_strava_oauth_url() -> String {
    "https://www.strava.com/oauth/authorize".to_string()
}

fn default_strava_token_url() -> String {
    "https://www.strava.com/oauth/token".to_string()
}

fn default_request_timeout_secs() -> u64 {
    20
}

/// OpenAI-compatible chat completion service configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// API key. Falls back to the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL up to and including the API version segment.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("stravach").join("stravach.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("stravach.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP gateway configuration (webhook, manual trigger, OAuth).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    #[serde(default = "default_gateway_host")]
    pub host: String,

    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Externally reachable base URL, used in OAuth links.
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// Webhook events ingested at once; events beyond this are dropped.
    #[serde(default = "default_max_inflight_webhooks")]
    pub max_inflight_webhooks: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
            public_url: default_public_url(),
            max_inflight_webhooks: default_max_inflight_webhooks(),
        }
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8080
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_max_inflight_webhooks() -> usize {
    64
}
