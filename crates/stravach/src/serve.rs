// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `stravach serve` command implementation.
//!
//! Wires SQLite storage, the Strava client, the name suggester and the
//! Telegram channel into a [`RenameEngine`], then runs the rename consumer,
//! the inbound dispatcher and the HTTP gateway until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::{Duration, Instant};

use stravach_config::model::StravachConfig;
use stravach_core::error::StravachError;
use stravach_core::{ChannelAdapter, PluginAdapter, StorageAdapter};
use stravach_gateway::{GatewayState, OAuthSettings, ServerConfig, start_server};
use stravach_openai::OpenAiNamer;
use stravach_rename::{EngineSettings, RenameEngine, rename_queue, shutdown};
use stravach_storage::SqliteStorage;
use stravach_strava::StravaProvider;
use stravach_telegram::TelegramChannel;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// Bound on waiting for the loops and pending webhook ingestion at shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the `stravach serve` command.
pub async fn run_serve(config: StravachConfig) -> Result<(), StravachError> {
    init_tracing(&config.bot.log_level);

    info!(name = config.bot.name.as_str(), "starting stravach serve");

    // Initialize storage.
    let storage = {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };

    let provider = Arc::new(StravaProvider::new(&config.strava)?);

    let suggester = Arc::new(OpenAiNamer::new(&config.llm).map_err(|e| {
        eprintln!("error: LLM API key required. Set llm.api_key or the OPENAI_API_KEY env var");
        e
    })?);

    let channel = {
        let mut telegram = TelegramChannel::new(config.telegram.clone())?;
        telegram.connect().await?;
        Arc::new(telegram)
    };

    let (queue, receiver) = rename_queue(
        config.bot.queue_capacity,
        Duration::from_millis(config.bot.enqueue_timeout_ms),
    );
    let settings = EngineSettings::from_config(&config);
    let step_timeout = settings.step_timeout;
    let engine = Arc::new(RenameEngine::new(
        channel.clone(),
        storage.clone(),
        provider.clone(),
        suggester,
        queue,
        settings,
    ));

    let cancel = shutdown::install_signal_handler();
    let loops = TaskTracker::new();

    loops.spawn(Arc::clone(&engine).run_consumer(receiver, cancel.clone()));

    {
        let engine = Arc::clone(&engine);
        let cancel = cancel.clone();
        loops.spawn(async move {
            engine.run_inbound(cancel.clone()).await;
            // Without inbound events the bot is useless; take everything down.
            cancel.cancel();
        });
    }

    let webhook_tasks = TaskTracker::new();
    if config.gateway.enabled {
        let state = GatewayState {
            ingestion: engine.ingestion().clone(),
            storage: storage.clone(),
            provider,
            channel: channel.clone(),
            oauth: OAuthSettings::from_config(&config)?,
            verify_token: config.strava.verify_token.clone(),
            step_timeout,
            tasks: webhook_tasks.clone(),
            webhook_permits: Arc::new(Semaphore::new(config.gateway.max_inflight_webhooks)),
            start_time: Instant::now(),
        };
        if state.verify_token.is_none() {
            warn!("strava.verify_token is not set, webhook verification will be rejected");
        }
        spawn_gateway(&loops, ServerConfig::from_config(&config), state, cancel.clone());
    } else {
        info!("gateway disabled by configuration");
    }

    info!("stravach is running");
    cancel.cancelled().await;

    info!("shutting down, waiting for in-flight work");
    shutdown::drain_tasks(&loops, DRAIN_TIMEOUT).await;
    shutdown::drain_tasks(&webhook_tasks, DRAIN_TIMEOUT).await;

    if let Err(e) = channel.shutdown().await {
        warn!(error = %e, "telegram channel shutdown failed");
    }
    storage.close().await?;
    log_heap_usage();

    info!("stravach serve shutdown complete");
    Ok(())
}

fn spawn_gateway(
    tracker: &TaskTracker,
    config: ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) {
    tracker.spawn(async move {
        if let Err(e) = start_server(&config, state, cancel.clone()).await {
            error!(error = %e, "gateway failed, shutting down");
            cancel.cancel();
        }
    });
}

#[cfg(not(target_env = "msvc"))]
fn log_heap_usage() {
    use tikv_jemalloc_ctl::{epoch, stats};

    if epoch::advance().is_err() {
        return;
    }
    if let Ok(allocated) = stats::allocated::read() {
        info!(allocated_mb = allocated / (1024 * 1024), "final heap usage");
    }
}

#[cfg(target_env = "msvc")]
fn log_heap_usage() {}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing_filter(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

/// The `stravach` target prefix also matches every `stravach_*` crate.
fn tracing_filter(log_level: &str) -> String {
    format!("stravach={log_level},warn")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::EnvFilter;

    #[test]
    fn filter_scopes_workspace_crates() {
        let filter = tracing_filter("debug");
        assert_eq!(filter, "stravach=debug,warn");
        assert!(EnvFilter::try_new(filter).is_ok());
    }

    #[tokio::test]
    async fn gateway_failure_cancels_the_process() {
        use std::net::TcpListener;

        // Occupy a port so the gateway cannot bind it.
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port,
        };
        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();
        let state = test_state();
        spawn_gateway(&tracker, config, state, cancel.clone());

        tokio::time::timeout(Duration::from_secs(5), cancel.cancelled())
            .await
            .expect("bind failure should cancel");
        tracker.close();
        tracker.wait().await;
    }

    fn test_state() -> GatewayState {
        let mut config = StravachConfig::default();
        config.strava.client_id = Some("1".into());
        config.strava.client_secret = Some("s".into());
        config.telegram.bot_token = Some("123:abc".into());
        config.storage.database_path = ":memory:".into();

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        let provider = Arc::new(StravaProvider::new(&config.strava).unwrap());
        let channel = Arc::new(TelegramChannel::new(config.telegram.clone()).unwrap());
        config.llm.api_key = Some("sk-test".into());
        let suggester = Arc::new(OpenAiNamer::new(&config.llm).unwrap());
        let (queue, _receiver) = rename_queue(1, Duration::from_millis(10));
        let engine = RenameEngine::new(
            channel.clone(),
            storage.clone(),
            provider.clone(),
            suggester,
            queue,
            EngineSettings::from_config(&config),
        );

        GatewayState {
            ingestion: engine.ingestion().clone(),
            storage,
            provider,
            channel,
            oauth: OAuthSettings::from_config(&config).unwrap(),
            verify_token: None,
            step_timeout: Duration::from_secs(1),
            tasks: TaskTracker::new(),
            webhook_permits: Arc::new(Semaphore::new(4)),
            start_time: Instant::now(),
        }
    }
}
