// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::routing::{get, post};
use stravach_config::model::StravachConfig;
use stravach_core::StravachError;
use stravach_core::traits::{ActivityProvider, ChannelAdapter, StorageAdapter};
use stravach_rename::Ingestion;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;

use crate::{auth, handlers, webhook};

/// Where users are sent to grant access, and where they come back to.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub authorize_url: String,
    pub client_id: String,
    /// Externally reachable base URL of this gateway.
    pub public_url: String,
}

impl OAuthSettings {
    pub fn from_config(config: &StravachConfig) -> Result<Self, StravachError> {
        let client_id = config
            .strava
            .client_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StravachError::Config("strava.client_id is required".into()))?;

        Ok(Self {
            authorize_url: config.strava.oauth_url.clone(),
            client_id,
            public_url: config.gateway.public_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Producers for the rename queue.
    pub ingestion: Ingestion,
    pub storage: Arc<dyn StorageAdapter + Send + Sync>,
    pub provider: Arc<dyn ActivityProvider + Send + Sync>,
    /// Used to tell a chat its account was connected.
    pub channel: Arc<dyn ChannelAdapter + Send + Sync>,
    pub oauth: OAuthSettings,
    /// Expected `hub.verify_token`. `None` rejects every verification.
    pub verify_token: Option<String>,
    /// Upper bound for storage and upstream calls made by handlers.
    pub step_timeout: Duration,
    /// Webhook events are processed here after the response is sent.
    pub tasks: TaskTracker,
    /// One permit per webhook event being ingested.
    pub webhook_permits: Arc<Semaphore>,
    pub start_time: Instant,
}

/// Gateway server configuration (mirrors `GatewayConfig` from stravach-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_config(config: &StravachConfig) -> Self {
        Self {
            host: config.gateway.host.clone(),
            port: config.gateway.port,
        }
    }
}

/// All gateway routes over `state`.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/webhook", get(webhook::verify).post(webhook::event))
        .route("/api/activity/{id}", post(handlers::request_rename))
        .route("/api/activities/{chat_id}", get(handlers::list_activities))
        .route("/api/auth/{chat_id}", get(auth::redirect))
        .route("/api/auth-callback/{chat_id}", get(auth::callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// Binds to the configured host:port and serves until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), StravachError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| StravachError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| StravachError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway server stopped");
    Ok(())
}
