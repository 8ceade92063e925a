// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles GET /health, POST /api/activity/{id}, GET /api/activities/{chat_id}.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use stravach_core::StravachError;
use stravach_core::types::{ActivityId, ChatId, UserActivity};
use stravach_rename::bounded;
use stravach_rename::queue::EnqueueOutcome;
use tracing::{error, info};

use crate::server::GatewayState;

/// Most activities returned by the listing endpoint.
const ACTIVITY_LIST_LIMIT: i64 = 50;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Response body for POST /api/activity/{id}.
#[derive(Debug, Serialize)]
pub struct RenameResponse {
    pub activity_id: ActivityId,
    /// `queued`, `already_queued` or `queue_full`.
    pub status: &'static str,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler failure, rendered as a JSON [`ErrorResponse`].
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Domain(StravachError),
}

impl From<StravachError> for ApiError {
    fn from(err: StravachError) -> Self {
        ApiError::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Domain(err) => {
                let status = match &err {
                    StravachError::NotFound { .. } => StatusCode::NOT_FOUND,
                    StravachError::InvalidCallback(_) => StatusCode::BAD_REQUEST,
                    StravachError::Upstream { .. }
                    | StravachError::Unauthorized
                    | StravachError::CredentialRefreshFailed { .. } => StatusCode::BAD_GATEWAY,
                    StravachError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    error!(error = %err, "gateway request failed");
                }
                (status, err.to_string())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// GET /health
pub async fn health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// POST /api/activity/{id}
///
/// Offers the stored activity again in its owner's chat, renamed or not.
pub async fn request_rename(
    State(state): State<GatewayState>,
    Path(activity_id): Path<ActivityId>,
) -> Result<(StatusCode, Json<RenameResponse>), ApiError> {
    let outcome = state.ingestion.request_rename(activity_id).await?;
    info!(activity_id, ?outcome, "manual rename requested");

    let (status, label) = match outcome {
        EnqueueOutcome::Enqueued => (StatusCode::ACCEPTED, "queued"),
        EnqueueOutcome::Duplicate => (StatusCode::OK, "already_queued"),
        EnqueueOutcome::Dropped => (StatusCode::SERVICE_UNAVAILABLE, "queue_full"),
    };
    Ok((
        status,
        Json(RenameResponse {
            activity_id,
            status: label,
        }),
    ))
}

/// GET /api/activities/{chat_id}
pub async fn list_activities(
    State(state): State<GatewayState>,
    Path(chat_id): Path<ChatId>,
) -> Result<Json<Vec<UserActivity>>, ApiError> {
    let user = bounded(state.step_timeout, state.storage.get_user_by_chat_id(chat_id))
        .await?
        .ok_or_else(|| StravachError::NotFound {
            entity: "user",
            id: chat_id.to_string(),
        })?;
    let activities = bounded(
        state.step_timeout,
        state
            .storage
            .list_user_activities(user.id, ACTIVITY_LIST_LIMIT),
    )
    .await?;
    Ok(Json(activities))
}
