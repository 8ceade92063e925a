// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Strava webhook endpoint.
//!
//! GET answers the subscription handshake. POST receives push events; they
//! are acknowledged immediately and ingested in the background, because
//! Strava retries any event not answered with a 2xx within two seconds.
//! Background ingestion holds a permit from [`GatewayState::webhook_permits`];
//! an event arriving while none is free is dropped.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::server::GatewayState;

/// Query of the subscription handshake.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Push event body. Unknown fields (`updates`, `event_time`, ...) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub object_type: String,
    pub object_id: i64,
    pub aspect_type: String,
    pub owner_id: i64,
}

impl WebhookEvent {
    /// Only activity creation and update events are ingested.
    pub fn is_activity_change(&self) -> bool {
        self.object_type == "activity"
            && matches!(self.aspect_type.as_str(), "create" | "update")
    }
}

/// GET /webhook
pub async fn verify(State(state): State<GatewayState>, Query(query): Query<VerifyQuery>) -> Response {
    let accepted = matches!(
        (state.verify_token.as_deref(), query.mode.as_deref(), query.verify_token.as_deref()),
        (Some(expected), Some("subscribe"), Some(token)) if token == expected
    );
    if !accepted {
        warn!(mode = ?query.mode, "webhook verification rejected");
        return StatusCode::FORBIDDEN.into_response();
    }

    info!("webhook subscription verified");
    Json(serde_json::json!({
        "hub.challenge": query.challenge.unwrap_or_default(),
    }))
    .into_response()
}

/// POST /webhook
pub async fn event(State(state): State<GatewayState>, Json(event): Json<WebhookEvent>) -> StatusCode {
    if !event.is_activity_change() {
        debug!(
            object_type = event.object_type.as_str(),
            aspect_type = event.aspect_type.as_str(),
            "ignoring webhook event"
        );
        return StatusCode::OK;
    }

    info!(
        activity_id = event.object_id,
        owner_id = event.owner_id,
        aspect_type = event.aspect_type.as_str(),
        "activity event received"
    );
    let Ok(permit) = state.webhook_permits.clone().try_acquire_owned() else {
        warn!(
            activity_id = event.object_id,
            owner_id = event.owner_id,
            "too many webhook events in flight, dropping event"
        );
        return StatusCode::OK;
    };

    let ingestion = state.ingestion.clone();
    state.tasks.spawn(async move {
        let _permit = permit;
        match ingestion.ingest_activity(event.owner_id, event.object_id).await {
            Ok(outcome) => debug!(activity_id = event.object_id, ?outcome, "activity ingested"),
            Err(e) => error!(
                activity_id = event.object_id,
                owner_id = event.owner_id,
                error = %e,
                "activity ingestion failed"
            ),
        }
    });

    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(object_type: &str, aspect_type: &str) -> WebhookEvent {
        WebhookEvent {
            object_type: object_type.into(),
            object_id: 42,
            aspect_type: aspect_type.into(),
            owner_id: 9777,
        }
    }

    #[test]
    fn only_activity_changes_are_ingested() {
        assert!(event("activity", "create").is_activity_change());
        assert!(event("activity", "update").is_activity_change());
        assert!(!event("activity", "delete").is_activity_change());
        assert!(!event("athlete", "update").is_activity_change());
    }

    #[test]
    fn event_body_ignores_extra_fields() {
        let body = r#"{
            "aspect_type": "create",
            "event_time": 1549560669,
            "object_id": 1360128428,
            "object_type": "activity",
            "owner_id": 134815,
            "subscription_id": 120475,
            "updates": {}
        }"#;
        let event: WebhookEvent = serde_json::from_str(body).unwrap();
        assert_eq!(event.object_id, 1_360_128_428);
        assert_eq!(event.owner_id, 134_815);
    }
}
