// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OAuth authorization-code flow.
//!
//! `/start` in the chat links to [`redirect`], which forwards to Strava's
//! consent page. Strava sends the user back to [`callback`] with a one-time
//! code that is exchanged for the credential stored on the user.

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use reqwest::Url;
use serde::Deserialize;
use stravach_core::StravachError;
use stravach_core::types::{ChatId, OutboundMessage};
use stravach_rename::bounded;
use tracing::{info, warn};

use crate::handlers::ApiError;
use crate::server::{GatewayState, OAuthSettings};

/// Permissions requested from the athlete.
pub const OAUTH_SCOPE: &str = "read_all,activity:write,activity:read_all";

const CONNECTED_NOTICE: &str =
    "✅ Strava connected! New activities will get name suggestions here.";
const CONNECTED_PAGE: &str =
    "<html><body><h3>Strava connected.</h3><p>You can return to Telegram now.</p></body></html>";

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    /// Set by Strava when the athlete declines.
    pub error: Option<String>,
}

/// Consent page URL for `chat_id`.
pub fn authorize_url(oauth: &OAuthSettings, chat_id: ChatId) -> Result<Url, StravachError> {
    let redirect_uri = format!("{}/api/auth-callback/{chat_id}", oauth.public_url);
    Url::parse_with_params(
        &oauth.authorize_url,
        [
            ("client_id", oauth.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri.as_str()),
            ("approval_prompt", "force"),
            ("scope", OAUTH_SCOPE),
        ],
    )
    .map_err(|e| StravachError::Config(format!("invalid strava.oauth_url: {e}")))
}

/// GET /api/auth/{chat_id}
pub async fn redirect(
    State(state): State<GatewayState>,
    Path(chat_id): Path<ChatId>,
) -> Result<Response, ApiError> {
    let url = authorize_url(&state.oauth, chat_id)?;
    Ok(Redirect::temporary(url.as_str()).into_response())
}

/// GET /api/auth-callback/{chat_id}?code=...
pub async fn callback(
    State(state): State<GatewayState>,
    Path(chat_id): Path<ChatId>,
    Query(query): Query<CallbackQuery>,
) -> Result<Html<&'static str>, ApiError> {
    if let Some(reason) = query.error {
        warn!(chat_id, reason = reason.as_str(), "authorization declined");
        return Err(ApiError::BadRequest(format!("authorization declined: {reason}")));
    }
    let Some(code) = query.code.filter(|code| !code.is_empty()) else {
        return Err(ApiError::BadRequest("missing authorization code".into()));
    };

    let step = state.step_timeout;
    let mut user = bounded(step, state.storage.get_user_by_chat_id(chat_id))
        .await?
        .ok_or_else(|| StravachError::NotFound {
            entity: "user",
            id: chat_id.to_string(),
        })?;

    let creds = bounded(step, state.provider.authorize(&code)).await?;
    user.access_code = code;
    user.apply_credentials(&creds);
    bounded(step, state.storage.update_user(&user)).await?;
    info!(chat_id, user_id = user.id, strava_id = ?user.strava_id, "strava account connected");

    if let Err(e) = bounded(
        step,
        state
            .channel
            .send(OutboundMessage::text(chat_id, CONNECTED_NOTICE)),
    )
    .await
    {
        warn!(chat_id, error = %e, "failed to send connected notice");
    }

    Ok(Html(CONNECTED_PAGE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> OAuthSettings {
        OAuthSettings {
            authorize_url: "https://www.strava.com/oauth/authorize".into(),
            client_id: "37166".into(),
            public_url: "https://bot.example.com".into(),
        }
    }

    #[test]
    fn authorize_url_carries_client_scope_and_redirect() {
        let url = authorize_url(&settings(), 777).unwrap();
        let params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(url.host_str(), Some("www.strava.com"));
        assert!(params.contains(&("client_id".into(), "37166".into())));
        assert!(params.contains(&("response_type".into(), "code".into())));
        assert!(params.contains(&(
            "redirect_uri".into(),
            "https://bot.example.com/api/auth-callback/777".into()
        )));
        assert!(params.contains(&("scope".into(), OAUTH_SCOPE.into())));
    }

    #[test]
    fn malformed_authorize_url_is_a_config_error() {
        let mut oauth = settings();
        oauth.authorize_url = "not a url".into();
        assert!(matches!(
            authorize_url(&oauth, 1),
            Err(StravachError::Config(_))
        ));
    }
}
