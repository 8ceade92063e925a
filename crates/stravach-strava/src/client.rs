// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Strava v3 API and OAuth token endpoint.
//!
//! The client performs exactly one request per call. Credential refresh and
//! the single retry after a 401 belong to the caller.

use std::time::Duration;

use reqwest::{Response, StatusCode};
use stravach_core::types::{ActivityId, UserActivity};
use stravach_core::StravachError;
use tracing::debug;

use crate::types::{Fault, TokenRequest, TokenResponse, UpdatableActivity};

/// Thin Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    client: reqwest::Client,
    api_base_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    timeout: Duration,
}

impl std::fmt::Debug for StravaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StravaClient")
            .field("api_base_url", &self.api_base_url)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl StravaClient {
    pub fn new(
        api_base_url: impl Into<String>,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StravachError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StravachError::Upstream {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout,
        })
    }

    /// Exchange an authorization code or refresh token at the token endpoint.
    pub async fn exchange_token(
        &self,
        code: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<TokenResponse, StravachError> {
        let grant_type = if refresh_token.is_some() {
            "refresh_token"
        } else {
            "authorization_code"
        };
        let body = TokenRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            code,
            refresh_token,
            grant_type,
        };

        let response = self
            .client
            .post(&self.token_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(status = %status, grant_type, "token response received");
        if !status.is_success() {
            let message = fault_message(response).await;
            return Err(StravachError::CredentialRefreshFailed {
                message: format!("{grant_type} grant rejected ({status}): {message}"),
            });
        }
        decode(response).await
    }

    pub async fn get_activity(
        &self,
        access_token: &str,
        id: ActivityId,
    ) -> Result<UserActivity, StravachError> {
        let response = self
            .client
            .get(format!("{}/activities/{id}", self.api_base_url))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        decode(check_status(response).await?).await
    }

    pub async fn update_activity_name(
        &self,
        access_token: &str,
        id: ActivityId,
        name: &str,
    ) -> Result<UserActivity, StravachError> {
        let response = self
            .client
            .put(format!("{}/activities/{id}", self.api_base_url))
            .bearer_auth(access_token)
            .json(&UpdatableActivity { name })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        decode(check_status(response).await?).await
    }

    /// One page of `GET /athlete/activities`.
    pub async fn list_activities_page(
        &self,
        access_token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserActivity>, StravachError> {
        let response = self
            .client
            .get(format!(
                "{}/athlete/activities?page={page}&per_page={per_page}",
                self.api_base_url
            ))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        decode(check_status(response).await?).await
    }

    fn transport_error(&self, e: reqwest::Error) -> StravachError {
        if e.is_timeout() {
            return StravachError::Timeout {
                duration: self.timeout,
            };
        }
        StravachError::Upstream {
            message: format!("HTTP request failed: {e}"),
            status: None,
            source: Some(Box::new(e)),
        }
    }
}

async fn check_status(response: Response) -> Result<Response, StravachError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(StravachError::Unauthorized);
    }
    let message = fault_message(response).await;
    Err(StravachError::Upstream {
        message: format!("Strava returned {status}: {message}"),
        status: Some(status.as_u16()),
        source: None,
    })
}

async fn fault_message(response: Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<Fault>(&body)
        .map(|f| f.message)
        .unwrap_or(body)
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, StravachError> {
    let body = response.text().await.map_err(|e| StravachError::Upstream {
        message: format!("failed to read response body: {e}"),
        status: None,
        source: Some(Box::new(e)),
    })?;
    serde_json::from_str(&body).map_err(|e| StravachError::Upstream {
        message: format!("failed to parse Strava response: {e}"),
        status: None,
        source: Some(Box::new(e)),
    })
}
