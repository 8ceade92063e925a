// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Strava upstream provider for Stravach.
//!
//! [`StravaProvider`] implements [`ActivityProvider`] on top of the raw
//! [`StravaClient`], adding credential mapping and pagination.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use stravach_config::model::StravaConfig;
use stravach_core::traits::{ActivityProvider, PluginAdapter};
use stravach_core::types::{ActivityId, AdapterType, Credentials, HealthStatus, UserActivity};
use stravach_core::StravachError;
use tracing::{debug, info};

use crate::client::StravaClient;
use crate::types::TokenResponse;

/// Page size requested from the activity list endpoint (the API maximum is 200).
const PER_PAGE: u32 = 100;

/// Upper bound on pages fetched by one listing.
const MAX_PAGES: u32 = 10;

/// Strava implementation of the upstream provider.
pub struct StravaProvider {
    client: StravaClient,
}

impl StravaProvider {
    /// Build a provider from config. Client id and secret are required.
    pub fn new(config: &StravaConfig) -> Result<Self, StravachError> {
        let client_id = config
            .client_id
            .clone()
            .ok_or_else(|| StravachError::Config("strava.client_id is required".into()))?;
        let client_secret = config
            .client_secret
            .clone()
            .ok_or_else(|| StravachError::Config("strava.client_secret is required".into()))?;

        let client = StravaClient::new(
            config.api_base_url.clone(),
            config.token_url.clone(),
            client_id,
            client_secret,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        info!(api = %config.api_base_url, "Strava provider initialized");
        Ok(Self { client })
    }

    pub fn with_client(client: StravaClient) -> Self {
        Self { client }
    }
}

fn to_credentials(token: TokenResponse) -> Credentials {
    let (athlete_id, username) = match token.athlete {
        Some(athlete) => (Some(athlete.id), athlete.username),
        None => (None, None),
    };
    Credentials {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_at: token.expires_at,
        athlete_id,
        username,
    }
}

#[async_trait]
impl PluginAdapter for StravaProvider {
    fn name(&self) -> &str {
        "strava"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Upstream
    }

    async fn health_check(&self) -> Result<HealthStatus, StravachError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), StravachError> {
        Ok(())
    }
}

#[async_trait]
impl ActivityProvider for StravaProvider {
    async fn authorize(&self, code: &str) -> Result<Credentials, StravachError> {
        let token = self
            .client
            .exchange_token(Some(code), None)
            .await
            .map_err(|e| match e {
                StravachError::CredentialRefreshFailed { message } => StravachError::Upstream {
                    message: format!("authorization code rejected: {message}"),
                    status: None,
                    source: None,
                },
                other => other,
            })?;
        Ok(to_credentials(token))
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<Credentials, StravachError> {
        let token = self.client.exchange_token(None, Some(refresh_token)).await?;
        Ok(to_credentials(token))
    }

    async fn get_activity(
        &self,
        access_token: &str,
        id: ActivityId,
    ) -> Result<UserActivity, StravachError> {
        self.client.get_activity(access_token, id).await
    }

    async fn update_activity_name(
        &self,
        access_token: &str,
        id: ActivityId,
        name: &str,
    ) -> Result<UserActivity, StravachError> {
        self.client.update_activity_name(access_token, id, name).await
    }

    async fn list_activities(
        &self,
        access_token: &str,
    ) -> Result<Vec<UserActivity>, StravachError> {
        let mut all = Vec::new();
        for page in 1..=MAX_PAGES {
            let batch = self
                .client
                .list_activities_page(access_token, page, PER_PAGE)
                .await?;
            let last = batch.len() < PER_PAGE as usize;
            all.extend(batch);
            if last {
                break;
            }
        }
        debug!(count = all.len(), "fetched athlete activities");
        Ok(all)
    }
}
