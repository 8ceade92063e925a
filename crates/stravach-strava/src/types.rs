// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the Strava REST and OAuth endpoints.

use serde::{Deserialize, Serialize};

/// Body of `POST /oauth/token` for both grant types.
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<&'a str>,
    pub grant_type: &'static str,
}

/// Response of `POST /oauth/token`.
///
/// The athlete summary is only present for the authorization-code grant.
#[derive(Clone, Deserialize)]
#[cfg_attr(test, derive(Debug))]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    #[serde(default)]
    pub athlete: Option<AthleteSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AthleteSummary {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

/// Body of `PUT /activities/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdatableActivity<'a> {
    pub name: &'a str,
}

/// Error document returned by the API on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct Fault {
    pub message: String,
}
