// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by adapters and the rename workflow.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Stable identifier of a chat on the chat transport.
pub type ChatId = i64;

/// Upstream activity identifier. Also the primary key of the local mirror.
pub type ActivityId = i64;

/// Default language used for name suggestions until the user picks one.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Unique identifier for a sent message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
    Upstream,
    Suggester,
}

/// A registered bot user, keyed by chat identity.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Upstream athlete id, known once OAuth completes.
    pub strava_id: Option<i64>,
    pub chat_id: ChatId,
    pub username: String,
    pub email: String,
    pub refresh_token: String,
    pub access_token: String,
    pub access_code: String,
    /// Unix seconds. `None` means the access token was never issued.
    pub token_expires_at: Option<i64>,
    pub language: String,
    pub is_admin: bool,
}

impl User {
    /// A fresh, not-yet-authorized user for a chat.
    pub fn new(chat_id: ChatId, username: impl Into<String>) -> Self {
        Self {
            id: 0,
            strava_id: None,
            chat_id,
            username: username.into(),
            email: String::new(),
            refresh_token: String::new(),
            access_token: String::new(),
            access_code: String::new(),
            token_expires_at: None,
            language: DEFAULT_LANGUAGE.to_string(),
            is_admin: false,
        }
    }

    /// True when the access credential must be refreshed before use.
    pub fn credential_expired(&self, now: i64) -> bool {
        match self.token_expires_at {
            Some(expires_at) => expires_at <= now,
            None => true,
        }
    }

    /// Overwrite the stored credential with a freshly issued one.
    pub fn apply_credentials(&mut self, creds: &Credentials) {
        self.access_token = creds.access_token.clone();
        self.refresh_token = creds.refresh_token.clone();
        self.token_expires_at = Some(creds.expires_at);
        if let Some(athlete_id) = creds.athlete_id {
            self.strava_id = Some(athlete_id);
        }
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("strava_id", &self.strava_id)
            .field("chat_id", &self.chat_id)
            .field("username", &self.username)
            .field("token_expires_at", &self.token_expires_at)
            .field("language", &self.language)
            .field("is_admin", &self.is_admin)
            .finish_non_exhaustive()
    }
}

/// Local mirror of one upstream activity.
///
/// Field names follow the upstream JSON so the same type decodes provider
/// responses directly. Fields the provider omits fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserActivity {
    pub id: ActivityId,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub moving_time: i64,
    #[serde(default)]
    pub elapsed_time: i64,
    #[serde(rename = "type", default)]
    pub activity_type: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub average_heartrate: f64,
    #[serde(default)]
    pub average_speed: f64,
    /// Set once the bot has committed a chosen name upstream.
    #[serde(default, alias = "is_updated")]
    pub renamed: bool,
}

/// The unit of work flowing through the rename queue.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityForUpdate {
    pub activity: UserActivity,
    pub chat_id: ChatId,
}

/// Credentials issued by the upstream token endpoint.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds.
    pub expires_at: i64,
    pub athlete_id: Option<i64>,
    pub username: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("expires_at", &self.expires_at)
            .field("athlete_id", &self.athlete_id)
            .finish_non_exhaustive()
    }
}

/// What an inbound chat event carries.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundContent {
    /// A plain text message (commands included).
    Text(String),
    /// A button tap carrying the button's callback payload.
    Callback { query_id: String, data: String },
}

/// An inbound event received from the chat transport.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub id: String,
    pub chat_id: ChatId,
    pub username: Option<String>,
    pub content: InboundContent,
    pub timestamp: String,
}

/// One inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub callback_data: String,
}

impl Button {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// An outbound message to be sent via the chat transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub chat_id: ChatId,
    pub text: String,
    /// Transport parse mode, e.g. `"MarkdownV2"`. `None` sends plain text.
    pub parse_mode: Option<String>,
    /// Button grid, one inner vec per row. Empty means no keyboard.
    pub buttons: Vec<Vec<Button>>,
}

impl OutboundMessage {
    /// Plain text without a keyboard.
    pub fn text(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: None,
            buttons: Vec::new(),
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Vec<Button>>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn markdown(mut self) -> Self {
        self.parse_mode = Some("MarkdownV2".to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_expiry_rules() {
        let mut user = User::new(1, "runner");
        assert!(user.credential_expired(100), "unset expiry must refresh");
        user.token_expires_at = Some(100);
        assert!(user.credential_expired(100));
        assert!(!user.credential_expired(99));
    }

    #[test]
    fn apply_credentials_overwrites_tokens() {
        let mut user = User::new(1, "runner");
        user.apply_credentials(&Credentials {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: 500,
            athlete_id: Some(9),
            username: None,
        });
        assert_eq!(user.access_token, "a");
        assert_eq!(user.refresh_token, "r");
        assert_eq!(user.token_expires_at, Some(500));
        assert_eq!(user.strava_id, Some(9));
    }

    #[test]
    fn debug_output_hides_tokens() {
        let mut user = User::new(1, "runner");
        user.access_token = "super-secret".into();
        assert!(!format!("{user:?}").contains("super-secret"));
    }

    #[test]
    fn activity_decodes_provider_json() {
        let json = r#"{"id": 42, "name": "Morning Jog", "type": "Run",
            "distance": 5012.3, "moving_time": 1500, "elapsed_time": 1600,
            "start_date": "2024-05-01T06:00:00Z", "kudos_count": 3}"#;
        let activity: UserActivity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.id, 42);
        assert_eq!(activity.activity_type, "Run");
        assert_eq!(activity.user_id, 0);
        assert!(!activity.renamed);
    }
}
