// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned domain values.

use stravach_core::types::{ChatId, InboundContent, InboundMessage, User, UserActivity};

/// Athlete id given to fixture users, offset by chat id.
pub const ATHLETE_BASE: i64 = 9_000;

/// An authorized user whose credential is valid for another hour.
pub fn user(chat_id: ChatId) -> User {
    let mut user = User::new(chat_id, format!("athlete{chat_id}"));
    user.strava_id = Some(ATHLETE_BASE + chat_id);
    user.access_token = "valid-access".into();
    user.refresh_token = "valid-refresh".into();
    user.token_expires_at = Some(chrono::Utc::now().timestamp() + 3600);
    user
}

/// An authorized user whose credential expired an hour ago.
pub fn expired_user(chat_id: ChatId) -> User {
    let mut user = user(chat_id);
    user.access_token = "stale-access".into();
    user.token_expires_at = Some(chrono::Utc::now().timestamp() - 3600);
    user
}

pub fn activity(id: i64, user_id: i64, name: &str) -> UserActivity {
    UserActivity {
        id,
        user_id,
        name: name.to_string(),
        distance: 5012.3,
        moving_time: 1500,
        elapsed_time: 1620,
        activity_type: "Run".into(),
        start_date: "2026-05-01T06:00:00Z".into(),
        average_heartrate: 148.0,
        average_speed: 3.3,
        renamed: false,
    }
}

pub fn text(chat_id: ChatId, text: &str) -> InboundMessage {
    InboundMessage {
        id: format!("msg-{chat_id}"),
        chat_id,
        username: Some(format!("athlete{chat_id}")),
        content: InboundContent::Text(text.to_string()),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

pub fn callback(chat_id: ChatId, data: &str) -> InboundMessage {
    InboundMessage {
        id: format!("cb-{chat_id}"),
        chat_id,
        username: Some(format!("athlete{chat_id}")),
        content: InboundContent::Callback {
            query_id: format!("query-{chat_id}-{data}"),
            data: data.to_string(),
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}
