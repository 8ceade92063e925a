// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update filtering and conversion between teloxide and domain types.

use stravach_core::types::{Button, InboundContent, InboundMessage};
use teloxide::prelude::*;
use teloxide::types::{ChatKind, InlineKeyboardButton, InlineKeyboardMarkup};

/// Checks whether a Telegram user may talk to the bot.
///
/// An empty allow-list admits everyone, since users self-register with
/// `/start`. Otherwise the user id or username (with or without `@`,
/// case-insensitive) must be listed.
pub fn is_authorized(user: Option<&teloxide::types::User>, allowed_users: &[String]) -> bool {
    let Some(user) = user else {
        return false;
    };
    if allowed_users.is_empty() {
        return true;
    }

    let user_id = user.id.0.to_string();
    allowed_users.iter().any(|allowed| {
        *allowed == user_id
            || user.username.as_deref().is_some_and(|username| {
                username.eq_ignore_ascii_case(allowed.strip_prefix('@').unwrap_or(allowed))
            })
    })
}

/// Only private chats are served.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Convert a text message. Non-text messages yield `None`.
pub fn message_to_inbound(msg: &Message) -> Option<InboundMessage> {
    let text = msg.text()?;
    Some(InboundMessage {
        id: msg.id.0.to_string(),
        chat_id: msg.chat.id.0,
        username: msg.from.as_ref().and_then(|u| u.username.clone()),
        content: InboundContent::Text(text.to_string()),
        timestamp: msg.date.to_rfc3339(),
    })
}

/// Convert a button tap. Taps without payload yield `None`.
///
/// The chat is taken from the message the keyboard was attached to, falling
/// back to the sender (identical for private chats).
pub fn callback_to_inbound(q: &CallbackQuery) -> Option<InboundMessage> {
    let data = q.data.clone()?;
    let chat_id = q
        .message
        .as_ref()
        .map(|m| m.chat().id.0)
        .unwrap_or(q.from.id.0 as i64);
    Some(InboundMessage {
        id: q.id.0.clone(),
        chat_id,
        username: q.from.username.clone(),
        content: InboundContent::Callback {
            query_id: q.id.0.clone(),
            data,
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Build an inline keyboard from domain button rows.
pub fn to_keyboard(rows: &[Vec<Button>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.text.clone(), b.callback_data.clone()))
            .collect::<Vec<_>>()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn private_message(user_id: u64, username: Option<&str>, text: &str) -> Message {
        let mut from = serde_json::json!({
            "id": user_id,
            "is_bot": false,
            "first_name": "Test",
        });
        if let Some(name) = username {
            from["username"] = serde_json::json!(name);
        }
        serde_json::from_value(serde_json::json!({
            "message_id": 7,
            "date": 1700000000i64,
            "chat": {"id": user_id as i64, "type": "private", "first_name": "Test"},
            "from": from,
            "text": text,
        }))
        .expect("failed to deserialize mock message")
    }

    fn group_message(text: &str) -> Message {
        serde_json::from_value(serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {"id": -100123i64, "type": "supergroup", "title": "Runners"},
            "from": {"id": 5, "is_bot": false, "first_name": "Test"},
            "text": text,
        }))
        .expect("failed to deserialize mock group message")
    }

    fn callback(data: Option<&str>) -> CallbackQuery {
        let mut json = serde_json::json!({
            "id": "cbq-1",
            "from": {"id": 777, "is_bot": false, "first_name": "Test", "username": "jogger"},
            "chat_instance": "ci",
            "message": {
                "message_id": 3,
                "date": 1700000000i64,
                "chat": {"id": 777, "type": "private", "first_name": "Test"},
                "text": "pick one",
            },
        });
        if let Some(d) = data {
            json["data"] = serde_json::json!(d);
        }
        serde_json::from_value(json).expect("failed to deserialize mock callback")
    }

    #[test]
    fn empty_allow_list_admits_everyone() {
        let msg = private_message(1, None, "hi");
        assert!(is_authorized(msg.from.as_ref(), &[]));
    }

    #[test]
    fn allow_list_matches_id_or_username() {
        let msg = private_message(42, Some("Jogger"), "hi");
        assert!(is_authorized(msg.from.as_ref(), &["42".into()]));
        assert!(is_authorized(msg.from.as_ref(), &["@jogger".into()]));
        assert!(!is_authorized(msg.from.as_ref(), &["99".into()]));
    }

    #[test]
    fn missing_sender_is_rejected() {
        assert!(!is_authorized(None, &[]));
    }

    #[test]
    fn group_chats_are_not_dms() {
        assert!(is_dm(&private_message(1, None, "x")));
        assert!(!is_dm(&group_message("x")));
    }

    #[test]
    fn text_message_maps_chat_and_content() {
        let inbound = message_to_inbound(&private_message(777, Some("jogger"), "/start")).unwrap();
        assert_eq!(inbound.chat_id, 777);
        assert_eq!(inbound.id, "7");
        assert_eq!(inbound.username.as_deref(), Some("jogger"));
        assert_eq!(inbound.content, InboundContent::Text("/start".into()));
    }

    #[test]
    fn callback_maps_payload_and_chat() {
        let inbound = callback_to_inbound(&callback(Some("activity:42:2"))).unwrap();
        assert_eq!(inbound.chat_id, 777);
        assert_eq!(
            inbound.content,
            InboundContent::Callback {
                query_id: "cbq-1".into(),
                data: "activity:42:2".into()
            }
        );
    }

    #[test]
    fn callback_without_data_is_skipped() {
        assert!(callback_to_inbound(&callback(None)).is_none());
    }

    #[test]
    fn keyboard_preserves_row_layout() {
        let rows = vec![
            vec![Button::new("1", "activity:1:1"), Button::new("2", "activity:1:2")],
            vec![Button::new("🔄 Regenerate", "activity:1:0")],
        ];
        let markup = to_keyboard(&rows);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].text, "🔄 Regenerate");
    }
}
