// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat message rendering for suggestion offers.
//!
//! Option numbers shown in the text, the button labels and the encoded
//! callback indices are all derived from the same 1-based enumeration.

use stravach_core::types::{ActivityId, Button, ChatId, OutboundMessage};

use crate::codec::{self, CallbackAction};

/// Numeric buttons per keyboard row.
pub const BUTTONS_PER_ROW: usize = 3;

const HEADER: &str = "Select a number with new name:";
const REGENERATE_LINE: &str = "0. 🔄 Regenerate";
const CUSTOM_LINE: &str = "C. ✏️ Enter custom prompt";

/// Characters that must be escaped in MarkdownV2.
const SPECIAL_CHARS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

/// Escape text for Telegram MarkdownV2.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if SPECIAL_CHARS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// The fixed row offered under every suggestion list, and alone after a
/// failed generation.
pub fn control_row(activity_id: ActivityId) -> Vec<Button> {
    vec![
        Button::new(
            "🔄 Regenerate",
            codec::encode(activity_id, CallbackAction::Regenerate),
        ),
        Button::new(
            "✏️ Custom",
            codec::encode(activity_id, CallbackAction::CustomPrompt),
        ),
    ]
}

/// Numeric buttons three per row followed by the control row.
pub fn suggestion_keyboard(activity_id: ActivityId, option_count: usize) -> Vec<Vec<Button>> {
    let numbered: Vec<Button> = (1..=option_count)
        .map(|index| {
            Button::new(
                index.to_string(),
                codec::encode(activity_id, CallbackAction::Select(index)),
            )
        })
        .collect();

    let mut rows: Vec<Vec<Button>> = numbered
        .chunks(BUTTONS_PER_ROW)
        .map(<[Button]>::to_vec)
        .collect();
    rows.push(control_row(activity_id));
    rows
}

/// The MarkdownV2 text listing `options` as `N. name`.
pub fn suggestion_text(options: &[String]) -> String {
    let mut text = format!("*{}*\n\n", escape_markdown_v2(HEADER));
    for (i, name) in options.iter().enumerate() {
        text.push_str(&escape_markdown_v2(&format!("{}. {name}", i + 1)));
        text.push('\n');
    }
    text.push_str(&escape_markdown_v2(REGENERATE_LINE));
    text.push('\n');
    text.push_str(&escape_markdown_v2(CUSTOM_LINE));
    text
}

/// The full offer message for one activity.
pub fn suggestions(
    chat_id: ChatId,
    activity_id: ActivityId,
    options: &[String],
) -> OutboundMessage {
    OutboundMessage::text(chat_id, suggestion_text(options))
        .markdown()
        .with_buttons(suggestion_keyboard(activity_id, options.len()))
}

/// Sent when no names could be generated. Keeps the control row so the user
/// can retry.
pub fn generation_failed(
    chat_id: ChatId,
    activity_id: ActivityId,
    activity_name: &str,
    reason: &str,
) -> OutboundMessage {
    OutboundMessage::text(
        chat_id,
        format!(
            "Could not come up with names for \"{activity_name}\": {reason}\n\
             Tap regenerate to try again."
        ),
    )
    .with_buttons(vec![control_row(activity_id)])
}

/// Plain numbered list, used by `/test_prompt`.
pub fn numbered_list(names: &[String]) -> String {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}. {name}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
