// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Compact inline-button payloads.
//!
//! A payload is `activity:<activity_id>:<action>` where the action is a
//! 1-based option index, `0` for regenerate or `C` for a custom prompt.
//! Names are never embedded since button payloads are limited to 64 bytes.

use stravach_core::error::StravachError;
use stravach_core::types::ActivityId;

/// Subject tag carried by every rename payload.
pub const CALLBACK_TAG: &str = "activity";

const DELIMITER: char = ':';
const REGENERATE: &str = "0";
const CUSTOM_PROMPT: &str = "C";

/// What a button tap asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Pick the option at this 1-based index.
    Select(usize),
    Regenerate,
    CustomPrompt,
}

/// A decoded button payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackPayload {
    pub activity_id: ActivityId,
    pub action: CallbackAction,
}

/// Encode a payload. `Select` indices start at 1.
pub fn encode(activity_id: ActivityId, action: CallbackAction) -> String {
    let action = match action {
        CallbackAction::Select(index) => {
            debug_assert!(index >= 1, "option indices are 1-based");
            index.to_string()
        }
        CallbackAction::Regenerate => REGENERATE.to_string(),
        CallbackAction::CustomPrompt => CUSTOM_PROMPT.to_string(),
    };
    format!("{CALLBACK_TAG}{DELIMITER}{activity_id}{DELIMITER}{action}")
}

/// Decode a payload received from a button tap.
///
/// Segments past the third are ignored.
pub fn decode(data: &str) -> Result<CallbackPayload, StravachError> {
    let mut parts = data.split(DELIMITER);
    let (Some(tag), Some(id), Some(action)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(StravachError::InvalidCallback(format!(
            "expected tag:id:action, got {data:?}"
        )));
    };

    if tag != CALLBACK_TAG {
        return Err(StravachError::InvalidCallback(format!("unknown tag {tag:?}")));
    }

    let activity_id = id
        .parse::<u64>()
        .ok()
        .and_then(|id| ActivityId::try_from(id).ok())
        .ok_or_else(|| StravachError::InvalidCallback(format!("bad activity id {id:?}")))?;

    let action = match action {
        REGENERATE => CallbackAction::Regenerate,
        CUSTOM_PROMPT => CallbackAction::CustomPrompt,
        other => match other.parse::<usize>() {
            Ok(index) if index >= 1 => CallbackAction::Select(index),
            _ => {
                return Err(StravachError::InvalidCallback(format!(
                    "bad action {other:?}"
                )));
            }
        },
    };

    Ok(CallbackPayload {
        activity_id,
        action,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_compact_payloads() {
        assert_eq!(encode(42, CallbackAction::Select(2)), "activity:42:2");
        assert_eq!(encode(42, CallbackAction::Regenerate), "activity:42:0");
        assert_eq!(encode(42, CallbackAction::CustomPrompt), "activity:42:C");
    }

    #[test]
    fn decodes_selection() {
        let payload = decode("activity:42:2").unwrap();
        assert_eq!(payload.activity_id, 42);
        assert_eq!(payload.action, CallbackAction::Select(2));
    }

    #[test]
    fn ignores_trailing_segments() {
        let payload = decode("activity:7:C:extra").unwrap();
        assert_eq!(payload.action, CallbackAction::CustomPrompt);
    }

    #[test]
    fn rejects_malformed_payloads() {
        for data in [
            "",
            "activity",
            "activity:42",
            "workout:42:1",
            "activity:abc:1",
            "activity:-5:1",
            "activity:42:x",
            "activity:42:-1",
            "activity::1",
        ] {
            assert!(
                matches!(decode(data), Err(StravachError::InvalidCallback(_))),
                "{data:?} should be rejected"
            );
        }
    }

    #[test]
    fn largest_payload_fits_button_limit() {
        let data = encode(ActivityId::MAX, CallbackAction::Select(9));
        assert!(data.len() <= 64, "{data} is {} bytes", data.len());
    }

    fn action_strategy() -> impl Strategy<Value = CallbackAction> {
        prop_oneof![
            Just(CallbackAction::Select(1)),
            Just(CallbackAction::Select(9)),
            (1usize..=9).prop_map(CallbackAction::Select),
            Just(CallbackAction::Regenerate),
            Just(CallbackAction::CustomPrompt),
        ]
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(id in 0..=ActivityId::MAX, action in action_strategy()) {
            let payload = decode(&encode(id, action)).unwrap();
            prop_assert_eq!(payload, CallbackPayload { activity_id: id, action });
        }

        #[test]
        fn decode_never_panics(data in "\\PC{0,40}") {
            let _ = decode(&data);
        }
    }
}
