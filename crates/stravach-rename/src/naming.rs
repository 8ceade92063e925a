// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Display-name sanitization applied to every suggested or chosen name.

use std::collections::HashSet;

/// Names longer than this are cut to [`TRUNCATED_LEN`] characters plus an ellipsis.
pub const MAX_NAME_LEN: usize = 44;
pub const TRUNCATED_LEN: usize = 40;

const SAFE_PUNCTUATION: &[char] = &[
    '-', '\'', '’', '!', '?', '.', ',', '&', '+', ':', '(', ')', '#', '/', '@', '"', '%',
];

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || c == ' ' || SAFE_PUNCTUATION.contains(&c) || is_pictograph(c)
}

fn is_pictograph(c: char) -> bool {
    matches!(c as u32,
        0x2600..=0x27BF       // misc symbols, dingbats
        | 0x1F000..=0x1FAFF   // emoji blocks
        | 0xFE0F | 0x200D)    // variation selector, zero-width joiner
}

/// Strip characters outside the allow-list, collapse whitespace, and
/// truncate long names. Returns `None` when nothing printable remains.
pub fn sanitize(raw: &str) -> Option<String> {
    let filtered: String = raw
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|&c| is_allowed(c))
        .collect();
    let collapsed = filtered.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    if collapsed.chars().count() > MAX_NAME_LEN {
        let head: String = collapsed.chars().take(TRUNCATED_LEN).collect();
        return Some(format!("{}...", head.trim_end()));
    }
    Some(collapsed)
}

/// Sanitize a batch of suggestions: drop empties and duplicates, keep order,
/// cap at `max`.
pub fn sanitize_all(raw: &[String], max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter_map(|name| sanitize(name))
        .filter(|name| seen.insert(name.to_lowercase()))
        .take(max)
        .collect()
}
