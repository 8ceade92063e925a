// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the collaborators the rename workflow talks to.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod channel;
pub mod storage;
pub mod suggester;
pub mod upstream;

pub use adapter::PluginAdapter;
pub use channel::ChannelAdapter;
pub use storage::StorageAdapter;
pub use suggester::NameSuggester;
pub use upstream::ActivityProvider;
