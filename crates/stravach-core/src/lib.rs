// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Stravach rename bot.
//!
//! This crate provides the trait definitions, the error type, and the domain
//! types used throughout the workspace. Every collaborator of the rename
//! workflow (chat transport, persistence store, upstream provider, name
//! suggester) is an adapter trait defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::StravachError;
pub use types::{
    ActivityForUpdate, ActivityId, AdapterType, Button, ChatId, Credentials, HealthStatus,
    InboundContent, InboundMessage, MessageId, OutboundMessage, User, UserActivity,
};

pub use traits::{
    ActivityProvider, ChannelAdapter, NameSuggester, PluginAdapter, StorageAdapter,
};
