// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP ingestion surface for the Stravach bot.
//!
//! Serves the Strava webhook (subscription verification and activity events),
//! the OAuth redirect and callback, manual rename requests and a health probe.
//! Activity events are handed to the rename queue through
//! [`stravach_rename::Ingestion`]; nothing here talks to the chat workflow
//! directly except the one-off "connected" notice after OAuth.

pub mod auth;
pub mod handlers;
pub mod server;
pub mod webhook;

pub use server::{GatewayState, OAuthSettings, ServerConfig, router, start_server};
