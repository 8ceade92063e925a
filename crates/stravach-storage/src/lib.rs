// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for Stravach.
//!
//! WAL-mode SQLite with embedded migrations and a single-writer connection
//! through `tokio-rusqlite`. Holds registered users with their upstream
//! credentials and the local mirror of their activities.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
