// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations.
//!
//! The SQL files under `migrations/` are compiled into the binary by
//! `embed_migrations!` and applied every time the database is opened.

use stravach_core::StravachError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply pending migrations. Refinery records progress in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), StravachError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(StravachError::storage)?;
    Ok(())
}
