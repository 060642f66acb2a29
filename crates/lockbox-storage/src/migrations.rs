// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations.
//!
//! SQL files under `migrations/` are compiled in with `embed_migrations!`
//! and applied when the database is opened.

use lockbox_core::LockboxError;
use tracing::debug;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply pending migrations. Refinery records applied versions in
/// `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), LockboxError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(LockboxError::storage)?;
    debug!(
        applied = report.applied_migrations().len(),
        "database migrations complete"
    );
    Ok(())
}
