// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database handle: PRAGMA setup, migrations and WAL checkpointing.
//!
//! All statements run on tokio-rusqlite's single background thread, which
//! serializes writes.

use std::path::Path;
use std::time::Duration;

use lockbox_core::LockboxError;
use tracing::debug;

use crate::migrations;

/// Convert a tokio-rusqlite error into `LockboxError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> LockboxError {
    LockboxError::storage(e)
}

/// An open, migrated entry database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (creating if needed) the database at `path` and apply migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, LockboxError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(LockboxError::storage)?;
        }

        // Migrations run on a short-lived plain connection before the async
        // handle takes over.
        {
            let mut conn = rusqlite::Connection::open(path).map_err(LockboxError::storage)?;
            migrations::run_migrations(&mut conn)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(LockboxError::storage)?;
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if wal_mode {
                let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get(0)
                })?;
                debug!(journal_mode = %mode, "journal mode set");
            }
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.busy_timeout(Duration::from_secs(5))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path = %path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Fold the WAL back into the main file so the database is a single
    /// self-contained file (for backups and shutdown).
    pub async fn checkpoint(&self) -> Result<(), LockboxError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
