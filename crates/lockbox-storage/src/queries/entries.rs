// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entry CRUD, search and statistics.

use chrono::{DateTime, Utc};
use lockbox_core::{Entry, EntryMetadata, LockboxError, StoreStats};
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{map_tr_err, Database};

const ENTRY_COLUMNS: &str = "name, username, password, url, notes, tags, created_at, updated_at";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    let tags_json: String = row.get(5)?;
    let tags: Vec<String> = serde_json::from_str(&tags_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Entry {
        name: row.get(0)?,
        password: row.get(2)?,
        metadata: EntryMetadata {
            username: row.get(1)?,
            url: row.get(3)?,
            notes: row.get(4)?,
            tags,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        },
    })
}

fn tags_json(entry: &Entry) -> Result<String, LockboxError> {
    serde_json::to_string(&entry.metadata.tags).map_err(LockboxError::storage)
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Insert a new entry; `AlreadyExists` if the name is taken.
pub async fn insert_entry(db: &Database, entry: &Entry) -> Result<(), LockboxError> {
    let tags = tags_json(entry)?;
    let entry_owned = entry.clone();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let e = entry_owned;
            conn.execute(
                "INSERT INTO entries (name, username, password, url, notes, tags, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(name) DO NOTHING",
                params![
                    e.name,
                    e.metadata.username,
                    e.password,
                    e.metadata.url,
                    e.metadata.notes,
                    tags,
                    e.metadata.created_at,
                    e.metadata.updated_at,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if inserted == 0 {
        return Err(LockboxError::AlreadyExists {
            name: entry.name.clone(),
        });
    }
    Ok(())
}

/// Fetch an entry by name.
pub async fn get_entry(db: &Database, name: &str) -> Result<Entry, LockboxError> {
    let key = name.to_string();
    let entry = db
        .connection()
        .call(move |conn| -> Result<Option<Entry>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE name = ?1"),
                params![key],
                entry_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    entry.ok_or_else(|| LockboxError::NotFound {
        name: name.to_string(),
    })
}

/// Replace password and metadata of an existing entry. `created_at` is kept.
pub async fn update_entry(db: &Database, entry: &Entry) -> Result<(), LockboxError> {
    let tags = tags_json(entry)?;
    let entry_owned = entry.clone();
    let updated = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let e = entry_owned;
            conn.execute(
                "UPDATE entries
                 SET username = ?2, password = ?3, url = ?4, notes = ?5, tags = ?6, updated_at = ?7
                 WHERE name = ?1",
                params![
                    e.name,
                    e.metadata.username,
                    e.password,
                    e.metadata.url,
                    e.metadata.notes,
                    tags,
                    e.metadata.updated_at,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if updated == 0 {
        return Err(LockboxError::NotFound {
            name: entry.name.clone(),
        });
    }
    Ok(())
}

/// Delete an entry by name.
pub async fn delete_entry(db: &Database, name: &str) -> Result<(), LockboxError> {
    let key = name.to_string();
    let deleted = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute("DELETE FROM entries WHERE name = ?1", params![key])
        })
        .await
        .map_err(map_tr_err)?;

    if deleted == 0 {
        return Err(LockboxError::NotFound {
            name: name.to_string(),
        });
    }
    Ok(())
}

async fn select_entries(
    db: &Database,
    where_clause: &'static str,
    arg: Option<String>,
) -> Result<Vec<Entry>, LockboxError> {
    db.connection()
        .call(move |conn| -> Result<Vec<Entry>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM entries {where_clause} ORDER BY name"
            ))?;
            let rows = match &arg {
                Some(arg) => stmt.query_map(params![arg], entry_from_row)?,
                None => stmt.query_map([], entry_from_row)?,
            };
            let entries = rows.collect::<rusqlite::Result<Vec<Entry>>>()?;
            Ok(entries)
        })
        .await
        .map_err(map_tr_err)
}

/// All entries ordered by name.
pub async fn list_entries(db: &Database) -> Result<Vec<Entry>, LockboxError> {
    select_entries(db, "", None).await
}

/// Case-insensitive substring match on name, username, url and notes.
pub async fn search_entries(db: &Database, query: &str) -> Result<Vec<Entry>, LockboxError> {
    select_entries(
        db,
        "WHERE name LIKE ?1 ESCAPE '\\' OR username LIKE ?1 ESCAPE '\\'
            OR url LIKE ?1 ESCAPE '\\' OR notes LIKE ?1 ESCAPE '\\'",
        Some(like_pattern(query)),
    )
    .await
}

/// Entries whose tag list contains exactly `tag`.
pub async fn entries_by_tag(db: &Database, tag: &str) -> Result<Vec<Entry>, LockboxError> {
    select_entries(
        db,
        "WHERE EXISTS (SELECT 1 FROM json_each(entries.tags) WHERE json_each.value = ?1)",
        Some(tag.to_string()),
    )
    .await
}

/// Count, oldest/newest creation time and mean age of `updated_at`.
pub async fn entry_stats(db: &Database, now: DateTime<Utc>) -> Result<StoreStats, LockboxError> {
    type Raw = (usize, Option<DateTime<Utc>>, Option<DateTime<Utc>>, Vec<DateTime<Utc>>);
    let (total, oldest, newest, updated): Raw = db
        .connection()
        .call(|conn| -> Result<Raw, rusqlite::Error> {
            let (total, oldest, newest) = conn.query_row(
                "SELECT COUNT(*), MIN(created_at), MAX(created_at) FROM entries",
                [],
                |row| Ok((row.get::<_, i64>(0)?, row.get(1)?, row.get(2)?)),
            )?;
            let mut stmt = conn.prepare("SELECT updated_at FROM entries")?;
            let updated = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<DateTime<Utc>>>>()?;
            Ok((usize::try_from(total).unwrap_or_default(), oldest, newest, updated))
        })
        .await
        .map_err(map_tr_err)?;

    let average_age_days = if updated.is_empty() {
        0.0
    } else {
        let total_days: f64 = updated
            .iter()
            .map(|t| (now - *t).num_seconds() as f64 / 86_400.0)
            .sum();
        total_days / updated.len() as f64
    };

    Ok(StoreStats {
        total_entries: total,
        oldest_entry: oldest,
        newest_entry: newest,
        average_age_days,
    })
}
