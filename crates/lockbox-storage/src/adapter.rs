// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the SecretStore trait.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::OnceCell;
use tracing::debug;

use lockbox_config::model::StorageConfig;
use lockbox_core::{Entry, LockboxError, SecretStore, StoreStats};

use crate::database::Database;
use crate::queries;

/// SQLite-backed entry store.
///
/// The database is opened lazily by [`SecretStore::initialize`]; every other
/// call fails until then.
pub struct SqliteSecretStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteSecretStore {
    /// The connection is not opened until [`SecretStore::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Open and initialize in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, LockboxError> {
        let store = Self::new(config);
        store.initialize().await?;
        Ok(store)
    }

    pub fn database_path(&self) -> &str {
        &self.config.database_path
    }

    /// The underlying database, for maintenance such as backups.
    pub fn database(&self) -> Result<&Database, LockboxError> {
        self.db.get().ok_or_else(|| LockboxError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl SecretStore for SqliteSecretStore {
    async fn initialize(&self) -> Result<(), LockboxError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| LockboxError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite entry store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), LockboxError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
        }
        Ok(())
    }

    async fn put(&self, entry: &Entry) -> Result<(), LockboxError> {
        entry.validate()?;
        queries::entries::insert_entry(self.database()?, entry).await?;
        debug!(name = %entry.name, "entry stored");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Entry, LockboxError> {
        queries::entries::get_entry(self.database()?, name).await
    }

    async fn update(&self, entry: &Entry) -> Result<(), LockboxError> {
        entry.validate()?;
        queries::entries::update_entry(self.database()?, entry).await
    }

    async fn delete(&self, name: &str) -> Result<(), LockboxError> {
        queries::entries::delete_entry(self.database()?, name).await
    }

    async fn list(&self) -> Result<Vec<Entry>, LockboxError> {
        queries::entries::list_entries(self.database()?).await
    }

    async fn search(&self, query: &str) -> Result<Vec<Entry>, LockboxError> {
        queries::entries::search_entries(self.database()?, query).await
    }

    async fn list_by_tag(&self, tag: &str) -> Result<Vec<Entry>, LockboxError> {
        queries::entries::entries_by_tag(self.database()?, tag).await
    }

    async fn stats(&self) -> Result<StoreStats, LockboxError> {
        queries::entries::entry_stats(self.database()?, Utc::now()).await
    }
}
