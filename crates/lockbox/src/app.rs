// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring from configuration to a ready [`Vault`].

use std::sync::Arc;

use lockbox_config::model::LockboxConfig;
use lockbox_core::{LockboxError, SecretStore};
use lockbox_storage::SqliteSecretStore;
use lockbox_vault::{
    get_master_password, Auditor, FileVerificationStore, SessionGuard, SessionSettings, Vault,
};
use tracing::debug;

/// Everything a command needs: config, session, store and the vault facade.
pub struct App {
    pub config: LockboxConfig,
    pub session: Arc<SessionGuard>,
    pub store: Arc<SqliteSecretStore>,
    pub vault: Vault,
}

/// A locked session over the configured verification file.
pub fn session_for(config: &LockboxConfig) -> SessionGuard {
    SessionGuard::new(
        Arc::new(FileVerificationStore::new(&config.vault.verification_path)),
        SessionSettings::from_config(&config.vault),
    )
}

impl App {
    /// Open the entry store. The session starts locked.
    pub async fn open(config: LockboxConfig) -> Result<Self, LockboxError> {
        let session = Arc::new(session_for(&config));
        let store = Arc::new(SqliteSecretStore::open(config.storage.clone()).await?);

        let secret_store: Arc<dyn SecretStore> = store.clone();
        let vault = Vault::new(
            secret_store,
            session.clone(),
            Auditor::from_config(&config.audit),
        );
        debug!(db = %config.storage.database_path, "app opened");

        Ok(Self {
            config,
            session,
            store,
            vault,
        })
    }

    /// Open and unlock with the env var or a TTY prompt.
    pub async fn open_unlocked(config: LockboxConfig) -> Result<Self, LockboxError> {
        // Fail before the database file gets created.
        if !session_for(&config).is_initialized()? {
            return Err(LockboxError::NotInitialized);
        }
        let app = Self::open(config).await?;
        app.unlock_interactive()?;
        Ok(app)
    }

    pub fn unlock_interactive(&self) -> Result<(), LockboxError> {
        if !self.session.is_initialized()? {
            return Err(LockboxError::NotInitialized);
        }
        let password = get_master_password()?;
        self.session.unlock(&password)
    }

    /// Lock the session and checkpoint the database.
    pub async fn close(&self) -> Result<(), LockboxError> {
        self.session.lock();
        self.store.close().await
    }
}
