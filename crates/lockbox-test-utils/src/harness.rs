// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temp-directory vault for tests.

use std::sync::Arc;

use lockbox_config::model::LockboxConfig;
use lockbox_core::{KdfAlgorithm, LockboxError, SecretStore};
use lockbox_storage::SqliteSecretStore;
use lockbox_vault::{
    Auditor, FileVerificationStore, ManualClock, SessionGuard, SessionSettings, Vault,
};
use secrecy::SecretString;
use tempfile::TempDir;

/// Master password used unless the builder overrides it.
pub const TEST_PASSPHRASE: &str = "CorrectHorse1!";

/// Builder for [`TestVault`].
pub struct TestVaultBuilder {
    passphrase: String,
    idle_timeout_secs: u64,
    unlocked: bool,
    password_expiration_days: u32,
}

impl TestVaultBuilder {
    fn new() -> Self {
        Self {
            passphrase: TEST_PASSPHRASE.to_string(),
            idle_timeout_secs: 300,
            unlocked: true,
            password_expiration_days: 90,
        }
    }

    pub fn with_passphrase(mut self, passphrase: &str) -> Self {
        self.passphrase = passphrase.to_string();
        self
    }

    pub fn with_idle_timeout(mut self, secs: u64) -> Self {
        self.idle_timeout_secs = secs;
        self
    }

    pub fn with_expiration_days(mut self, days: u32) -> Self {
        self.password_expiration_days = days;
        self
    }

    /// Leave the session locked after initialization.
    pub fn locked(mut self) -> Self {
        self.unlocked = false;
        self
    }

    pub async fn build(self) -> Result<TestVault, LockboxError> {
        let temp_dir = TempDir::new().map_err(LockboxError::storage)?;

        let mut config = LockboxConfig::default();
        config.storage.database_path = temp_dir
            .path()
            .join("lockbox.db")
            .to_string_lossy()
            .into_owned();
        config.vault.verification_path = temp_dir
            .path()
            .join("master.json")
            .to_string_lossy()
            .into_owned();
        // Cheapest derivation the KDF accepts.
        config.vault.kdf = KdfAlgorithm::Pbkdf2;
        config.vault.pbkdf2_iterations = 4096;
        config.vault.auto_lock_timeout_secs = self.idle_timeout_secs;
        config.audit.password_expiration_days = self.password_expiration_days;

        let store = Arc::new(SqliteSecretStore::open(config.storage.clone()).await?);
        let clock = Arc::new(ManualClock::new());
        let session = Arc::new(SessionGuard::with_clock(
            Arc::new(FileVerificationStore::new(&config.vault.verification_path)),
            SessionSettings::from_config(&config.vault),
            clock.clone(),
        ));

        let passphrase = SecretString::from(self.passphrase.clone());
        session.initialize(&passphrase, false)?;
        if self.unlocked {
            session.unlock(&passphrase)?;
        }

        let secret_store: Arc<dyn SecretStore> = store.clone();
        let vault = Vault::new(
            secret_store,
            session.clone(),
            Auditor::from_config(&config.audit),
        );

        tracing::debug!(dir = %temp_dir.path().display(), "test vault ready");
        Ok(TestVault {
            vault,
            session,
            store,
            clock,
            config,
            passphrase: self.passphrase,
            _temp_dir: temp_dir,
        })
    }
}

/// A vault living in a temp directory that is removed on drop.
pub struct TestVault {
    pub vault: Vault,
    pub session: Arc<SessionGuard>,
    pub store: Arc<SqliteSecretStore>,
    pub clock: Arc<ManualClock>,
    /// Configuration pointing at the temp paths.
    pub config: LockboxConfig,
    passphrase: String,
    _temp_dir: TempDir,
}

impl TestVault {
    pub fn builder() -> TestVaultBuilder {
        TestVaultBuilder::new()
    }

    /// Initialized and unlocked with [`TEST_PASSPHRASE`].
    pub async fn new() -> Result<Self, LockboxError> {
        Self::builder().build().await
    }

    pub fn passphrase(&self) -> SecretString {
        SecretString::from(self.passphrase.clone())
    }

    pub fn unlock(&self) -> Result<(), LockboxError> {
        self.session.unlock(&self.passphrase())
    }

    pub fn dir(&self) -> &std::path::Path {
        self._temp_dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockbox_vault::SessionState;

    #[tokio::test]
    async fn default_harness_is_unlocked() {
        let harness = TestVault::new().await.unwrap();
        assert_eq!(harness.session.state(), SessionState::Unlocked);
        assert!(harness.session.is_initialized().unwrap());
        assert!(harness.dir().join("master.json").exists());
    }

    #[tokio::test]
    async fn locked_harness_unlocks_with_its_passphrase() {
        let harness = TestVault::builder().locked().build().await.unwrap();
        assert_eq!(harness.session.state(), SessionState::Locked);
        harness.unlock().unwrap();
        assert_eq!(harness.session.state(), SessionState::Unlocked);
    }
}
