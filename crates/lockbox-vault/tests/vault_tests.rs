// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault facade over an in-memory store and a file-backed verification store.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use lockbox_core::{Entry, KdfParams, LockboxError, SecretStore, StoreStats, VerificationStore};
use lockbox_vault::crypto;
use lockbox_vault::{
    AuditChecks, Auditor, EntryUpdate, FileVerificationStore, ManualClock, NewEntry,
    PasswordHealthEvaluator, SessionGuard, SessionSettings, Vault,
};
use secrecy::{ExposeSecret, SecretString};

#[derive(Default)]
struct MemoryStore {
    entries: Mutex<BTreeMap<String, Entry>>,
}

impl MemoryStore {
    fn backdate(&self, name: &str, days: i64) {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.get_mut(name).unwrap();
        entry.metadata.updated_at = Utc::now() - ChronoDuration::days(days);
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn initialize(&self) -> Result<(), LockboxError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), LockboxError> {
        Ok(())
    }

    async fn put(&self, entry: &Entry) -> Result<(), LockboxError> {
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(&entry.name) {
            return Err(LockboxError::AlreadyExists {
                name: entry.name.clone(),
            });
        }
        entries.insert(entry.name.clone(), entry.clone());
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Entry, LockboxError> {
        self.entries
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| LockboxError::NotFound {
                name: name.to_string(),
            })
    }

    async fn update(&self, entry: &Entry) -> Result<(), LockboxError> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(&entry.name) {
            Some(slot) => {
                *slot = entry.clone();
                Ok(())
            }
            None => Err(LockboxError::NotFound {
                name: entry.name.clone(),
            }),
        }
    }

    async fn delete(&self, name: &str) -> Result<(), LockboxError> {
        self.entries
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| LockboxError::NotFound {
                name: name.to_string(),
            })
    }

    async fn list(&self) -> Result<Vec<Entry>, LockboxError> {
        Ok(self.entries.lock().unwrap().values().cloned().collect())
    }

    async fn search(&self, query: &str) -> Result<Vec<Entry>, LockboxError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.name.contains(query) || e.metadata.username.contains(query))
            .cloned()
            .collect())
    }

    async fn list_by_tag(&self, tag: &str) -> Result<Vec<Entry>, LockboxError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.metadata.tags.iter().any(|t| t == tag))
            .cloned()
            .collect())
    }

    async fn stats(&self) -> Result<StoreStats, LockboxError> {
        let entries = self.entries.lock().unwrap();
        Ok(StoreStats {
            total_entries: entries.len(),
            ..StoreStats::default()
        })
    }
}

struct Fixture {
    vault: Vault,
    store: Arc<MemoryStore>,
    session: Arc<SessionGuard>,
    clock: Arc<ManualClock>,
    dir: tempfile::TempDir,
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

fn fixture(idle_secs: u64) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new());
    let session = Arc::new(SessionGuard::with_clock(
        Arc::new(FileVerificationStore::new(dir.path().join("master.json"))),
        SessionSettings {
            kdf: KdfParams::Pbkdf2Sha256 { iterations: 4096 },
            idle_timeout: Duration::from_secs(idle_secs),
        },
        clock.clone(),
    ));
    session.initialize(&secret("CorrectHorse1!"), false).unwrap();
    session.unlock(&secret("CorrectHorse1!")).unwrap();

    let store = Arc::new(MemoryStore::default());
    let vault = Vault::new(
        store.clone(),
        session.clone(),
        Auditor::new(PasswordHealthEvaluator::default(), 90),
    );
    Fixture {
        vault,
        store,
        session,
        clock,
        dir,
    }
}

#[tokio::test]
async fn stored_password_is_ciphertext() {
    let fx = fixture(300);
    fx.vault
        .add(NewEntry::new("router", secret("hunter2")))
        .await
        .unwrap();

    let raw = fx.store.get("router").await.unwrap().password;
    // nonce(12) + ciphertext(7) + tag(16)
    assert_eq!(raw.len(), 12 + 7 + 16);
    assert!(!raw.windows(7).any(|w| w == b"hunter2"));
    assert_eq!(
        fx.vault.reveal("router").await.unwrap().expose_secret(),
        "hunter2"
    );
}

#[tokio::test]
async fn expired_entries_are_reported_and_counted() {
    let fx = fixture(300);
    fx.vault
        .add(NewEntry::new("old", secret("0ld!Password")))
        .await
        .unwrap();
    fx.vault
        .add(NewEntry::new("new", secret("N3w!Password")))
        .await
        .unwrap();
    fx.store.backdate("old", 120);

    let report = fx.vault.audit(AuditChecks::ALL).await.unwrap();
    assert_eq!(report.expired.len(), 1);
    assert_eq!(report.expired[0].name, "old");

    let detail = fx.vault.stats(true).await.unwrap().detail.unwrap();
    assert_eq!(detail.expired, 1);
    assert_eq!(detail.weak, 0);
}

#[tokio::test]
async fn update_rejects_empty_password_and_keeps_old_one() {
    let fx = fixture(300);
    fx.vault
        .add(NewEntry::new("mail", secret("M4il!pass")))
        .await
        .unwrap();

    let err = fx
        .vault
        .update(
            "mail",
            EntryUpdate {
                password: Some(secret("")),
                ..EntryUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LockboxError::InvalidEntry(_)));
    assert_eq!(
        fx.vault.reveal("mail").await.unwrap().expose_secret(),
        "M4il!pass"
    );
}

#[tokio::test]
async fn update_of_missing_entry_is_not_found() {
    let fx = fixture(300);
    let err = fx
        .vault
        .update(
            "ghost",
            EntryUpdate {
                notes: Some("boo".to_string()),
                ..EntryUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LockboxError::NotFound { .. }));
}

#[tokio::test]
async fn idle_session_blocks_the_facade() {
    let fx = fixture(5);
    fx.vault
        .add(NewEntry::new("wifi", secret("W1fi!pass")))
        .await
        .unwrap();

    fx.clock.advance(Duration::from_secs(5));
    assert!(matches!(
        fx.vault.get("wifi").await,
        Err(LockboxError::Locked)
    ));
    assert!(matches!(
        fx.vault.stats(false).await,
        Err(LockboxError::Locked)
    ));

    fx.session.unlock(&secret("CorrectHorse1!")).unwrap();
    assert!(fx.vault.get("wifi").await.is_ok());
}

#[tokio::test]
async fn entry_sealed_before_reinit_cannot_be_opened_after() {
    let fx = fixture(300);
    fx.vault
        .add(NewEntry::new("legacy", secret("L3gacy!pw")))
        .await
        .unwrap();

    fx.session
        .initialize(&secret("Fresh!Master9"), true)
        .unwrap();
    fx.session.unlock(&secret("Fresh!Master9")).unwrap();

    assert!(matches!(
        fx.vault.reveal("legacy").await,
        Err(LockboxError::AuthenticationFailure)
    ));
}

#[tokio::test]
async fn verification_file_cannot_decrypt_entries() {
    let fx = fixture(300);
    fx.vault
        .add(NewEntry::new("router", secret("hunter2")))
        .await
        .unwrap();
    let blob = fx.store.get("router").await.unwrap().password;
    fx.session.lock();

    let material = FileVerificationStore::new(fx.dir.path().join("master.json"))
        .load()
        .unwrap();
    assert!(matches!(
        crypto::open(&material.verification_hash, &blob),
        Err(LockboxError::AuthenticationFailure)
    ));

    let on_disk = std::fs::read_to_string(fx.dir.path().join("master.json")).unwrap();
    fx.session.unlock(&secret("CorrectHorse1!")).unwrap();
    fx.session
        .with_key(|key| {
            assert!(!on_disk.contains(&hex::encode(key)));
            Ok(())
        })
        .unwrap();
}

#[tokio::test]
async fn names_are_matched_without_surrounding_whitespace() {
    let fx = fixture(300);
    fx.vault
        .add(NewEntry::new(" github ", secret("Gh!token123")))
        .await
        .unwrap();

    assert_eq!(fx.vault.get(" github ").await.unwrap().name, "github");
    assert_eq!(
        fx.vault.reveal("github  ").await.unwrap().expose_secret(),
        "Gh!token123"
    );
    fx.vault
        .update(
            "\tgithub",
            EntryUpdate {
                notes: Some("rotated".to_string()),
                ..EntryUpdate::default()
            },
        )
        .await
        .unwrap();
    fx.vault.delete(" github").await.unwrap();
    assert!(matches!(
        fx.vault.get("github").await,
        Err(LockboxError::NotFound { .. })
    ));
}
