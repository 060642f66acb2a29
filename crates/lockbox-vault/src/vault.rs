// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entry operations: add, reveal, update, delete, list, search, audit, stats.
//!
//! Every operation first runs the session's idle check and requires an
//! unlocked session. Passwords pass through [`CredentialCodec`] on their way
//! to and from the [`SecretStore`]; metadata is stored in clear.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lockbox_core::{Entry, EntryMetadata, LockboxError, SecretStore, StoreStats};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;

use crate::audit::{AuditChecks, AuditItem, AuditReport, Auditor};
use crate::codec::CredentialCodec;
use crate::session::SessionGuard;

/// Fields for a new entry.
#[derive(Debug)]
pub struct NewEntry {
    pub name: String,
    pub password: SecretString,
    pub username: String,
    pub url: String,
    pub notes: String,
    pub tags: Vec<String>,
    /// Original timestamps for imported entries. `None` means now.
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl NewEntry {
    pub fn new(name: impl Into<String>, password: SecretString) -> Self {
        Self {
            name: name.into(),
            password,
            username: String::new(),
            url: String::new(),
            notes: String::new(),
            tags: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

/// Partial update. `None` leaves a field unchanged.
#[derive(Debug, Default)]
pub struct EntryUpdate {
    pub password: Option<SecretString>,
    pub username: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl EntryUpdate {
    pub fn is_empty(&self) -> bool {
        self.password.is_none()
            && self.username.is_none()
            && self.url.is_none()
            && self.notes.is_none()
            && self.tags.is_none()
    }
}

/// Weak / reused / expired counts for `stats --detailed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DetailedStats {
    pub weak: usize,
    /// Number of distinct passwords shared by more than one entry.
    pub reused: usize,
    pub expired: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaultStats {
    pub store: StoreStats,
    pub detail: Option<DetailedStats>,
}

/// The credential vault: a session, a store and an auditor.
#[derive(Clone)]
pub struct Vault {
    store: Arc<dyn SecretStore>,
    session: Arc<SessionGuard>,
    auditor: Auditor,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Vault {
    pub fn new(store: Arc<dyn SecretStore>, session: Arc<SessionGuard>, auditor: Auditor) -> Self {
        Self {
            store,
            session,
            auditor,
        }
    }

    pub fn session(&self) -> &SessionGuard {
        &self.session
    }

    pub fn store(&self) -> &Arc<dyn SecretStore> {
        &self.store
    }

    fn codec(&self) -> CredentialCodec<'_> {
        CredentialCodec::new(&self.session)
    }

    fn ensure_unlocked(&self) -> Result<(), LockboxError> {
        self.session.check_idle();
        self.session.touch()
    }

    pub async fn add(&self, new: NewEntry) -> Result<Entry, LockboxError> {
        self.ensure_unlocked()?;
        if new.password.expose_secret().is_empty() {
            return Err(LockboxError::InvalidEntry(
                "entry password is required".to_string(),
            ));
        }

        let now = Utc::now();
        let entry = Entry {
            name: entry_name(&new.name).to_string(),
            password: self.codec().encrypt(new.password.expose_secret())?,
            metadata: EntryMetadata {
                username: new.username,
                url: new.url,
                notes: new.notes,
                tags: normalize_tags(new.tags),
                created_at: new.created_at.unwrap_or(now),
                updated_at: new.updated_at.unwrap_or(now),
            },
        };
        entry.validate()?;
        self.store.put(&entry).await?;

        debug!(name = %entry.name, "entry added");
        Ok(entry)
    }

    /// Entry with its password still encrypted.
    pub async fn get(&self, name: &str) -> Result<Entry, LockboxError> {
        self.ensure_unlocked()?;
        self.store.get(entry_name(name)).await
    }

    /// Decrypted password of `name`.
    pub async fn reveal(&self, name: &str) -> Result<SecretString, LockboxError> {
        self.ensure_unlocked()?;
        let entry = self.store.get(entry_name(name)).await?;
        self.codec().decrypt(&entry.password)
    }

    /// Apply `changes`. A new password is sealed under a fresh nonce.
    pub async fn update(&self, name: &str, changes: EntryUpdate) -> Result<Entry, LockboxError> {
        self.ensure_unlocked()?;
        let mut entry = self.store.get(entry_name(name)).await?;

        if let Some(password) = changes.password {
            if password.expose_secret().is_empty() {
                return Err(LockboxError::InvalidEntry(
                    "entry password is required".to_string(),
                ));
            }
            entry.password = self.codec().encrypt(password.expose_secret())?;
        }
        if let Some(username) = changes.username {
            entry.metadata.username = username;
        }
        if let Some(url) = changes.url {
            entry.metadata.url = url;
        }
        if let Some(notes) = changes.notes {
            entry.metadata.notes = notes;
        }
        if let Some(tags) = changes.tags {
            entry.metadata.tags = normalize_tags(tags);
        }
        entry.metadata.updated_at = Utc::now();

        self.store.update(&entry).await?;
        debug!(name = %entry.name, "entry updated");
        Ok(entry)
    }

    pub async fn delete(&self, name: &str) -> Result<(), LockboxError> {
        self.ensure_unlocked()?;
        let name = entry_name(name);
        self.store.delete(name).await?;
        debug!(name = %name, "entry deleted");
        Ok(())
    }

    /// All entries, sorted by name.
    pub async fn list(&self) -> Result<Vec<Entry>, LockboxError> {
        self.ensure_unlocked()?;
        self.store.list().await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Entry>, LockboxError> {
        self.ensure_unlocked()?;
        self.store.search(query).await
    }

    pub async fn by_tag(&self, tag: &str) -> Result<Vec<Entry>, LockboxError> {
        self.ensure_unlocked()?;
        self.store.list_by_tag(tag.trim()).await
    }

    /// Decrypt every entry and run the selected checks.
    pub async fn audit(&self, checks: AuditChecks) -> Result<AuditReport, LockboxError> {
        self.ensure_unlocked()?;
        let entries = self.store.list().await?;

        let codec = self.codec();
        let secrets = entries
            .iter()
            .map(|entry| codec.decrypt(&entry.password))
            .collect::<Result<Vec<_>, _>>()?;

        let items = entries.iter().zip(&secrets).map(|(entry, secret)| AuditItem {
            name: &entry.name,
            password: secret.expose_secret(),
            updated_at: entry.metadata.updated_at,
        });
        Ok(self.auditor.audit(items, checks, Utc::now()))
    }

    pub async fn stats(&self, detailed: bool) -> Result<VaultStats, LockboxError> {
        self.ensure_unlocked()?;
        let store = self.store.stats().await?;
        let detail = if detailed {
            let report = self.audit(AuditChecks::ALL).await?;
            Some(DetailedStats {
                weak: report.weak.len(),
                reused: report.reused.len(),
                expired: report.expired.len(),
            })
        } else {
            None
        };
        Ok(VaultStats { store, detail })
    }
}

/// Names are stored and looked up without surrounding whitespace.
fn entry_name(name: &str) -> &str {
    name.trim()
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut tags: Vec<String> = tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// Mask a secret for previews: `"sk-a...mnop"`.
///
/// Shows up to four leading and four trailing characters. Values shorter
/// than ten characters are fully masked as `"****"`.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() < 10 {
        return "****".to_string();
    }
    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}...{suffix}")
}
