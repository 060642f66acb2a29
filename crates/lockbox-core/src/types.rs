// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared between the vault core and its persistence collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length in bytes of the derived master key.
pub const KEY_LEN: usize = 32;

/// Length in bytes of the per-vault KDF salt.
pub const SALT_LEN: usize = 32;

/// A stored credential. Only `password` is encrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Unique entry name.
    pub name: String,
    /// Encrypted blob: `nonce || ciphertext || tag`.
    pub password: Vec<u8>,
    /// Clear-text metadata.
    pub metadata: EntryMetadata,
}

impl Entry {
    /// Reject entries that no store should accept.
    pub fn validate(&self) -> Result<(), crate::LockboxError> {
        if self.name.trim().is_empty() {
            return Err(crate::LockboxError::InvalidEntry(
                "entry name is required".to_string(),
            ));
        }
        if self.password.is_empty() {
            return Err(crate::LockboxError::InvalidEntry(
                "entry password is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Metadata stored alongside an encrypted password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub username: String,
    pub url: String,
    pub notes: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntryMetadata {
    /// Fresh metadata with both timestamps set to `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            username: String::new(),
            url: String::new(),
            notes: String::new(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Aggregate figures reported by a [`SecretStore`](crate::SecretStore).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub total_entries: usize,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
    /// Mean age of `updated_at`, in days. Zero for an empty store.
    pub average_age_days: f64,
}

/// Key derivation algorithm selector, as written in configuration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum KdfAlgorithm {
    Argon2id,
    Pbkdf2,
}

/// Key derivation parameters, persisted with the verification material so a
/// vault keeps unlocking after configuration defaults change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum KdfParams {
    /// PBKDF2-HMAC-SHA256.
    Pbkdf2Sha256 { iterations: u32 },
    /// Argon2id, version 0x13. `memory_cost` is in KiB.
    Argon2id {
        memory_cost: u32,
        iterations: u32,
        parallelism: u32,
    },
}

impl KdfParams {
    pub fn algorithm(&self) -> KdfAlgorithm {
        match self {
            KdfParams::Pbkdf2Sha256 { .. } => KdfAlgorithm::Pbkdf2,
            KdfParams::Argon2id { .. } => KdfAlgorithm::Argon2id,
        }
    }
}

/// The only durable artifact of the vault core.
///
/// `verification_hash` is a SHA-256 digest of the derived master key. It
/// confirms a passphrase but cannot decrypt entries. It is still zeroized on
/// drop and redacted in `Debug`.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct VerificationMaterial {
    /// Format version of the persisted document. Version 1 stored the raw
    /// key and is no longer accepted.
    #[zeroize(skip)]
    pub version: u32,
    #[zeroize(skip)]
    pub kdf: KdfParams,
    #[serde(with = "hex::serde")]
    pub salt: [u8; SALT_LEN],
    #[serde(with = "hex::serde")]
    pub verification_hash: Vec<u8>,
}

impl VerificationMaterial {
    pub const CURRENT_VERSION: u32 = 2;

    pub fn new(kdf: KdfParams, salt: [u8; SALT_LEN], verification_hash: Vec<u8>) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            kdf,
            salt,
            verification_hash,
        }
    }
}

impl std::fmt::Debug for VerificationMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationMaterial")
            .field("version", &self.version)
            .field("kdf", &self.kdf)
            .field("salt", &hex::encode(self.salt))
            .field("verification_hash", &"[REDACTED]")
            .finish()
    }
}
