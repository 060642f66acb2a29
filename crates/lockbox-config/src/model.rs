// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Lockbox credential vault.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;
use std::time::Duration;

use lockbox_core::{KdfAlgorithm, KdfParams};
use serde::{Deserialize, Serialize};

/// Top-level Lockbox configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LockboxConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Entry database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Master key, KDF and session settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Password health and expiry settings.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Password generator defaults.
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file holding encrypted entries.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("lockbox"))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_database_path() -> String {
    data_dir().join("lockbox.db").to_string_lossy().into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Credential vault configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Where the salt and verification hash are stored (owner-only file).
    #[serde(default = "default_verification_path")]
    pub verification_path: String,

    /// KDF used when a vault is initialized. Existing vaults keep the
    /// algorithm and parameters they were created with.
    #[serde(default = "default_kdf")]
    pub kdf: KdfAlgorithm,

    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB).
    #[serde(default = "default_kdf_memory_cost")]
    pub kdf_memory_cost: u32,

    /// Argon2id iteration count (default: 3).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Argon2id parallelism lanes (default: 4).
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,

    /// PBKDF2-HMAC-SHA256 iteration count when `kdf = "pbkdf2"`.
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,

    /// Seconds of inactivity before an unlocked session relocks. 0 disables.
    #[serde(default = "default_auto_lock_timeout_secs")]
    pub auto_lock_timeout_secs: u64,
}

impl VaultConfig {
    /// KDF parameters for a newly initialized vault.
    pub fn kdf_params(&self) -> KdfParams {
        match self.kdf {
            KdfAlgorithm::Argon2id => KdfParams::Argon2id {
                memory_cost: self.kdf_memory_cost,
                iterations: self.kdf_iterations,
                parallelism: self.kdf_parallelism,
            },
            KdfAlgorithm::Pbkdf2 => KdfParams::Pbkdf2Sha256 {
                iterations: self.pbkdf2_iterations,
            },
        }
    }

    pub fn auto_lock_timeout(&self) -> Duration {
        Duration::from_secs(self.auto_lock_timeout_secs)
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            verification_path: default_verification_path(),
            kdf: default_kdf(),
            kdf_memory_cost: default_kdf_memory_cost(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
            pbkdf2_iterations: default_pbkdf2_iterations(),
            auto_lock_timeout_secs: default_auto_lock_timeout_secs(),
        }
    }
}

fn default_verification_path() -> String {
    data_dir().join("master.json").to_string_lossy().into_owned()
}

fn default_kdf() -> KdfAlgorithm {
    KdfAlgorithm::Argon2id
}

fn default_kdf_memory_cost() -> u32 {
    65536 // 64 MiB per OWASP recommendation
}

fn default_kdf_iterations() -> u32 {
    3
}

fn default_kdf_parallelism() -> u32 {
    4
}

fn default_pbkdf2_iterations() -> u32 {
    600_000 // OWASP 2023 guidance for PBKDF2-HMAC-SHA256
}

fn default_auto_lock_timeout_secs() -> u64 {
    300
}

/// Password health and expiry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Minimum length for a password to pass the length check.
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// Days after the last update before a password counts as expired. 0 disables.
    #[serde(default = "default_password_expiration_days")]
    pub password_expiration_days: u32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
            password_expiration_days: default_password_expiration_days(),
        }
    }
}

fn default_min_password_length() -> usize {
    8
}

fn default_password_expiration_days() -> u32 {
    90
}

/// Password generator defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Length of generated passwords.
    #[serde(default = "default_generator_length")]
    pub length: usize,

    /// Include symbols in generated passwords.
    #[serde(default = "default_generator_symbols")]
    pub symbols: bool,

    /// Leave out look-alike characters such as `l`, `1`, `O` and `0`.
    #[serde(default)]
    pub exclude_ambiguous: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            length: default_generator_length(),
            symbols: default_generator_symbols(),
            exclude_ambiguous: false,
        }
    }
}

fn default_generator_length() -> usize {
    16
}

fn default_generator_symbols() -> bool {
    true
}
