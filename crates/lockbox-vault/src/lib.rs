// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential encryption and session lifecycle for the Lockbox vault.
//!
//! A master password is stretched into a 32-byte key ([`kdf`]). The key is
//! verified against persisted material and then held by a [`SessionGuard`]
//! while the vault is unlocked. Entry passwords are sealed with AES-256-GCM
//! ([`crypto`]) through the [`CredentialCodec`] before they reach a
//! [`lockbox_core::SecretStore`].

pub mod audit;
pub mod codec;
pub mod crypto;
pub mod generator;
pub mod health;
pub mod kdf;
pub mod material;
pub mod prompt;
pub mod session;
pub mod vault;

pub use audit::{AuditChecks, AuditReport, Auditor};
pub use codec::CredentialCodec;
pub use generator::{generate, GeneratorOptions};
pub use health::{PasswordHealth, PasswordHealthEvaluator};
pub use material::FileVerificationStore;
pub use prompt::{get_master_password, get_new_master_password};
pub use session::{Clock, ManualClock, SessionGuard, SessionSettings, SessionState, SystemClock};
pub use vault::{mask_secret, DetailedStats, EntryUpdate, NewEntry, Vault, VaultStats};
