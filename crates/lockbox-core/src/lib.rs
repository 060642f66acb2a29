// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Lockbox credential vault.
//!
//! This crate provides the error taxonomy, the shared entry and
//! verification-material types, and the collaborator traits that the vault
//! core requires from persistence backends.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LockboxError;
pub use traits::{SecretStore, VerificationStore};
pub use types::{
    Entry, EntryMetadata, KdfAlgorithm, KdfParams, StoreStats, VerificationMaterial, KEY_LEN,
    SALT_LEN,
};
