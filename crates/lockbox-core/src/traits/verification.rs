// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence contract for the master-passphrase verification material.

use crate::error::LockboxError;
use crate::types::VerificationMaterial;

/// Durable home for the salt and verification hash.
pub trait VerificationStore: Send + Sync {
    /// Loads the material, or [`LockboxError::NotInitialized`] if none exists.
    fn load(&self) -> Result<VerificationMaterial, LockboxError>;

    /// Persists the material with owner-only permissions, replacing any
    /// previous copy.
    fn save(&self, material: &VerificationMaterial) -> Result<(), LockboxError>;

    /// Whether material has been saved before.
    fn exists(&self) -> Result<bool, LockboxError>;
}
