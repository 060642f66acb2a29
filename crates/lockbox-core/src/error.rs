// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Lockbox credential vault.

use thiserror::Error;

/// The primary error type used across the vault core and its collaborators.
///
/// The first five variants are the session/crypto taxonomy callers are
/// expected to match on: they decide between "retry the passphrase",
/// "unlock first", "data is corrupt or the key is wrong" and "run init".
#[derive(Debug, Error)]
pub enum LockboxError {
    /// Unlock attempted with the wrong master passphrase.
    #[error("invalid master password")]
    InvalidCredentials,

    /// A plaintext operation was attempted while the session is locked.
    #[error("vault is locked -- unlock it first")]
    Locked,

    /// AEAD verification failed: wrong key, or tampered/truncated ciphertext.
    #[error("decryption failed -- data may be corrupted or the master password is wrong")]
    AuthenticationFailure,

    /// No verification material exists yet.
    #[error("vault is not initialized -- run `lockbox init` first")]
    NotInitialized,

    /// Setup invoked when verification material already exists.
    #[error("vault is already initialized -- use --force to reinitialize")]
    AlreadyInitialized,

    /// Ciphertext or decrypted payload is structurally invalid.
    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// Key-length mismatch, RNG failure, or invalid KDF parameters.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Named entry does not exist.
    #[error("entry not found: {name}")]
    NotFound { name: String },

    /// Named entry already exists.
    #[error("entry already exists: {name}")]
    AlreadyExists { name: String },

    /// Entry failed validation before reaching the store.
    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    /// Persistence backend errors (database, filesystem, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors surfaced at runtime.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LockboxError {
    /// Wrap any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        LockboxError::Storage {
            source: Box::new(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_failure_is_distinct_from_malformed_input() {
        let auth = LockboxError::AuthenticationFailure.to_string();
        let malformed = LockboxError::MalformedCiphertext("too short".into()).to_string();
        assert!(auth.contains("corrupted"));
        assert!(auth.contains("master password"));
        assert!(malformed.starts_with("malformed ciphertext"));
    }

    #[test]
    fn storage_helper_wraps_source() {
        let err = LockboxError::storage(std::io::Error::other("disk full"));
        assert_eq!(err.to_string(), "storage error: disk full");
    }
}
