// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps plaintext secrets to and from their at-rest blobs using the
//! session's key.

use lockbox_core::LockboxError;
use secrecy::SecretString;

use crate::crypto;
use crate::session::SessionGuard;

/// Encrypts and decrypts entry passwords through a [`SessionGuard`].
///
/// Each call runs the session's idle check first, so a session that went
/// idle fails with [`LockboxError::Locked`] instead of using a stale key.
#[derive(Debug, Clone, Copy)]
pub struct CredentialCodec<'a> {
    session: &'a SessionGuard,
}

impl<'a> CredentialCodec<'a> {
    pub fn new(session: &'a SessionGuard) -> Self {
        Self { session }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>, LockboxError> {
        self.session.check_idle();
        let blob = self
            .session
            .with_key(|key| crypto::seal(key, plaintext.as_bytes()))?;
        self.session.touch()?;
        Ok(blob.into_bytes())
    }

    /// Fails with [`LockboxError::AuthenticationFailure`] when `blob` was
    /// sealed under another key or has been altered.
    pub fn decrypt(&self, blob: &[u8]) -> Result<SecretString, LockboxError> {
        self.session.check_idle();
        let plaintext = self.session.with_key(|key| crypto::open(key, blob))?;
        self.session.touch()?;

        let text = std::str::from_utf8(&plaintext).map_err(|e| {
            LockboxError::MalformedCiphertext(format!("decrypted value is not valid UTF-8: {e}"))
        })?;
        Ok(SecretString::from(text.to_owned()))
    }
}
