// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM seal/open over self-contained blobs.
//!
//! A blob is `nonce (12) || ciphertext || tag (16)`. Every [`seal`] draws a
//! fresh random nonce from the system CSPRNG, so no nonce bookkeeping is
//! needed outside the blob itself.

use lockbox_core::{LockboxError, KEY_LEN};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// Length of the GCM authentication tag appended to the ciphertext.
pub const TAG_LEN: usize = 16;

/// Encrypted bytes as stored at rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob(Vec<u8>);

impl EncryptedBlob {
    pub fn nonce(&self) -> &[u8] {
        &self.0[..NONCE_LEN]
    }

    /// Ciphertext including the trailing tag.
    pub fn ciphertext(&self) -> &[u8] {
        &self.0[NONCE_LEN..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

fn aead_key(key: &[u8]) -> Result<LessSafeKey, LockboxError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key).map_err(|_| {
        LockboxError::Crypto(format!(
            "AES-256-GCM key must be {KEY_LEN} bytes, got {}",
            key.len()
        ))
    })?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
pub fn seal(key: &[u8], plaintext: &[u8]) -> Result<EncryptedBlob, LockboxError> {
    let key = aead_key(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| LockboxError::Crypto("failed to generate random nonce".to_string()))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + plaintext.len() + TAG_LEN);
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(plaintext);

    let tag = key
        .seal_in_place_separate_tag(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::empty(),
            &mut blob[NONCE_LEN..],
        )
        .map_err(|_| LockboxError::Crypto("AES-256-GCM encryption failed".to_string()))?;
    blob.extend_from_slice(tag.as_ref());

    Ok(EncryptedBlob(blob))
}

/// Decrypt a blob produced by [`seal`].
///
/// A blob too short to hold a nonce is [`LockboxError::MalformedCiphertext`].
/// Any authentication failure (wrong key, tampering, truncation) is
/// [`LockboxError::AuthenticationFailure`].
pub fn open(key: &[u8], blob: &[u8]) -> Result<Zeroizing<Vec<u8>>, LockboxError> {
    let key = aead_key(key)?;

    if blob.len() < NONCE_LEN {
        return Err(LockboxError::MalformedCiphertext(format!(
            "blob is {} bytes, shorter than the {NONCE_LEN}-byte nonce",
            blob.len()
        )));
    }
    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
        .map_err(|_| LockboxError::MalformedCiphertext("invalid nonce".to_string()))?;

    let mut in_out = Zeroizing::new(ciphertext.to_vec());
    let plaintext_len = key
        .open_in_place(nonce, Aad::empty(), in_out.as_mut_slice())
        .map_err(|_| LockboxError::AuthenticationFailure)?
        .len();
    in_out.truncate(plaintext_len);

    Ok(in_out)
}

/// A random 32-byte key suitable for AES-256-GCM.
pub fn generate_random_key() -> Result<Zeroizing<[u8; KEY_LEN]>, LockboxError> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    SystemRandom::new()
        .fill(key.as_mut())
        .map_err(|_| LockboxError::Crypto("failed to generate random key".to_string()))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn blob_layout_is_nonce_ciphertext_tag() {
        let key = generate_random_key().unwrap();
        let blob = seal(key.as_ref(), b"hello").unwrap();
        assert_eq!(blob.as_bytes().len(), NONCE_LEN + 5 + TAG_LEN);
        assert_eq!(blob.nonce().len(), NONCE_LEN);
        assert_eq!(blob.ciphertext().len(), 5 + TAG_LEN);
    }

    #[test]
    fn same_plaintext_encrypts_differently() {
        let key = generate_random_key().unwrap();
        let a = seal(key.as_ref(), b"same input twice").unwrap();
        let b = seal(key.as_ref(), b"same input twice").unwrap();
        assert_ne!(a.nonce(), b.nonce());
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_length_is_a_crypto_error() {
        assert!(matches!(seal(&[0u8; 16], b"x"), Err(LockboxError::Crypto(_))));
        assert!(matches!(open(&[0u8; 31], &[0u8; 40]), Err(LockboxError::Crypto(_))));
    }

    #[test]
    fn short_blob_is_malformed() {
        let key = generate_random_key().unwrap();
        let err = open(key.as_ref(), &[0u8; NONCE_LEN - 1]).unwrap_err();
        assert!(matches!(err, LockboxError::MalformedCiphertext(_)));
    }

    #[test]
    fn truncated_blob_fails_authentication() {
        let key = generate_random_key().unwrap();
        let blob = seal(key.as_ref(), b"truncate me").unwrap().into_bytes();
        let err = open(key.as_ref(), &blob[..blob.len() - 1]).unwrap_err();
        assert!(matches!(err, LockboxError::AuthenticationFailure));

        let err = open(key.as_ref(), &blob[..NONCE_LEN]).unwrap_err();
        assert!(matches!(err, LockboxError::AuthenticationFailure));
    }

    #[test]
    fn tampered_blob_fails_authentication() {
        let key = generate_random_key().unwrap();
        let mut blob = seal(key.as_ref(), b"do not tamper").unwrap().into_bytes();
        blob[NONCE_LEN] ^= 0x01;
        assert!(matches!(
            open(key.as_ref(), &blob),
            Err(LockboxError::AuthenticationFailure)
        ));
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let key = generate_random_key().unwrap();
        let blob = seal(key.as_ref(), b"").unwrap();
        assert!(open(key.as_ref(), blob.as_bytes()).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn open_inverts_seal(plaintext in proptest::collection::vec(any::<u8>(), 0..512), key in any::<[u8; 32]>()) {
            let blob = seal(&key, &plaintext).unwrap();
            let opened = open(&key, blob.as_bytes()).unwrap();
            prop_assert_eq!(opened.as_slice(), plaintext.as_slice());
        }

        #[test]
        fn other_key_fails_authentication(
            plaintext in proptest::collection::vec(any::<u8>(), 0..128),
            k1 in any::<[u8; 32]>(),
            k2 in any::<[u8; 32]>(),
        ) {
            prop_assume!(k1 != k2);
            let blob = seal(&k1, &plaintext).unwrap();
            prop_assert!(matches!(open(&k2, blob.as_bytes()), Err(LockboxError::AuthenticationFailure)));
        }
    }
}
