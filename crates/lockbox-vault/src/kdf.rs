// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master key derivation from a passphrase.
//!
//! Two algorithms are supported, selected by [`KdfParams`]: Argon2id
//! (Version 0x13, the default for new vaults) and PBKDF2-HMAC-SHA256.
//! Both produce a 32-byte key wrapped in [`Zeroizing`].
//!
//! The key itself is never persisted. What goes to disk is
//! [`verification_hash`], a SHA-256 digest of it.

use std::num::NonZeroU32;

use lockbox_core::{KdfParams, LockboxError, KEY_LEN, SALT_LEN};
use ring::{digest, pbkdf2};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// Lowest PBKDF2 iteration count accepted for derivation.
pub const MIN_PBKDF2_ITERATIONS: u32 = 4096;

/// Derive the master key from `passphrase` and the vault `salt`.
///
/// Deterministic for identical inputs. Fails on a salt that is not
/// [`SALT_LEN`] bytes or on parameters the algorithm rejects.
pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, LockboxError> {
    if salt.len() != SALT_LEN {
        return Err(LockboxError::Crypto(format!(
            "salt must be {SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }

    let mut output = Zeroizing::new([0u8; KEY_LEN]);
    match *params {
        KdfParams::Pbkdf2Sha256 { iterations } => {
            let iterations = NonZeroU32::new(iterations)
                .filter(|n| n.get() >= MIN_PBKDF2_ITERATIONS)
                .ok_or_else(|| {
                    LockboxError::Crypto(format!(
                        "PBKDF2 needs at least {MIN_PBKDF2_ITERATIONS} iterations, got {iterations}"
                    ))
                })?;
            pbkdf2::derive(
                pbkdf2::PBKDF2_HMAC_SHA256,
                iterations,
                salt,
                passphrase,
                output.as_mut(),
            );
        }
        KdfParams::Argon2id {
            memory_cost,
            iterations,
            parallelism,
        } => {
            let params = argon2::Params::new(memory_cost, iterations, parallelism, Some(KEY_LEN))
                .map_err(|e| LockboxError::Crypto(format!("invalid Argon2id parameters: {e}")))?;
            argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params)
                .hash_password_into(passphrase, salt, output.as_mut())
                .map_err(|e| LockboxError::Crypto(format!("Argon2id key derivation failed: {e}")))?;
        }
    }

    Ok(output)
}

/// One-way digest of a derived key, stored in place of the key so that
/// unlock can check a passphrase without the material being able to decrypt
/// anything.
pub fn verification_hash(key: &[u8; KEY_LEN]) -> Vec<u8> {
    digest::digest(&digest::SHA256, key).as_ref().to_vec()
}

/// Fresh random salt from the system CSPRNG. Called once per vault.
pub fn generate_salt() -> Result<[u8; SALT_LEN], LockboxError> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| LockboxError::Crypto("failed to generate random salt".to_string()))?;
    Ok(salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST_PBKDF2: KdfParams = KdfParams::Pbkdf2Sha256 { iterations: 4096 };
    const FAST_ARGON: KdfParams = KdfParams::Argon2id {
        memory_cost: 32768,
        iterations: 2,
        parallelism: 1,
    };

    #[test]
    fn derivation_is_deterministic() {
        let salt = [7u8; SALT_LEN];
        for params in [FAST_PBKDF2, FAST_ARGON] {
            let a = derive_key(b"CorrectHorse1!", &salt, &params).unwrap();
            let b = derive_key(b"CorrectHorse1!", &salt, &params).unwrap();
            assert_eq!(*a, *b);
        }
    }

    #[test]
    fn different_salts_give_different_keys() {
        for params in [FAST_PBKDF2, FAST_ARGON] {
            let a = derive_key(b"same passphrase", &[1u8; SALT_LEN], &params).unwrap();
            let b = derive_key(b"same passphrase", &[2u8; SALT_LEN], &params).unwrap();
            assert_ne!(*a, *b);
        }
    }

    #[test]
    fn different_passphrases_give_different_keys() {
        let salt = [3u8; SALT_LEN];
        let a = derive_key(b"passphrase one", &salt, &FAST_PBKDF2).unwrap();
        let b = derive_key(b"passphrase two", &salt, &FAST_PBKDF2).unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn algorithms_are_not_interchangeable() {
        let salt = [4u8; SALT_LEN];
        let a = derive_key(b"pass", &salt, &FAST_PBKDF2).unwrap();
        let b = derive_key(b"pass", &salt, &FAST_ARGON).unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn short_salt_is_rejected() {
        let err = derive_key(b"pass", &[0u8; 16], &FAST_PBKDF2).unwrap_err();
        assert!(matches!(err, LockboxError::Crypto(msg) if msg.contains("salt")));
    }

    #[test]
    fn too_few_pbkdf2_iterations_rejected() {
        for iterations in [0, 1000, MIN_PBKDF2_ITERATIONS - 1] {
            let params = KdfParams::Pbkdf2Sha256 { iterations };
            let err = derive_key(b"pass", &[0u8; SALT_LEN], &params).unwrap_err();
            assert!(matches!(err, LockboxError::Crypto(msg) if msg.contains("at least 4096")));
        }
    }

    #[test]
    fn verification_hash_is_not_the_key() {
        let key = derive_key(b"CorrectHorse1!", &[7u8; SALT_LEN], &FAST_PBKDF2).unwrap();
        let hash = verification_hash(&key);
        assert_eq!(hash.len(), KEY_LEN);
        assert_ne!(hash.as_slice(), key.as_slice());
        assert_eq!(hash, verification_hash(&key));
    }

    #[test]
    fn invalid_argon_params_rejected() {
        let params = KdfParams::Argon2id {
            memory_cost: 1,
            iterations: 1,
            parallelism: 0,
        };
        assert!(derive_key(b"pass", &[0u8; SALT_LEN], &params).is_err());
    }

    #[test]
    fn salts_are_random() {
        assert_ne!(generate_salt().unwrap(), generate_salt().unwrap());
    }
}
