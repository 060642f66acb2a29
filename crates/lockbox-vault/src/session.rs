// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lock/unlock state machine and sole owner of the derived master key.
//!
//! A [`SessionGuard`] starts `Locked`. A successful [`SessionGuard::unlock`]
//! holds the key in memory until [`SessionGuard::lock`], or until a
//! [`SessionGuard::check_idle`] call finds the session idle for at least the
//! configured timeout. There is no background timer: hosts call
//! `check_idle` before sensitive work.
//!
//! Failed unlocks are not throttled. Every attempt costs one key derivation
//! and nothing more.
//!
//! Key bytes are zeroized when the session relocks or the guard is dropped.
//! Copies made outside this type (terminal buffers, reallocations) are not
//! covered.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use lockbox_config::model::VaultConfig;
use lockbox_core::{KdfParams, LockboxError, VerificationMaterial, VerificationStore, KEY_LEN};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::kdf;

/// Source of monotonic time for idle tracking.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Used to exercise idle timeouts
/// without sleeping.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Locked,
    Unlocked,
}

/// Parameters a session needs beyond its verification store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// KDF used by [`SessionGuard::initialize`]. Unlock always uses the
    /// parameters stored with the verification material.
    pub kdf: KdfParams,
    /// Inactivity window before `check_idle` relocks. Zero disables.
    pub idle_timeout: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &VaultConfig) -> Self {
        Self {
            kdf: config.kdf_params(),
            idle_timeout: config.auto_lock_timeout(),
        }
    }
}

enum Session {
    Locked,
    Unlocked {
        key: Zeroizing<[u8; KEY_LEN]>,
        last_activity: Instant,
    },
}

/// Mediates every use of the master key.
///
/// Transitions (`initialize`, `unlock`, `lock`, `check_idle`, `touch`) take
/// the write lock; key use through [`SessionGuard::with_key`] takes the read
/// lock, so concurrent encrypt/decrypt calls proceed in parallel.
pub struct SessionGuard {
    store: Arc<dyn VerificationStore>,
    settings: SessionSettings,
    clock: Arc<dyn Clock>,
    session: RwLock<Session>,
}

impl fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGuard")
            .field("state", &self.state())
            .field("settings", &self.settings)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl SessionGuard {
    pub fn new(store: Arc<dyn VerificationStore>, settings: SessionSettings) -> Self {
        Self::with_clock(store, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn VerificationStore>,
        settings: SessionSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            settings,
            clock,
            session: RwLock::new(Session::Locked),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Session>, LockboxError> {
        self.session
            .read()
            .map_err(|_| LockboxError::Internal("session lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Session>, LockboxError> {
        self.session
            .write()
            .map_err(|_| LockboxError::Internal("session lock poisoned".to_string()))
    }

    /// Relocking is safe whatever state a panicking holder left behind.
    fn write_recovering(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether verification material has been persisted.
    pub fn is_initialized(&self) -> Result<bool, LockboxError> {
        self.store.exists()
    }

    pub fn state(&self) -> SessionState {
        match *self.session.read().unwrap_or_else(PoisonError::into_inner) {
            Session::Locked => SessionState::Locked,
            Session::Unlocked { .. } => SessionState::Unlocked,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.settings.idle_timeout
    }

    /// Time left before `check_idle` would relock. `None` when locked or
    /// when the timeout is disabled.
    pub fn idle_remaining(&self) -> Option<Duration> {
        if self.settings.idle_timeout.is_zero() {
            return None;
        }
        match *self.session.read().unwrap_or_else(PoisonError::into_inner) {
            Session::Locked => None,
            Session::Unlocked { last_activity, .. } => {
                let idle = self.clock.now().saturating_duration_since(last_activity);
                Some(self.settings.idle_timeout.saturating_sub(idle))
            }
        }
    }

    /// First-time setup: new salt, derived key, persisted verification
    /// material. The session ends up `Locked` and the key is discarded.
    ///
    /// With `force`, existing material is replaced and entries encrypted
    /// under the old key become unreadable.
    pub fn initialize(&self, passphrase: &SecretString, force: bool) -> Result<(), LockboxError> {
        let mut session = self.write()?;

        if self.store.exists()? && !force {
            return Err(LockboxError::AlreadyInitialized);
        }

        let salt = kdf::generate_salt()?;
        let key = kdf::derive_key(
            passphrase.expose_secret().as_bytes(),
            &salt,
            &self.settings.kdf,
        )?;
        let material =
            VerificationMaterial::new(self.settings.kdf, salt, kdf::verification_hash(&key));
        self.store.save(&material)?;

        *session = Session::Locked;
        info!(
            algorithm = %self.settings.kdf.algorithm(),
            force,
            "vault initialized"
        );
        Ok(())
    }

    /// Verify `passphrase` against the stored material and hold the key.
    ///
    /// On mismatch the state and the stored material are left untouched.
    /// Calling this while unlocked re-verifies and refreshes the key.
    pub fn unlock(&self, passphrase: &SecretString) -> Result<(), LockboxError> {
        let mut session = self.write()?;

        let material = self.store.load()?;
        let key = kdf::derive_key(
            passphrase.expose_secret().as_bytes(),
            &material.salt,
            &material.kdf,
        )?;

        let candidate = kdf::verification_hash(&key);
        if !bool::from(candidate.as_slice().ct_eq(&material.verification_hash)) {
            warn!("unlock rejected: invalid master password");
            return Err(LockboxError::InvalidCredentials);
        }

        *session = Session::Unlocked {
            key,
            last_activity: self.clock.now(),
        };
        info!("vault unlocked");
        Ok(())
    }

    /// Discard the key. Idempotent.
    pub fn lock(&self) {
        let mut session = self.write_recovering();
        if matches!(*session, Session::Unlocked { .. }) {
            info!("vault locked");
        }
        *session = Session::Locked;
    }

    /// Relock if the session has been idle for at least the timeout.
    /// Returns whether this call relocked.
    pub fn check_idle(&self) -> bool {
        if self.settings.idle_timeout.is_zero() {
            return false;
        }
        let mut session = self.write_recovering();
        let Session::Unlocked { last_activity, .. } = *session else {
            return false;
        };
        let idle = self.clock.now().saturating_duration_since(last_activity);
        if idle < self.settings.idle_timeout {
            return false;
        }
        *session = Session::Locked;
        warn!(idle_secs = idle.as_secs(), "vault auto-locked after inactivity");
        true
    }

    /// Record activity. Fails with [`LockboxError::Locked`] when locked.
    pub fn touch(&self) -> Result<(), LockboxError> {
        match &mut *self.write()? {
            Session::Locked => Err(LockboxError::Locked),
            Session::Unlocked { last_activity, .. } => {
                *last_activity = self.clock.now();
                Ok(())
            }
        }
    }

    /// Run `f` with the master key under a shared lock.
    pub fn with_key<T>(
        &self,
        f: impl FnOnce(&[u8; KEY_LEN]) -> Result<T, LockboxError>,
    ) -> Result<T, LockboxError> {
        match &*self.read()? {
            Session::Locked => {
                debug!("key requested while locked");
                Err(LockboxError::Locked)
            }
            Session::Unlocked { key, .. } => f(&**key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MemoryVerificationStore {
        material: Mutex<Option<VerificationMaterial>>,
    }

    impl VerificationStore for MemoryVerificationStore {
        fn load(&self) -> Result<VerificationMaterial, LockboxError> {
            self.material
                .lock()
                .unwrap()
                .clone()
                .ok_or(LockboxError::NotInitialized)
        }

        fn save(&self, material: &VerificationMaterial) -> Result<(), LockboxError> {
            *self.material.lock().unwrap() = Some(material.clone());
            Ok(())
        }

        fn exists(&self) -> Result<bool, LockboxError> {
            Ok(self.material.lock().unwrap().is_some())
        }
    }

    fn settings(idle_secs: u64) -> SessionSettings {
        SessionSettings {
            kdf: KdfParams::Pbkdf2Sha256 { iterations: 4096 },
            idle_timeout: Duration::from_secs(idle_secs),
        }
    }

    fn guard(idle_secs: u64) -> (SessionGuard, Arc<MemoryVerificationStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryVerificationStore::default());
        let clock = Arc::new(ManualClock::new());
        let guard = SessionGuard::with_clock(store.clone(), settings(idle_secs), clock.clone());
        (guard, store, clock)
    }

    fn pass(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn starts_locked_and_uninitialized() {
        let (guard, _, _) = guard(300);
        assert_eq!(guard.state(), SessionState::Locked);
        assert!(!guard.is_initialized().unwrap());
        assert!(matches!(
            guard.unlock(&pass("anything")),
            Err(LockboxError::NotInitialized)
        ));
    }

    #[test]
    fn initialize_persists_material_and_stays_locked() {
        let (guard, store, _) = guard(300);
        guard.initialize(&pass("CorrectHorse1!"), false).unwrap();

        assert_eq!(guard.state(), SessionState::Locked);
        let material = store.load().unwrap();
        assert_eq!(material.verification_hash.len(), KEY_LEN);
        assert_eq!(material.kdf, KdfParams::Pbkdf2Sha256 { iterations: 4096 });

        guard.unlock(&pass("CorrectHorse1!")).unwrap();
        guard
            .with_key(|key| {
                assert_ne!(material.verification_hash.as_slice(), key.as_slice());
                assert_eq!(material.verification_hash, kdf::verification_hash(key));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn initialize_twice_needs_force() {
        let (guard, store, _) = guard(300);
        guard.initialize(&pass("first-pass"), false).unwrap();
        let first_salt = store.load().unwrap().salt;

        assert!(matches!(
            guard.initialize(&pass("second-pass"), false),
            Err(LockboxError::AlreadyInitialized)
        ));
        assert_eq!(store.load().unwrap().salt, first_salt);

        guard.initialize(&pass("second-pass"), true).unwrap();
        assert_ne!(store.load().unwrap().salt, first_salt);
        assert!(guard.unlock(&pass("second-pass")).is_ok());
    }

    #[test]
    fn wrong_passphrase_leaves_state_and_material_untouched() {
        let (guard, store, _) = guard(300);
        guard.initialize(&pass("CorrectHorse1!"), false).unwrap();
        let before = store.load().unwrap();

        assert!(matches!(
            guard.unlock(&pass("wrong")),
            Err(LockboxError::InvalidCredentials)
        ));
        assert_eq!(guard.state(), SessionState::Locked);

        let after = store.load().unwrap();
        assert_eq!(before.salt, after.salt);
        assert_eq!(before.verification_hash, after.verification_hash);
    }

    #[test]
    fn failed_reunlock_keeps_existing_session() {
        let (guard, _, _) = guard(300);
        guard.initialize(&pass("CorrectHorse1!"), false).unwrap();
        guard.unlock(&pass("CorrectHorse1!")).unwrap();

        assert!(guard.unlock(&pass("wrong")).is_err());
        assert_eq!(guard.state(), SessionState::Unlocked);
    }

    #[test]
    fn lock_removes_key_access() {
        let (guard, _, _) = guard(300);
        guard.initialize(&pass("CorrectHorse1!"), false).unwrap();
        guard.unlock(&pass("CorrectHorse1!")).unwrap();
        assert!(guard.with_key(|k| Ok(k.len())).is_ok());

        guard.lock();
        guard.lock();
        assert_eq!(guard.state(), SessionState::Locked);
        assert!(matches!(guard.with_key(|_| Ok(())), Err(LockboxError::Locked)));
        assert!(matches!(guard.touch(), Err(LockboxError::Locked)));
    }

    #[test]
    fn idle_timeout_relocks_at_threshold() {
        let (guard, _, clock) = guard(5);
        guard.initialize(&pass("CorrectHorse1!"), false).unwrap();
        guard.unlock(&pass("CorrectHorse1!")).unwrap();

        guard.touch().unwrap();
        clock.advance(Duration::from_secs(4));
        assert!(!guard.check_idle());
        assert_eq!(guard.state(), SessionState::Unlocked);
        assert_eq!(guard.idle_remaining(), Some(Duration::from_secs(1)));

        clock.advance(Duration::from_secs(2));
        assert!(guard.check_idle());
        assert_eq!(guard.state(), SessionState::Locked);
    }

    #[test]
    fn idle_exactly_at_timeout_locks() {
        let (guard, _, clock) = guard(5);
        guard.initialize(&pass("CorrectHorse1!"), false).unwrap();
        guard.unlock(&pass("CorrectHorse1!")).unwrap();
        clock.advance(Duration::from_secs(5));
        assert!(guard.check_idle());
    }

    #[test]
    fn touch_postpones_idle_lock() {
        let (guard, _, clock) = guard(5);
        guard.initialize(&pass("CorrectHorse1!"), false).unwrap();
        guard.unlock(&pass("CorrectHorse1!")).unwrap();

        clock.advance(Duration::from_secs(4));
        guard.touch().unwrap();
        clock.advance(Duration::from_secs(4));
        assert!(!guard.check_idle());
    }

    #[test]
    fn zero_timeout_never_relocks() {
        let (guard, _, clock) = guard(0);
        guard.initialize(&pass("CorrectHorse1!"), false).unwrap();
        guard.unlock(&pass("CorrectHorse1!")).unwrap();
        clock.advance(Duration::from_secs(86_400));
        assert!(!guard.check_idle());
        assert_eq!(guard.state(), SessionState::Unlocked);
        assert_eq!(guard.idle_remaining(), None);
    }

    #[test]
    #[tracing_test::traced_test]
    fn transitions_are_logged_without_the_passphrase() {
        let (guard, _, clock) = guard(5);
        guard.initialize(&pass("CorrectHorse1!"), false).unwrap();
        assert!(guard.unlock(&pass("not-it")).is_err());
        guard.unlock(&pass("CorrectHorse1!")).unwrap();
        clock.advance(Duration::from_secs(6));
        assert!(guard.check_idle());

        assert!(logs_contain("unlock rejected"));
        assert!(logs_contain("vault unlocked"));
        assert!(logs_contain("auto-locked after inactivity"));
        assert!(!logs_contain("CorrectHorse1!"));
        assert!(!logs_contain("not-it"));
    }

    #[test]
    fn debug_output_hides_key() {
        let (guard, _, _) = guard(300);
        guard.initialize(&pass("CorrectHorse1!"), false).unwrap();
        guard.unlock(&pass("CorrectHorse1!")).unwrap();
        let debug = format!("{guard:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("Unlocked"));
    }

    #[test]
    fn concurrent_key_readers() {
        let (guard, _, _) = guard(300);
        guard.initialize(&pass("CorrectHorse1!"), false).unwrap();
        guard.unlock(&pass("CorrectHorse1!")).unwrap();
        let guard = Arc::new(guard);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let guard = guard.clone();
                std::thread::spawn(move || guard.with_key(|k| Ok(k.to_vec())).unwrap())
            })
            .collect();
        let keys: Vec<Vec<u8>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(keys.windows(2).all(|w| w[0] == w[1]));
    }
}
