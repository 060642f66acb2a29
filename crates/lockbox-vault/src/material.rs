// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed [`VerificationStore`].
//!
//! The material is a small JSON document written atomically: a temp file in
//! the same directory (created owner-only by `tempfile`) is synced and then
//! renamed over the target.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use lockbox_core::{LockboxError, VerificationMaterial, VerificationStore};
use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileVerificationStore {
    path: PathBuf,
}

impl FileVerificationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<PathBuf, LockboxError> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.exists() {
            fs::create_dir_all(&parent).map_err(LockboxError::storage)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&parent, fs::Permissions::from_mode(0o700))
                    .map_err(LockboxError::storage)?;
            }
        }
        Ok(parent)
    }
}

impl VerificationStore for FileVerificationStore {
    fn load(&self) -> Result<VerificationMaterial, LockboxError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LockboxError::NotInitialized);
            }
            Err(e) => return Err(LockboxError::storage(e)),
        };
        let material: VerificationMaterial =
            serde_json::from_slice(&data).map_err(LockboxError::storage)?;
        if material.version != VerificationMaterial::CURRENT_VERSION {
            return Err(LockboxError::Config(format!(
                "{}: unsupported verification material version {} (expected {}); \
                 run `lockbox init --force` to create a new master password",
                self.path.display(),
                material.version,
                VerificationMaterial::CURRENT_VERSION
            )));
        }
        Ok(material)
    }

    fn save(&self, material: &VerificationMaterial) -> Result<(), LockboxError> {
        let dir = self.ensure_parent_dir()?;
        let json = serde_json::to_vec_pretty(material).map_err(LockboxError::storage)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(LockboxError::storage)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(LockboxError::storage)?;
        }
        tmp.write_all(&json).map_err(LockboxError::storage)?;
        tmp.as_file().sync_all().map_err(LockboxError::storage)?;
        tmp.persist(&self.path)
            .map_err(|e| LockboxError::storage(e.error))?;

        debug!(path = %self.path.display(), "verification material saved");
        Ok(())
    }

    fn exists(&self) -> Result<bool, LockboxError> {
        self.path.try_exists().map_err(LockboxError::storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockbox_core::{KdfParams, KEY_LEN, SALT_LEN};

    fn sample() -> VerificationMaterial {
        VerificationMaterial::new(
            KdfParams::Pbkdf2Sha256 { iterations: 4096 },
            [9u8; SALT_LEN],
            vec![3u8; KEY_LEN],
        )
    }

    #[test]
    fn missing_file_is_not_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVerificationStore::new(dir.path().join("master.json"));
        assert!(!store.exists().unwrap());
        assert!(matches!(store.load(), Err(LockboxError::NotInitialized)));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVerificationStore::new(dir.path().join("nested/master.json"));
        store.save(&sample()).unwrap();

        assert!(store.exists().unwrap());
        let loaded = store.load().unwrap();
        assert_eq!(loaded.salt, [9u8; SALT_LEN]);
        assert_eq!(loaded.verification_hash, vec![3u8; KEY_LEN]);
        assert_eq!(loaded.kdf, KdfParams::Pbkdf2Sha256 { iterations: 4096 });
    }

    #[test]
    fn save_replaces_previous_material() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVerificationStore::new(dir.path().join("master.json"));
        store.save(&sample()).unwrap();

        let mut next = sample();
        next.salt = [1u8; SALT_LEN];
        store.save(&next).unwrap();
        assert_eq!(store.load().unwrap().salt, [1u8; SALT_LEN]);
    }

    #[cfg(unix)]
    #[test]
    fn file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.json");
        FileVerificationStore::new(&path).save(&sample()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.json");
        fs::write(&path, b"{not json").unwrap();
        assert!(matches!(
            FileVerificationStore::new(&path).load(),
            Err(LockboxError::Storage { .. })
        ));
    }

    #[test]
    fn material_from_an_older_format_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVerificationStore::new(dir.path().join("master.json"));
        let mut old = sample();
        old.version = 1;
        store.save(&old).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, LockboxError::Config(msg) if msg.contains("init --force")));
    }
}
