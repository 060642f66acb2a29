// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lockbox backup` and `lockbox restore` command implementation.
//!
//! Uses rusqlite's Backup API for consistent copies that work even while the
//! database is being written in WAL mode. Entry passwords stay encrypted in
//! the copy. The verification material lives in its own file, so it is
//! copied next to the database backup as `<backup>.master.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use lockbox_config::model::LockboxConfig;
use lockbox_core::{LockboxError, VerificationStore};
use lockbox_vault::FileVerificationStore;
use rusqlite::{Connection, OpenFlags};
use tracing::info;

fn not_found(what: &str, path: &Path) -> LockboxError {
    LockboxError::storage(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("{what} not found: {}", path.display()),
    ))
}

/// Copy `src` into `dst` page by page. Returns the size of `dst` in bytes.
fn copy_database(src: &Connection, dst_path: &Path) -> Result<u64, LockboxError> {
    let mut dst = Connection::open(dst_path).map_err(LockboxError::storage)?;
    let backup = rusqlite::backup::Backup::new(src, &mut dst).map_err(LockboxError::storage)?;

    // 100 pages per step with a short pause lets writers continue.
    backup
        .run_to_completion(100, Duration::from_millis(10), None)
        .map_err(LockboxError::storage)?;
    drop(backup);
    drop(dst);
    restrict_to_owner(dst_path)?;

    let metadata = std::fs::metadata(dst_path).map_err(LockboxError::storage)?;
    Ok(metadata.len())
}

/// Snapshot the database at `db_path` into `backup_path`.
pub fn backup_database(db_path: &Path, backup_path: &Path) -> Result<u64, LockboxError> {
    if !db_path.exists() {
        return Err(not_found("database", db_path));
    }

    let src = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(LockboxError::storage)?;
    copy_database(&src, backup_path)
}

/// Replace the database at `db_path` with `restore_from`.
///
/// The current database, if any, is first copied to `<db_path>.pre-restore`.
pub fn restore_database(db_path: &Path, restore_from: &Path) -> Result<u64, LockboxError> {
    if !restore_from.exists() {
        return Err(not_found("backup file", restore_from));
    }

    let src = Connection::open_with_flags(restore_from, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(LockboxError::storage)?;
    // Rejects files that are not SQLite databases.
    src.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
        row.get::<_, i64>(0)
    })
    .map_err(LockboxError::storage)?;

    if db_path.exists() {
        let pre_restore = with_suffix(db_path, ".pre-restore");
        eprintln!("Creating safety backup: {}", pre_restore.display());
        backup_database(db_path, &pre_restore)?;
    }

    copy_database(&src, db_path)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Where the verification material for a database backup is kept.
pub fn material_sidecar(backup_path: &Path) -> PathBuf {
    with_suffix(backup_path, ".master.json")
}

fn default_backup_path(db_path: &Path) -> PathBuf {
    let dir = db_path
        .parent()
        .map(|p| p.join("backups"))
        .unwrap_or_else(|| PathBuf::from("backups"));
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("lockbox_backup_{stamp}.db"))
}

/// Database copies are owner-only, like the verification file.
pub(crate) fn restrict_to_owner(path: &Path) -> Result<(), LockboxError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(LockboxError::storage)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

pub(crate) fn ensure_private_dir(dir: &Path) -> Result<(), LockboxError> {
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(LockboxError::storage)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))
            .map_err(LockboxError::storage)?;
    }
    Ok(())
}

/// `lockbox backup [PATH]`: database plus verification material.
pub fn run_backup(config: &LockboxConfig, output: Option<PathBuf>) -> Result<PathBuf, LockboxError> {
    let db_path = Path::new(&config.storage.database_path);
    let backup_path = output.unwrap_or_else(|| default_backup_path(db_path));
    if let Some(parent) = backup_path.parent() {
        ensure_private_dir(parent)?;
    }

    let bytes = backup_database(db_path, &backup_path)?;

    let material = FileVerificationStore::new(&config.vault.verification_path).load()?;
    FileVerificationStore::new(material_sidecar(&backup_path)).save(&material)?;

    let size_mb = bytes as f64 / (1024.0 * 1024.0);
    info!(path = %backup_path.display(), bytes, "backup written");
    eprintln!(
        "Backup complete: {size_mb:.1} MB written to {}",
        backup_path.display()
    );
    Ok(backup_path)
}

/// `lockbox restore PATH`.
///
/// When the backup has a material sidecar, the current verification file is
/// kept as `<file>.pre-restore` and replaced, so the restored entries open
/// with the master password they were sealed under.
pub fn run_restore(config: &LockboxConfig, from: &Path) -> Result<(), LockboxError> {
    let db_path = Path::new(&config.storage.database_path);
    let bytes = restore_database(db_path, from)?;

    let sidecar = material_sidecar(from);
    if sidecar.exists() {
        let restored = FileVerificationStore::new(&sidecar).load()?;
        let current = FileVerificationStore::new(&config.vault.verification_path);
        if current.exists()? {
            let previous = current.load()?;
            FileVerificationStore::new(with_suffix(current.path(), ".pre-restore"))
                .save(&previous)?;
        }
        current.save(&restored)?;
        eprintln!("Restored verification material from {}", sidecar.display());
    }

    let size_mb = bytes as f64 / (1024.0 * 1024.0);
    info!(from = %from.display(), bytes, "database restored");
    eprintln!("Restore complete: {size_mb:.1} MB restored from {}", from.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockbox_core::{KdfParams, VerificationMaterial, KEY_LEN, SALT_LEN};

    fn seed_db(path: &Path, table: &str, value: i64) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(&format!(
            "CREATE TABLE {table} (id INTEGER PRIMARY KEY);
             INSERT INTO {table} VALUES ({value});"
        ))
        .unwrap();
    }

    fn material(fill: u8) -> VerificationMaterial {
        VerificationMaterial::new(
            KdfParams::Pbkdf2Sha256 { iterations: 4096 },
            [fill; SALT_LEN],
            vec![fill; KEY_LEN],
        )
    }

    fn config_in(dir: &Path) -> LockboxConfig {
        let mut config = LockboxConfig::default();
        config.storage.database_path = dir.join("lockbox.db").to_string_lossy().into_owned();
        config.vault.verification_path = dir.join("master.json").to_string_lossy().into_owned();
        config
    }

    #[test]
    fn backup_nonexistent_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = backup_database(&dir.path().join("missing.db"), &dir.path().join("out.db"))
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn restore_nonexistent_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = restore_database(&dir.path().join("target.db"), &dir.path().join("missing.db"))
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn restore_rejects_non_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.db");
        std::fs::write(&bogus, b"definitely not sqlite, just some bytes padding it out").unwrap();
        assert!(restore_database(&dir.path().join("target.db"), &bogus).is_err());
    }

    #[test]
    fn backup_copies_rows() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("source.db");
        let dst = dir.path().join("backup.db");
        seed_db(&src, "data", 7);

        let bytes = backup_database(&src, &dst).unwrap();
        assert!(bytes > 0);

        let conn = Connection::open(&dst).unwrap();
        let id: i64 = conn.query_row("SELECT id FROM data", [], |r| r.get(0)).unwrap();
        assert_eq!(id, 7);
    }

    #[test]
    fn restore_keeps_pre_restore_copy() {
        let dir = tempfile::tempdir().unwrap();
        let current = dir.path().join("current.db");
        let backup = dir.path().join("backup.db");
        seed_db(&current, "current_data", 1);
        seed_db(&backup, "restored_data", 42);

        restore_database(&current, &backup).unwrap();

        let pre = with_suffix(&current, ".pre-restore");
        let conn = Connection::open(&pre).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM current_data", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);

        let conn = Connection::open(&current).unwrap();
        let id: i64 = conn
            .query_row("SELECT id FROM restored_data", [], |r| r.get(0))
            .unwrap();
        assert_eq!(id, 42);
    }

    #[test]
    fn sidecar_path_appends_suffix() {
        assert_eq!(
            material_sidecar(Path::new("/tmp/b/lockbox.db")),
            PathBuf::from("/tmp/b/lockbox.db.master.json")
        );
    }

    #[test]
    fn backup_and_restore_carry_verification_material() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        seed_db(Path::new(&config.storage.database_path), "entries_stub", 1);
        FileVerificationStore::new(&config.vault.verification_path)
            .save(&material(1))
            .unwrap();

        let backup = run_backup(&config, Some(dir.path().join("out/backup.db"))).unwrap();
        assert!(material_sidecar(&backup).exists());

        // Re-initialization replaced the material after the backup was taken.
        FileVerificationStore::new(&config.vault.verification_path)
            .save(&material(2))
            .unwrap();

        run_restore(&config, &backup).unwrap();

        let restored = FileVerificationStore::new(&config.vault.verification_path)
            .load()
            .unwrap();
        assert_eq!(restored.salt, [1u8; SALT_LEN]);
        let previous = FileVerificationStore::new(dir.path().join("master.json.pre-restore"))
            .load()
            .unwrap();
        assert_eq!(previous.salt, [2u8; SALT_LEN]);
    }

    #[cfg(unix)]
    #[test]
    fn backup_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        seed_db(Path::new(&config.storage.database_path), "entries_stub", 1);
        FileVerificationStore::new(&config.vault.verification_path)
            .save(&material(1))
            .unwrap();

        let backup = run_backup(&config, Some(dir.path().join("backup.db"))).unwrap();
        for path in [backup.clone(), material_sidecar(&backup)] {
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600, "{}", path.display());
        }
    }
}
