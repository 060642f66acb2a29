// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lockbox export` and `lockbox import` command implementation.
//!
//! JSON documents carry an `encrypted` flag. When set, each password is the
//! hex of its at-rest blob and only opens in a vault with the same master
//! key. CSV has no room for the flag, so `import --encrypted` supplies it.
//!
//! Imports are checked in full before the first entry is written. A failed
//! import adds nothing.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use clap::{Args, ValueEnum};
use colored::Colorize;
use lockbox_core::{Entry, LockboxError};
use lockbox_vault::{CredentialCodec, NewEntry, Vault};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::backup::{ensure_private_dir, restrict_to_owner};

pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Json,
    Csv,
}

impl Format {
    /// `.csv` files are CSV, anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Format::Csv,
            _ => Format::Json,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Csv => "csv",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Output file. Defaults to `lockbox_export_<timestamp>.<format>`.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    pub format: Format,
    /// Write plaintext passwords instead of encrypted blobs.
    #[arg(short, long)]
    pub decrypt: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    pub path: PathBuf,
    /// Defaults to the file extension.
    #[arg(short, long, value_enum)]
    pub format: Option<Format>,
    /// CSV passwords are encrypted blobs from `export` without `--decrypt`.
    /// JSON files say this themselves.
    #[arg(long)]
    pub encrypted: bool,
    /// Check the file and report what would be imported.
    #[arg(long)]
    pub dry_run: bool,
    /// Skip entries whose name already exists instead of failing.
    #[arg(long)]
    pub skip_duplicates: bool,
}

/// The JSON export file.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportDocument {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub encrypted: bool,
    pub entries: Vec<ExportedEntry>,
}

#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ExportedEntry {
    pub name: String,
    #[serde(default)]
    pub username: String,
    /// Plaintext, or hex of the sealed blob when the document is encrypted.
    pub password: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    #[zeroize(skip)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[zeroize(skip)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for ExportedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportedEntry")
            .field("name", &self.name)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl ExportedEntry {
    fn from_entry(entry: &Entry, password: String) -> Self {
        Self {
            name: entry.name.clone(),
            username: entry.metadata.username.clone(),
            password,
            url: entry.metadata.url.clone(),
            notes: entry.metadata.notes.clone(),
            tags: entry.metadata.tags.clone(),
            created_at: Some(entry.metadata.created_at),
            updated_at: Some(entry.metadata.updated_at),
        }
    }
}

/// One CSV record. Tags are joined with `;`.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct CsvRow {
    name: String,
    username: String,
    password: String,
    url: String,
    notes: String,
    tags: String,
    #[zeroize(skip)]
    created_at: Option<DateTime<Utc>>,
    #[zeroize(skip)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<&ExportedEntry> for CsvRow {
    fn from(entry: &ExportedEntry) -> Self {
        Self {
            name: entry.name.clone(),
            username: entry.username.clone(),
            password: entry.password.clone(),
            url: entry.url.clone(),
            notes: entry.notes.clone(),
            tags: entry.tags.join(";"),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

impl From<&CsvRow> for ExportedEntry {
    fn from(row: &CsvRow) -> Self {
        Self {
            name: row.name.clone(),
            username: row.username.clone(),
            password: row.password.clone(),
            url: row.url.clone(),
            notes: row.notes.clone(),
            tags: row
                .tags
                .split(';')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Every entry in name order, passwords decrypted or as hex blobs.
pub async fn export_entries(vault: &Vault, decrypt: bool) -> Result<ExportDocument, LockboxError> {
    let entries = vault.list().await?;
    let mut exported = Vec::with_capacity(entries.len());
    for entry in &entries {
        let password = if decrypt {
            vault.reveal(&entry.name).await?.expose_secret().to_owned()
        } else {
            hex::encode(&entry.password)
        };
        exported.push(ExportedEntry::from_entry(entry, password));
    }
    Ok(ExportDocument {
        version: EXPORT_VERSION,
        exported_at: Utc::now(),
        encrypted: !decrypt,
        entries: exported,
    })
}

fn create_private_file(path: &Path) -> Result<File, LockboxError> {
    if let Some(parent) = path.parent() {
        ensure_private_dir(parent)?;
    }
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let file = options.open(path).map_err(LockboxError::storage)?;
    // `mode` only applies to newly created files.
    restrict_to_owner(path)?;
    Ok(file)
}

pub fn write_document(doc: &ExportDocument, format: Format, path: &Path) -> Result<(), LockboxError> {
    let mut out = BufWriter::new(create_private_file(path)?);
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, doc).map_err(LockboxError::storage)?;
            out.write_all(b"\n").map_err(LockboxError::storage)?;
        }
        Format::Csv => {
            let mut writer = csv::Writer::from_writer(&mut out);
            for entry in &doc.entries {
                writer
                    .serialize(CsvRow::from(entry))
                    .map_err(LockboxError::storage)?;
            }
            writer.flush().map_err(LockboxError::storage)?;
        }
    }
    out.flush().map_err(LockboxError::storage)
}

/// `encrypted` only matters for CSV; JSON documents carry their own flag.
pub fn read_document(path: &Path, format: Format, encrypted: bool) -> Result<ExportDocument, LockboxError> {
    let file = File::open(path).map_err(LockboxError::storage)?;
    match format {
        Format::Json => {
            let doc: ExportDocument =
                serde_json::from_reader(BufReader::new(file)).map_err(LockboxError::storage)?;
            if doc.version != EXPORT_VERSION {
                return Err(LockboxError::InvalidEntry(format!(
                    "unsupported export version {} (expected {EXPORT_VERSION})",
                    doc.version
                )));
            }
            Ok(doc)
        }
        Format::Csv => {
            let mut reader = csv::Reader::from_reader(BufReader::new(file));
            let mut entries = Vec::new();
            for row in reader.deserialize::<CsvRow>() {
                let row = row.map_err(LockboxError::storage)?;
                entries.push(ExportedEntry::from(&row));
            }
            Ok(ExportDocument {
                version: EXPORT_VERSION,
                exported_at: Utc::now(),
                encrypted,
                entries,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
    pub skip_duplicates: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Add the document's entries through [`Vault::add`].
///
/// Duplicates are names already in the vault or repeated within the file.
/// Encrypted passwords must open under the current key; they are re-sealed
/// with a fresh nonce.
pub async fn import_entries(
    vault: &Vault,
    doc: &ExportDocument,
    options: ImportOptions,
) -> Result<ImportSummary, LockboxError> {
    let codec = CredentialCodec::new(vault.session());
    let mut seen = HashSet::new();
    let mut pending = Vec::with_capacity(doc.entries.len());
    let mut skipped = 0;

    for item in &doc.entries {
        let name = item.name.trim();
        if name.is_empty() {
            return Err(LockboxError::InvalidEntry(
                "imported entry has no name".to_string(),
            ));
        }

        let exists = match vault.get(name).await {
            Ok(_) => true,
            Err(LockboxError::NotFound { .. }) => false,
            Err(e) => return Err(e),
        };
        if exists || !seen.insert(name.to_string()) {
            if options.skip_duplicates {
                skipped += 1;
                continue;
            }
            return Err(LockboxError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let password = if doc.encrypted {
            let blob = hex::decode(&item.password).map_err(|e| {
                LockboxError::MalformedCiphertext(format!("{name}: password is not hex: {e}"))
            })?;
            codec.decrypt(&blob).inspect_err(|_| {
                warn!(name, "imported password does not open under this master key");
            })?
        } else {
            SecretString::from(item.password.clone())
        };
        if password.expose_secret().is_empty() {
            return Err(LockboxError::InvalidEntry(format!(
                "{name}: password is required"
            )));
        }

        pending.push(NewEntry {
            name: name.to_string(),
            password,
            username: item.username.clone(),
            url: item.url.clone(),
            notes: item.notes.clone(),
            tags: item.tags.clone(),
            created_at: item.created_at,
            updated_at: item.updated_at,
        });
    }

    let imported = pending.len();
    if !options.dry_run {
        for new in pending {
            vault.add(new).await?;
        }
    }
    Ok(ImportSummary { imported, skipped })
}

fn default_export_path(format: Format) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("lockbox_export_{stamp}.{}", format.extension()))
}

pub async fn run_export(vault: &Vault, args: ExportArgs) -> Result<(), LockboxError> {
    let doc = export_entries(vault, args.decrypt).await?;
    let path = args
        .output
        .unwrap_or_else(|| default_export_path(args.format));
    write_document(&doc, args.format, &path)?;

    info!(
        path = %path.display(),
        entries = doc.entries.len(),
        encrypted = doc.encrypted,
        "export written"
    );
    println!("Exported {} entries to {}", doc.entries.len(), path.display());
    if doc.encrypted {
        println!("Passwords are encrypted and open only under this master password.");
    } else {
        println!("{}", "The file contains plaintext passwords.".yellow());
    }
    Ok(())
}

pub async fn run_import(vault: &Vault, args: ImportArgs) -> Result<(), LockboxError> {
    let format = args.format.unwrap_or_else(|| Format::from_path(&args.path));
    let doc = read_document(&args.path, format, args.encrypted)?;
    let summary = import_entries(
        vault,
        &doc,
        ImportOptions {
            dry_run: args.dry_run,
            skip_duplicates: args.skip_duplicates,
        },
    )
    .await?;

    info!(
        path = %args.path.display(),
        imported = summary.imported,
        skipped = summary.skipped,
        dry_run = args.dry_run,
        "import finished"
    );
    println!("Imported: {}", summary.imported);
    if summary.skipped > 0 {
        println!("Skipped duplicates: {}", summary.skipped);
    }
    if args.dry_run {
        println!("{}", "Dry run: nothing was written.".dimmed());
    }
    Ok(())
}
