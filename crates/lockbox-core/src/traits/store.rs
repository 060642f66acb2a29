// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence contract for encrypted entries.

use async_trait::async_trait;

use crate::error::LockboxError;
use crate::types::{Entry, StoreStats};

/// Persistence backend for encrypted entries.
///
/// Implementations only ever see ciphertext in [`Entry::password`]. Each
/// operation is atomic from the caller's point of view; the backend
/// serializes its own reads and writes.
#[async_trait]
pub trait SecretStore: Send + Sync + 'static {
    /// Prepares the backend (migrations, connections).
    async fn initialize(&self) -> Result<(), LockboxError>;

    /// Flushes pending writes and releases resources.
    async fn close(&self) -> Result<(), LockboxError>;

    /// Inserts a new entry. Fails with [`LockboxError::AlreadyExists`] on a
    /// duplicate name.
    async fn put(&self, entry: &Entry) -> Result<(), LockboxError>;

    /// Fetches an entry by name. Fails with [`LockboxError::NotFound`].
    async fn get(&self, name: &str) -> Result<Entry, LockboxError>;

    /// Replaces an existing entry's password and metadata, keyed by name.
    /// Fails with [`LockboxError::NotFound`].
    async fn update(&self, entry: &Entry) -> Result<(), LockboxError>;

    /// Removes an entry. Fails with [`LockboxError::NotFound`].
    async fn delete(&self, name: &str) -> Result<(), LockboxError>;

    /// All entries, ordered by name.
    async fn list(&self) -> Result<Vec<Entry>, LockboxError>;

    /// Entries whose name, username, url or notes contain `query`.
    async fn search(&self, query: &str) -> Result<Vec<Entry>, LockboxError>;

    /// Entries carrying exactly `tag`.
    async fn list_by_tag(&self, tag: &str) -> Result<Vec<Entry>, LockboxError>;

    /// Aggregate statistics.
    async fn stats(&self) -> Result<StoreStats, LockboxError>;
}
