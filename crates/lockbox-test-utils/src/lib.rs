// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Lockbox integration tests.
//!
//! [`TestVault`] wires a temp SQLite store, a temp verification file, a
//! manual clock and a fast PBKDF2 setting into a ready-to-use [`Vault`].
//!
//! [`Vault`]: lockbox_vault::Vault

pub mod harness;

pub use harness::{TestVault, TestVaultBuilder, TEST_PASSPHRASE};
