// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits the vault core requires from the outside world.
//!
//! [`SecretStore`] is async and uses `#[async_trait]` for dynamic dispatch
//! compatibility; [`VerificationStore`] is a small synchronous file contract.

pub mod store;
pub mod verification;

pub use store::SecretStore;
pub use verification::VerificationStore;
