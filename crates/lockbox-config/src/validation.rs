// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Range and consistency checks run after deserialization.

use lockbox_core::KdfAlgorithm;

use crate::diagnostic::ConfigError;
use crate::model::LockboxConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &LockboxConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.log.level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::validation(format!(
            "log.level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.log.level
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }
    if config.vault.verification_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "vault.verification_path must not be empty",
        ));
    }

    let vault = &config.vault;
    match vault.kdf {
        KdfAlgorithm::Argon2id => {
            if vault.kdf_memory_cost < 32768 {
                errors.push(ConfigError::validation(format!(
                    "vault.kdf_memory_cost must be at least 32768 (32 MiB), got {}",
                    vault.kdf_memory_cost
                )));
            }
            if vault.kdf_iterations < 2 {
                errors.push(ConfigError::validation(format!(
                    "vault.kdf_iterations must be at least 2, got {}",
                    vault.kdf_iterations
                )));
            }
            if vault.kdf_parallelism < 1 {
                errors.push(ConfigError::validation(
                    "vault.kdf_parallelism must be at least 1",
                ));
            }
        }
        KdfAlgorithm::Pbkdf2 => {
            if vault.pbkdf2_iterations < 4096 {
                errors.push(ConfigError::validation(format!(
                    "vault.pbkdf2_iterations must be at least 4096, got {}",
                    vault.pbkdf2_iterations
                )));
            }
        }
    }

    if config.audit.min_password_length == 0 {
        errors.push(ConfigError::validation(
            "audit.min_password_length must be at least 1",
        ));
    }

    if config.generator.length < 8 {
        errors.push(ConfigError::validation(format!(
            "generator.length must be at least 8, got {}",
            config.generator.length
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
