// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lockbox config` command implementation.
//!
//! Settings are addressed as `section.key`, matching the TOML layout.
//! `set` edits one file (the `--config` file, or `./lockbox.toml`) and only
//! writes it when the result is a valid configuration on its own.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use lockbox_config::loader::LOCAL_CONFIG_FILE;
use lockbox_config::model::LockboxConfig;
use lockbox_config::ConfigError;
use lockbox_core::LockboxError;
use tracing::info;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML.
    Show,
    /// Print one setting, e.g. `vault.auto_lock_timeout_secs`.
    Get { key: String },
    /// Write one setting to the config file.
    Set { key: String, value: String },
}

fn render(value: &impl serde::Serialize) -> Result<String, LockboxError> {
    toml::to_string_pretty(value)
        .map_err(|e| LockboxError::Config(format!("failed to render config: {e}")))
}

/// Effective value of `key` in `config`.
pub fn get_setting(config: &LockboxConfig, key: &str) -> Result<toml::Value, LockboxError> {
    let unknown = || LockboxError::Config(format!("unknown setting `{key}`"));
    let mut value = toml::Value::try_from(config)
        .map_err(|e| LockboxError::Config(format!("failed to render config: {e}")))?;
    for part in key.split('.') {
        value = match value {
            toml::Value::Table(mut table) => table.remove(part).ok_or_else(unknown)?,
            _ => return Err(unknown()),
        };
    }
    Ok(value)
}

/// TOML literal if it parses as one, otherwise a plain string, so
/// `300`, `true` and `argon2id` all work unquoted.
fn parse_value(raw: &str) -> toml::Value {
    format!("v = {raw}")
        .parse::<toml::Table>()
        .ok()
        .and_then(|mut table| table.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

/// Return `content` with `key` set to `raw`, or the diagnostics explaining
/// why the edited file would not load.
pub fn set_setting(content: &str, key: &str, raw: &str) -> Result<String, Vec<ConfigError>> {
    let other = |msg: String| vec![ConfigError::Other(msg)];

    let (section, field) = key
        .split_once('.')
        .filter(|(s, f)| !s.is_empty() && !f.is_empty() && !f.contains('.'))
        .ok_or_else(|| other(format!("setting must look like `section.key`, got `{key}`")))?;

    let mut doc: toml::Table = content
        .parse()
        .map_err(|e| other(format!("failed to parse config file: {e}")))?;
    let slot = doc
        .entry(section.to_string())
        .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    let toml::Value::Table(table) = slot else {
        return Err(other(format!("`{section}` is not a table")));
    };
    table.insert(field.to_string(), parse_value(raw));

    let rendered = toml::to_string_pretty(&doc).map_err(|e| other(e.to_string()))?;
    lockbox_config::load_and_validate_str(&rendered)?;
    Ok(rendered)
}

pub fn run_config(
    action: ConfigCommands,
    config: &LockboxConfig,
    config_path: Option<&Path>,
) -> Result<(), LockboxError> {
    match action {
        ConfigCommands::Show => print!("{}", render(config)?),
        ConfigCommands::Get { key } => println!("{key} = {}", get_setting(config, &key)?),
        ConfigCommands::Set { key, value } => {
            let path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
                Err(e) => return Err(LockboxError::storage(e)),
            };

            let updated = match set_setting(&content, &key, &value) {
                Ok(updated) => updated,
                Err(errors) => {
                    lockbox_config::render_errors(&errors);
                    return Err(LockboxError::Config(format!(
                        "{} was not changed",
                        path.display()
                    )));
                }
            };
            std::fs::write(&path, updated).map_err(LockboxError::storage)?;

            info!(path = %path.display(), key = %key, "setting written");
            println!("Set {key} = {} in {}", parse_value(&value), path.display());
        }
    }
    Ok(())
}
