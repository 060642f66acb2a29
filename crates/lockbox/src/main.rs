// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lockbox - a local credential vault.
//!
//! This is the binary entry point. Every one-shot command opens its own
//! session, unlocks it from `LOCKBOX_MASTER_PASSWORD` or a prompt, runs, and
//! locks again on exit. `lockbox shell` keeps one session across commands.

mod app;
mod backup;
mod entries;
mod generate;
mod input;
mod report;
mod settings;
mod shell;
mod transfer;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use lockbox_config::model::LockboxConfig;
use lockbox_core::LockboxError;
use lockbox_vault::get_new_master_password;
use tracing::info;

use crate::app::{session_for, App};
use crate::entries::{AddArgs, DeleteArgs, GetArgs, ListArgs, SearchArgs, UpdateArgs};
use crate::generate::GenerateArgs;
use crate::report::{AuditArgs, StatsArgs};
use crate::settings::ConfigCommands;
use crate::transfer::{ExportArgs, ImportArgs};

/// Lockbox - a local credential vault.
#[derive(Parser, Debug)]
#[command(name = "lockbox", version, about, long_about = None)]
struct Cli {
    /// Use this config file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the master password and an empty vault.
    Init {
        /// Replace an existing master password. Existing entries become unreadable.
        #[arg(short, long)]
        force: bool,
    },
    /// Add a new entry.
    Add(AddArgs),
    /// Show an entry.
    Get(GetArgs),
    /// List entries.
    List(ListArgs),
    /// Change fields of an entry.
    Update(UpdateArgs),
    /// Delete an entry.
    Delete(DeleteArgs),
    /// Search entries by text or tag.
    Search(SearchArgs),
    /// Generate random passwords.
    Generate(GenerateArgs),
    /// Check for weak, reused and expired passwords.
    Audit(AuditArgs),
    /// Show vault statistics.
    Stats(StatsArgs),
    /// Write all entries to a JSON or CSV file.
    Export(ExportArgs),
    /// Add entries from a JSON or CSV file.
    Import(ImportArgs),
    /// Copy the database and verification material to a backup file.
    Backup {
        /// Destination file. Defaults to a timestamped file under `backups/`
        /// next to the database.
        path: Option<PathBuf>,
    },
    /// Replace the database with a backup.
    Restore {
        path: PathBuf,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },
    /// Show or change configuration settings.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
    /// Launch an interactive shell.
    Shell,
}

/// `RUST_LOG` wins over `[log] level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "lockbox={log_level},lockbox_vault={log_level},lockbox_storage={log_level},\
             lockbox_config={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let loaded = match cli.config.as_ref() {
        Some(path) => lockbox_config::load_and_validate_path(path),
        None => lockbox_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            lockbox_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.log.level);

    if let Err(e) = run(cli.command, config, cli.config).await {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

async fn run(
    command: Commands,
    config: LockboxConfig,
    config_path: Option<PathBuf>,
) -> Result<(), LockboxError> {
    match command {
        Commands::Init { force } => run_init(config, force).await,
        Commands::Generate(args) => generate::run_generate(&args, &config.generator),
        Commands::Config { action } => {
            settings::run_config(action, &config, config_path.as_deref())
        }
        Commands::Backup { path } => {
            unlock_session(&config)?;
            backup::run_backup(&config, path).map(|_| ())
        }
        Commands::Restore { path, force } => {
            unlock_session(&config)?;
            if !force
                && !input::confirm(&format!(
                    "Replace the vault at {} with {}?",
                    config.storage.database_path,
                    path.display()
                ))?
            {
                println!("Restore cancelled");
                return Ok(());
            }
            backup::run_restore(&config, &path)
        }
        Commands::Shell => shell::run_shell(App::open(config).await?).await,
        command => {
            let app = App::open_unlocked(config).await?;
            let result = run_entry_command(&app, command).await;
            app.close().await?;
            result
        }
    }
}

async fn run_entry_command(app: &App, command: Commands) -> Result<(), LockboxError> {
    let vault = &app.vault;
    match command {
        Commands::Add(args) => entries::run_add(vault, &app.config, args).await,
        Commands::Get(args) => entries::run_get(vault, args).await,
        Commands::List(args) => entries::run_list(vault, args).await,
        Commands::Update(args) => entries::run_update(vault, &app.config, args).await,
        Commands::Delete(args) => entries::run_delete(vault, args).await,
        Commands::Search(args) => entries::run_search(vault, args).await,
        Commands::Audit(args) => report::run_audit(vault, args).await,
        Commands::Stats(args) => report::run_stats(vault, args).await,
        Commands::Export(args) => transfer::run_export(vault, args).await,
        Commands::Import(args) => transfer::run_import(vault, args).await,
        other => Err(LockboxError::Internal(format!(
            "not an entry command: {other:?}"
        ))),
    }
}

/// Check the master password without opening the entry store.
fn unlock_session(config: &LockboxConfig) -> Result<(), LockboxError> {
    let session = session_for(config);
    if !session.is_initialized()? {
        return Err(LockboxError::NotInitialized);
    }
    session.unlock(&lockbox_vault::get_master_password()?)?;
    session.lock();
    Ok(())
}

async fn run_init(config: LockboxConfig, force: bool) -> Result<(), LockboxError> {
    let session = session_for(&config);
    if session.is_initialized()? && !force {
        return Err(LockboxError::AlreadyInitialized);
    }

    let password = get_new_master_password()?;
    session.initialize(&password, force)?;

    // Create the schema now so the first `add` finds it.
    let app = App::open(config).await?;
    app.close().await?;

    info!(path = %app.config.vault.verification_path, "master password set");
    println!("{}", "Lockbox initialized".green());
    if force {
        println!(
            "{}",
            "Entries saved under the previous master password can no longer be decrypted."
                .yellow()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_loads_config_defaults() {
        let config = lockbox_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn cli_parses_entry_commands() {
        let cli = Cli::try_parse_from([
            "lockbox", "add", "github", "-u", "alice", "--tags", "work,code", "--generate",
        ])
        .unwrap();
        match cli.command {
            Commands::Add(args) => {
                assert_eq!(args.name, "github");
                assert_eq!(args.username, "alice");
                assert_eq!(args.tags, ["work", "code"]);
                assert!(args.generate);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["lockbox", "list", "--config", "/tmp/lockbox.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/lockbox.toml")));
        assert!(matches!(cli.command, Commands::List(_)));
    }

    #[test]
    fn init_force_flag() {
        let cli = Cli::try_parse_from(["lockbox", "init", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::Init { force: true }));
    }

    #[test]
    fn search_requires_query_or_tag() {
        assert!(Cli::try_parse_from(["lockbox", "search"]).is_err());
        assert!(Cli::try_parse_from(["lockbox", "search", "--tag", "work"]).is_ok());
        assert!(Cli::try_parse_from(["lockbox", "search", "git"]).is_ok());
    }

    #[test]
    fn update_password_and_generate_conflict() {
        assert!(Cli::try_parse_from(["lockbox", "update", "x", "--password", "--generate"]).is_err());
    }

    #[test]
    fn import_flags_parse() {
        let cli = Cli::try_parse_from([
            "lockbox", "import", "dump.csv", "--dry-run", "--skip-duplicates",
        ])
        .unwrap();
        match cli.command {
            Commands::Import(args) => {
                assert_eq!(args.path, PathBuf::from("dump.csv"));
                assert!(args.dry_run && args.skip_duplicates);
                assert_eq!(args.format, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["lockbox", "export", "-f", "csv", "--decrypt"]).is_ok());
        assert!(Cli::try_parse_from(["lockbox", "export", "-f", "xml"]).is_err());
    }

    #[test]
    fn config_set_takes_key_and_value() {
        let cli = Cli::try_parse_from([
            "lockbox", "config", "set", "vault.auto_lock_timeout_secs", "60",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigCommands::Set { .. }
            }
        ));
    }

    #[test]
    fn config_show_renders_toml() {
        let config = LockboxConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("[vault]"));
        assert!(text.contains("auto_lock_timeout_secs"));
    }
}
