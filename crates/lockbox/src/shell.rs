// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lockbox shell` command implementation.
//!
//! An interactive REPL holding one long-lived session. The vault stays
//! unlocked between commands until `lock`, the idle timeout, or exit. The
//! idle check runs before every command, so a session left alone at the
//! prompt relocks as soon as the next line is entered.

use clap::{Parser, Subcommand};
use colored::Colorize;
use lockbox_core::LockboxError;
use lockbox_vault::SessionState;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::app::App;
use crate::entries::{
    run_add, run_delete, run_get, run_list, run_search, run_update, AddArgs, DeleteArgs, GetArgs,
    ListArgs, SearchArgs, UpdateArgs,
};
use crate::generate::{run_generate, GenerateArgs};
use crate::report::{run_audit, run_stats, AuditArgs, StatsArgs};
use crate::transfer::{run_export, run_import, ExportArgs, ImportArgs};

/// One line typed at the shell prompt.
#[derive(Parser, Debug)]
#[command(name = "lockbox", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Unlock the vault with the master password.
    Unlock,
    /// Lock the vault and discard the key.
    Lock,
    /// Show lock state and time left before auto-lock.
    Status,
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
    /// Leave the shell.
    #[command(alias = "exit")]
    Quit,
}

enum Flow {
    Continue,
    Quit,
}

/// Runs the `lockbox shell` interactive REPL.
pub async fn run_shell(app: App) -> Result<(), LockboxError> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| LockboxError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "lockbox shell".bold().green());
    println!(
        "Type {} for commands, {} to exit.\n",
        "help".yellow(),
        "quit".yellow()
    );

    if app.session.is_initialized()? {
        if let Err(e) = app.unlock_interactive() {
            eprintln!("{}: {e}", "error".red());
        }
    } else {
        eprintln!(
            "{}",
            "vault is not initialized -- run `lockbox init` first".yellow()
        );
    }

    loop {
        let prompt = match app.session.state() {
            SessionState::Unlocked => format!("{}> ", "lockbox".green()),
            SessionState::Locked => format!("{}> ", "lockbox (locked)".red()),
        };

        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                if app.session.check_idle() {
                    println!("{}", "vault locked after inactivity".yellow());
                }

                let tokens = match split_args(trimmed) {
                    Ok(tokens) => tokens,
                    Err(msg) => {
                        eprintln!("{}: {msg}", "error".red());
                        continue;
                    }
                };
                let command = match ShellLine::try_parse_from(tokens) {
                    Ok(parsed) => parsed.command,
                    Err(e) => {
                        // Also covers `help` and `--help`.
                        let _ = e.print();
                        continue;
                    }
                };

                match dispatch(&app, command).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => break,
                    Err(e) => eprintln!("{}: {e}", "error".red()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    app.close().await?;
    println!("{}", "vault locked".dimmed());
    Ok(())
}

async fn dispatch(app: &App, command: ShellCommand) -> Result<Flow, LockboxError> {
    debug!(?command, "shell command");
    let vault = &app.vault;
    match command {
        ShellCommand::Unlock => {
            app.unlock_interactive()?;
            println!("{}", "vault unlocked".green());
        }
        ShellCommand::Lock => {
            app.session.lock();
            println!("{}", "vault locked".yellow());
        }
        ShellCommand::Status => print_status(app),
        ShellCommand::Add(args) => run_add(vault, &app.config, args).await?,
        ShellCommand::Get(args) => run_get(vault, args).await?,
        ShellCommand::List(args) => run_list(vault, args).await?,
        ShellCommand::Update(args) => run_update(vault, &app.config, args).await?,
        ShellCommand::Delete(args) => run_delete(vault, args).await?,
        ShellCommand::Search(args) => run_search(vault, args).await?,
        ShellCommand::Generate(args) => run_generate(&args, &app.config.generator)?,
        ShellCommand::Audit(args) => run_audit(vault, args).await?,
        ShellCommand::Stats(args) => run_stats(vault, args).await?,
        ShellCommand::Export(args) => run_export(vault, args).await?,
        ShellCommand::Import(args) => run_import(vault, args).await?,
        ShellCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn print_status(app: &App) {
    match app.session.state() {
        SessionState::Locked => println!("state: {}", "locked".red()),
        SessionState::Unlocked => {
            println!("state: {}", "unlocked".green());
            match app.session.idle_remaining() {
                Some(left) => println!("auto-lock in: {}s", left.as_secs()),
                None => println!("auto-lock: disabled"),
            }
        }
    }
}

/// Split a shell line into arguments. Single and double quotes group words;
/// a backslash escapes the next character outside single quotes.
fn split_args(line: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some('\''), '\'') | (Some('"'), '"') => quote = None,
            (Some('\''), _) => current.push(c),
            (_, '\\') => {
                let next = chars.next().ok_or("trailing backslash")?;
                current.push(next);
                in_token = true;
            }
            (Some(_), _) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_token = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (None, _) => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err("unterminated quote".to_string());
    }
    if in_token {
        args.push(current);
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(split_args("get  github -p").unwrap(), ["get", "github", "-p"]);
    }

    #[test]
    fn quotes_group_words() {
        assert_eq!(
            split_args(r#"add "my bank" --notes 'pin is in the drawer'"#).unwrap(),
            ["add", "my bank", "--notes", "pin is in the drawer"]
        );
    }

    #[test]
    fn empty_quotes_make_an_empty_argument() {
        assert_eq!(split_args(r#"update x --url """#).unwrap(), ["update", "x", "--url", ""]);
    }

    #[test]
    fn backslash_escapes() {
        assert_eq!(split_args(r#"search a\ b"#).unwrap(), ["search", "a b"]);
        assert_eq!(split_args(r#"add "say \"hi\"""#).unwrap(), ["add", r#"say "hi""#]);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        assert!(split_args(r#"add "oops"#).is_err());
        assert!(split_args(r"add oops\").is_err());
    }

    #[test]
    fn shell_lines_parse_into_commands() {
        let line = ShellLine::try_parse_from(split_args("get github --show-password").unwrap())
            .unwrap();
        assert!(matches!(
            line.command,
            ShellCommand::Get(GetArgs { ref name, show_password: true, .. }) if name == "github"
        ));

        let line = ShellLine::try_parse_from(["exit"]).unwrap();
        assert!(matches!(line.command, ShellCommand::Quit));
    }

    #[test]
    fn unknown_shell_command_is_rejected() {
        assert!(ShellLine::try_parse_from(["frobnicate"]).is_err());
    }
}
