// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entry commands: `add`, `get`, `list`, `update`, `delete`, `search`.
//!
//! Shared by the one-shot CLI and the interactive shell.

use clap::Args;
use colored::Colorize;
use lockbox_config::model::LockboxConfig;
use lockbox_core::{Entry, LockboxError};
use lockbox_vault::{generate, mask_secret, EntryUpdate, NewEntry, Vault};
use secrecy::{ExposeSecret, SecretString};

use crate::generate::GeneratorArgs;
use crate::input::{confirm, read_entry_password};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Entry name.
    pub name: String,
    #[arg(short, long, default_value = "")]
    pub username: String,
    #[arg(long, default_value = "")]
    pub url: String,
    #[arg(long, default_value = "")]
    pub notes: String,
    /// Comma-separated tags.
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,
    /// Generate the password instead of prompting for it.
    #[arg(short, long)]
    pub generate: bool,
    #[command(flatten)]
    pub generator: GeneratorArgs,
}

#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    pub name: String,
    /// Print the password in clear.
    #[arg(short = 'p', long)]
    pub show_password: bool,
    /// Print a masked preview of the password.
    #[arg(long, conflicts_with = "show_password")]
    pub preview: bool,
    #[arg(short = 'n', long)]
    pub show_notes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Only entries carrying this tag.
    #[arg(short, long)]
    pub tag: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    pub name: String,
    #[arg(short, long)]
    pub username: Option<String>,
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Replace all tags (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,
    /// Prompt for a new password.
    #[arg(short, long, conflicts_with = "generate")]
    pub password: bool,
    /// Replace the password with a generated one.
    #[arg(short, long)]
    pub generate: bool,
    #[command(flatten)]
    pub generator: GeneratorArgs,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    pub name: String,
    /// Skip the confirmation prompt.
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Substring matched against name, username, url and notes.
    #[arg(required_unless_present = "tag")]
    pub query: Option<String>,
    /// Exact tag match instead of a text search.
    #[arg(short, long, conflicts_with = "query")]
    pub tag: Option<String>,
}

pub async fn run_add(vault: &Vault, config: &LockboxConfig, args: AddArgs) -> Result<(), LockboxError> {
    // Fail before prompting when the session is gone.
    vault.session().touch()?;

    let password = if args.generate {
        let password = generate(&args.generator.options(&config.generator))?;
        println!("Generated password: {}", password.expose_secret());
        password
    } else {
        read_entry_password("Entry password")?
    };

    let entry = vault
        .add(NewEntry {
            name: args.name,
            password,
            username: args.username,
            url: args.url,
            notes: args.notes,
            tags: args.tags,
            created_at: None,
            updated_at: None,
        })
        .await?;
    println!("Added entry: {}", entry.name.bold());
    Ok(())
}

pub async fn run_get(vault: &Vault, args: GetArgs) -> Result<(), LockboxError> {
    let entry = vault.get(&args.name).await?;

    println!("{:<14}{}", "Name:", entry.name.bold());
    if !entry.metadata.username.is_empty() {
        println!("{:<14}{}", "Username:", entry.metadata.username);
    }
    if !entry.metadata.url.is_empty() {
        println!("{:<14}{}", "URL:", entry.metadata.url);
    }
    if args.show_password || args.preview {
        let password = vault.reveal(&args.name).await?;
        let shown = if args.show_password {
            password.expose_secret().to_string()
        } else {
            mask_secret(password.expose_secret())
        };
        println!("{:<14}{}", "Password:", shown);
    }
    if args.show_notes && !entry.metadata.notes.is_empty() {
        println!("{:<14}{}", "Notes:", entry.metadata.notes);
    }
    if !entry.metadata.tags.is_empty() {
        println!("{:<14}{}", "Tags:", entry.metadata.tags.join(", "));
    }
    println!(
        "{:<14}{}",
        "Created:",
        entry.metadata.created_at.format(TIME_FORMAT)
    );
    println!(
        "{:<14}{}",
        "Last modified:",
        entry.metadata.updated_at.format(TIME_FORMAT)
    );
    Ok(())
}

pub async fn run_list(vault: &Vault, args: ListArgs) -> Result<(), LockboxError> {
    let entries = match args.tag {
        Some(tag) => vault.by_tag(&tag).await?,
        None => vault.list().await?,
    };
    print_entries(&entries);
    Ok(())
}

pub async fn run_update(
    vault: &Vault,
    config: &LockboxConfig,
    args: UpdateArgs,
) -> Result<(), LockboxError> {
    vault.session().touch()?;

    let password: Option<SecretString> = if args.generate {
        let password = generate(&args.generator.options(&config.generator))?;
        println!("Generated password: {}", password.expose_secret());
        Some(password)
    } else if args.password {
        Some(read_entry_password("New entry password")?)
    } else {
        None
    };

    let changes = EntryUpdate {
        password,
        username: args.username,
        url: args.url,
        notes: args.notes,
        tags: args.tags,
    };
    if changes.is_empty() {
        return Err(LockboxError::InvalidEntry(
            "nothing to update -- pass at least one field".to_string(),
        ));
    }

    let entry = vault.update(&args.name, changes).await?;
    println!("Updated entry: {}", entry.name.bold());
    Ok(())
}

pub async fn run_delete(vault: &Vault, args: DeleteArgs) -> Result<(), LockboxError> {
    // Surface NotFound before asking.
    vault.get(&args.name).await?;

    if !args.force && !confirm(&format!("Delete entry '{}'?", args.name))? {
        println!("Deletion cancelled");
        return Ok(());
    }
    vault.delete(&args.name).await?;
    println!("Deleted entry: {}", args.name.bold());
    Ok(())
}

pub async fn run_search(vault: &Vault, args: SearchArgs) -> Result<(), LockboxError> {
    let entries = match (args.tag, args.query) {
        (Some(tag), _) => vault.by_tag(&tag).await?,
        (None, Some(query)) => vault.search(&query).await?,
        (None, None) => {
            return Err(LockboxError::InvalidEntry(
                "a search query or --tag is required".to_string(),
            ));
        }
    };
    print_entries(&entries);
    Ok(())
}

/// Name / username / url / tags table.
pub fn print_entries(entries: &[Entry]) {
    if entries.is_empty() {
        println!("{}", "No entries found".dimmed());
        return;
    }

    let rows: Vec<[String; 4]> = entries
        .iter()
        .map(|e| {
            [
                e.name.clone(),
                e.metadata.username.clone(),
                e.metadata.url.clone(),
                e.metadata.tags.join(","),
            ]
        })
        .collect();
    let headers = ["NAME", "USERNAME", "URL", "TAGS"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header = format_row(&headers.map(str::to_string), &widths);
    println!("{}", header.bold());
    for row in &rows {
        println!("{}", format_row(row, &widths));
    }
    println!("{}", format!("{} entries", entries.len()).dimmed());
}

fn format_row(cells: &[String; 4], widths: &[usize; 4]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_column_widths() {
        let cells = [
            "github".to_string(),
            "alice".to_string(),
            String::new(),
            "work".to_string(),
        ];
        let row = format_row(&cells, &[8, 6, 3, 4]);
        assert_eq!(row, format!("github    alice{}work", " ".repeat(8)));
    }
}
