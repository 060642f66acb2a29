// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lockbox audit` and `lockbox stats`.

use clap::Args;
use colored::Colorize;
use lockbox_core::LockboxError;
use lockbox_vault::{AuditChecks, AuditReport, Vault, VaultStats};

#[derive(Args, Debug, Clone, Default)]
pub struct AuditArgs {
    /// Only check password strength.
    #[arg(long)]
    pub weak: bool,
    /// Only check for passwords shared between entries.
    #[arg(long)]
    pub reused: bool,
    /// Only check password age.
    #[arg(long)]
    pub expired: bool,
    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl AuditArgs {
    /// No selection flag means every check.
    pub fn checks(&self) -> AuditChecks {
        if !(self.weak || self.reused || self.expired) {
            return AuditChecks::ALL;
        }
        AuditChecks {
            weak: self.weak,
            reused: self.reused,
            expired: self.expired,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct StatsArgs {
    /// Include weak / reused / expired counts (decrypts every entry).
    #[arg(short, long)]
    pub detailed: bool,
    #[arg(long)]
    pub json: bool,
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, LockboxError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| LockboxError::Internal(format!("failed to serialize report: {e}")))
}

pub async fn run_audit(vault: &Vault, args: AuditArgs) -> Result<(), LockboxError> {
    let report = vault.audit(args.checks()).await?;
    if args.json {
        println!("{}", to_json(&report)?);
    } else {
        print_audit(&report);
    }
    Ok(())
}

fn print_audit(report: &AuditReport) {
    if report.is_clean() {
        println!("{}", "No issues found".green());
        return;
    }

    if !report.weak.is_empty() {
        println!("{}", "Weak passwords".bold().yellow());
        for weak in &report.weak {
            println!("  {}: {}", weak.name, weak.weaknesses.join(", "));
        }
    }
    if !report.reused.is_empty() {
        println!("{}", "Reused passwords".bold().yellow());
        for group in &report.reused {
            println!("  {}", group.join(", "));
        }
    }
    if !report.expired.is_empty() {
        println!("{}", "Expired passwords".bold().yellow());
        for expired in &report.expired {
            println!("  {}: {:.0} days old", expired.name, expired.age_days);
        }
    }
    println!(
        "{}",
        format!("{} issue(s) found", report.issue_count()).red()
    );
}

pub async fn run_stats(vault: &Vault, args: StatsArgs) -> Result<(), LockboxError> {
    let stats = vault.stats(args.detailed).await?;
    if args.json {
        println!("{}", to_json(&stats)?);
    } else {
        print_stats(&stats);
    }
    Ok(())
}

fn print_stats(stats: &VaultStats) {
    let store = &stats.store;
    println!("{:<22}{}", "Total entries:", store.total_entries);
    if let Some(oldest) = store.oldest_entry {
        println!("{:<22}{}", "Oldest entry:", oldest.format("%Y-%m-%d"));
    }
    if let Some(newest) = store.newest_entry {
        println!("{:<22}{}", "Newest entry:", newest.format("%Y-%m-%d"));
    }
    if store.total_entries > 0 {
        println!("{:<22}{:.1} days", "Average age:", store.average_age_days);
    }

    if let Some(detail) = stats.detail {
        println!();
        println!("{:<22}{}", "Weak passwords:", detail.weak);
        println!("{:<22}{}", "Reused passwords:", detail.reused);
        println!("{:<22}{}", "Expired passwords:", detail.expired);
    }
}
