// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weak, reused and expired password detection over decrypted entries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use lockbox_config::model::AuditConfig;
use ring::digest;
use serde::Serialize;

use crate::health::PasswordHealthEvaluator;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// One decrypted entry handed to the auditor.
#[derive(Clone, Copy)]
pub struct AuditItem<'a> {
    pub name: &'a str,
    pub password: &'a str,
    pub updated_at: DateTime<Utc>,
}

/// Which checks to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditChecks {
    pub weak: bool,
    pub reused: bool,
    pub expired: bool,
}

impl AuditChecks {
    pub const ALL: Self = Self {
        weak: true,
        reused: true,
        expired: true,
    };
}

impl Default for AuditChecks {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeakPassword {
    pub name: String,
    pub weaknesses: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiredPassword {
    pub name: String,
    pub age_days: f64,
}

/// Findings, each list sorted by entry name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditReport {
    pub weak: Vec<WeakPassword>,
    /// Groups of two or more entries sharing one password.
    pub reused: Vec<Vec<String>>,
    pub expired: Vec<ExpiredPassword>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.weak.is_empty() && self.reused.is_empty() && self.expired.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.weak.len() + self.reused.len() + self.expired.len()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Auditor {
    evaluator: PasswordHealthEvaluator,
    expiration_days: u32,
}

impl Auditor {
    /// `expiration_days == 0` disables the expiry check.
    pub fn new(evaluator: PasswordHealthEvaluator, expiration_days: u32) -> Self {
        Self {
            evaluator,
            expiration_days,
        }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(
            PasswordHealthEvaluator::new(config.min_password_length),
            config.password_expiration_days,
        )
    }

    pub fn audit<'a>(
        &self,
        items: impl IntoIterator<Item = AuditItem<'a>>,
        checks: AuditChecks,
        now: DateTime<Utc>,
    ) -> AuditReport {
        let mut report = AuditReport::default();
        // Keyed by digest so the map holds no extra plaintext copies.
        let mut by_password: BTreeMap<Vec<u8>, Vec<String>> = BTreeMap::new();

        for item in items {
            if checks.weak {
                let weaknesses = self.evaluator.evaluate(item.password).weaknesses();
                if !weaknesses.is_empty() {
                    report.weak.push(WeakPassword {
                        name: item.name.to_string(),
                        weaknesses,
                    });
                }
            }

            if checks.reused {
                let hash = digest::digest(&digest::SHA256, item.password.as_bytes());
                by_password
                    .entry(hash.as_ref().to_vec())
                    .or_default()
                    .push(item.name.to_string());
            }

            if checks.expired && self.expiration_days > 0 {
                let age_days = (now - item.updated_at).num_seconds() as f64 / SECONDS_PER_DAY;
                if age_days > f64::from(self.expiration_days) {
                    report.expired.push(ExpiredPassword {
                        name: item.name.to_string(),
                        age_days,
                    });
                }
            }
        }

        report.reused = by_password
            .into_values()
            .filter(|names| names.len() > 1)
            .map(|mut names| {
                names.sort();
                names
            })
            .collect();

        report.weak.sort_by(|a, b| a.name.cmp(&b.name));
        report.reused.sort();
        report.expired.sort_by(|a, b| a.name.cmp(&b.name));
        report
    }
}
