// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password strength classification.

use serde::Serialize;

/// Characters that satisfy the symbol check.
pub const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Small built-in denylist, compared case-insensitively.
const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "123456",
    "12345678",
    "123456789",
    "qwerty",
    "abc123",
    "111111",
    "letmein",
    "iloveyou",
    "admin",
    "welcome",
    "monkey",
    "dragon",
    "football",
    "sunshine",
    "princess",
    "trustno1",
    "passw0rd",
    "p@ssw0rd",
];

/// Result of every check. `true` means the check passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PasswordHealth {
    pub length: bool,
    pub uppercase: bool,
    pub lowercase: bool,
    pub numbers: bool,
    pub special_chars: bool,
    pub not_common: bool,
}

impl PasswordHealth {
    pub fn is_healthy(&self) -> bool {
        self.weaknesses().is_empty()
    }

    /// Human-readable labels for the failed checks.
    pub fn weaknesses(&self) -> Vec<&'static str> {
        [
            (self.length, "too short"),
            (self.uppercase, "no uppercase"),
            (self.lowercase, "no lowercase"),
            (self.numbers, "no numbers"),
            (self.special_chars, "no special characters"),
            (self.not_common, "common password"),
        ]
        .into_iter()
        .filter(|(passed, _)| !passed)
        .map(|(_, label)| label)
        .collect()
    }
}

/// Stateless evaluator with a configurable length threshold.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHealthEvaluator {
    min_length: usize,
}

impl Default for PasswordHealthEvaluator {
    fn default() -> Self {
        Self::new(8)
    }
}

impl PasswordHealthEvaluator {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    pub fn evaluate(&self, password: &str) -> PasswordHealth {
        PasswordHealth {
            // Unicode scalar values, not bytes.
            length: password.chars().count() >= self.min_length,
            uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
            lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
            numbers: password.chars().any(|c| c.is_ascii_digit()),
            special_chars: password.chars().any(|c| SYMBOLS.contains(c)),
            not_common: !is_common(password),
        }
    }
}

fn is_common(password: &str) -> bool {
    COMMON_PASSWORDS
        .iter()
        .any(|common| common.eq_ignore_ascii_case(password))
}
