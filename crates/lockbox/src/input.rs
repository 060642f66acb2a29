// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading entry passwords and confirmations from the terminal or stdin.

use std::io::{BufRead, IsTerminal, Write};

use lockbox_core::LockboxError;
use secrecy::SecretString;

fn io_err(e: std::io::Error) -> LockboxError {
    LockboxError::Internal(format!("failed to read input: {e}"))
}

/// An entry password: hidden and confirmed on a TTY, one line from piped stdin.
pub fn read_entry_password(label: &str) -> Result<SecretString, LockboxError> {
    let password = if std::io::stdin().is_terminal() {
        let first = rpassword::prompt_password(format!("{label}: ")).map_err(io_err)?;
        let second = rpassword::prompt_password(format!("Confirm {}: ", label.to_lowercase()))
            .map_err(io_err)?;
        if first != second {
            return Err(LockboxError::InvalidEntry(
                "passwords do not match".to_string(),
            ));
        }
        first
    } else {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line).map_err(io_err)?;
        line.trim_end_matches(['\r', '\n']).to_string()
    };

    if password.is_empty() {
        return Err(LockboxError::InvalidEntry(
            "entry password is required".to_string(),
        ));
    }
    Ok(SecretString::from(password))
}

/// `[y/N]` prompt. Anything but `y`/`yes` declines.
pub fn confirm(question: &str) -> Result<bool, LockboxError> {
    print!("{question} [y/N]: ");
    std::io::stdout().flush().map_err(io_err)?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer).map_err(io_err)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
