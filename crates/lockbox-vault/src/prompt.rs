// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master password acquisition via `LOCKBOX_MASTER_PASSWORD` or a TTY prompt.

use std::io::IsTerminal;

use lockbox_core::LockboxError;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

/// Environment variable consulted before prompting.
pub const MASTER_PASSWORD_ENV_VAR: &str = "LOCKBOX_MASTER_PASSWORD";

/// Shortest master password accepted at initialization.
pub const MIN_MASTER_PASSWORD_LEN: usize = 8;

fn from_env() -> Option<SecretString> {
    std::env::var(MASTER_PASSWORD_ENV_VAR)
        .ok()
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
}

fn read_hidden(prompt: &str) -> Result<Zeroizing<String>, LockboxError> {
    eprint!("{prompt}");
    rpassword::read_password()
        .map(Zeroizing::new)
        .map_err(|e| LockboxError::Internal(format!("failed to read password: {e}")))
}

fn no_source() -> LockboxError {
    LockboxError::Config(format!(
        "no master password provided; set {MASTER_PASSWORD_ENV_VAR} or run interactively"
    ))
}

/// Master password for unlocking.
pub fn get_master_password() -> Result<SecretString, LockboxError> {
    if let Some(password) = from_env() {
        return Ok(password);
    }
    if !std::io::stdin().is_terminal() {
        return Err(no_source());
    }

    let password = read_hidden("Master password: ")?;
    if password.is_empty() {
        return Err(LockboxError::InvalidEntry(
            "empty master password not allowed".to_string(),
        ));
    }
    Ok(SecretString::from(password.as_str().to_owned()))
}

/// New master password for `init`, typed twice on a TTY.
pub fn get_new_master_password() -> Result<SecretString, LockboxError> {
    if let Some(password) = from_env() {
        check_new_master_password(&password)?;
        return Ok(password);
    }
    if !std::io::stdin().is_terminal() {
        return Err(no_source());
    }

    let first = read_hidden("New master password: ")?;
    let second = read_hidden("Confirm master password: ")?;
    if *first != *second {
        return Err(LockboxError::InvalidEntry(
            "passwords do not match".to_string(),
        ));
    }
    let password = SecretString::from(first.as_str().to_owned());
    check_new_master_password(&password)?;
    Ok(password)
}

/// Minimum-length rule for new master passwords.
pub fn check_new_master_password(password: &SecretString) -> Result<(), LockboxError> {
    if password.expose_secret().chars().count() < MIN_MASTER_PASSWORD_LEN {
        return Err(LockboxError::InvalidEntry(format!(
            "master password must be at least {MIN_MASTER_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn env_var_takes_priority() {
        // SAFETY: env mutation is serialized with #[serial].
        unsafe { std::env::set_var(MASTER_PASSWORD_ENV_VAR, "CorrectHorse1!") };
        let result = get_master_password();
        unsafe { std::env::remove_var(MASTER_PASSWORD_ENV_VAR) };

        assert_eq!(result.unwrap().expose_secret(), "CorrectHorse1!");
    }

    #[test]
    #[serial]
    fn short_new_password_from_env_is_rejected() {
        unsafe { std::env::set_var(MASTER_PASSWORD_ENV_VAR, "short") };
        let result = get_new_master_password();
        unsafe { std::env::remove_var(MASTER_PASSWORD_ENV_VAR) };

        assert!(matches!(result, Err(LockboxError::InvalidEntry(_))));
    }

    #[test]
    #[serial]
    fn empty_env_var_without_tty_fails() {
        unsafe { std::env::set_var(MASTER_PASSWORD_ENV_VAR, "") };
        // Test harness stdin is not a terminal.
        let result = get_master_password();
        unsafe { std::env::remove_var(MASTER_PASSWORD_ENV_VAR) };

        assert!(result.is_err());
    }

    #[test]
    fn length_rule_counts_characters() {
        assert!(check_new_master_password(&SecretString::from("ääääääää".to_string())).is_ok());
        assert!(check_new_master_password(&SecretString::from("1234567".to_string())).is_err());
    }
}
