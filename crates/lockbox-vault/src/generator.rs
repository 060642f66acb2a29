// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Random password generation from the OS CSPRNG.

use lockbox_config::model::GeneratorConfig;
use lockbox_core::LockboxError;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use secrecy::SecretString;
use zeroize::Zeroizing;

use crate::health::SYMBOLS;

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const UPPER_UNAMBIGUOUS: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const LOWER_UNAMBIGUOUS: &str = "abcdefghijkmnpqrstuvwxyz";
const DIGITS: &str = "0123456789";
const DIGITS_UNAMBIGUOUS: &str = "23456789";

/// Which character classes to draw from, and how many characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub length: usize,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub symbols: bool,
    /// Drop look-alikes: `I`, `O`, `l`, `o`, `0`, `1`.
    pub exclude_ambiguous: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self::from_config(&GeneratorConfig::default())
    }
}

impl GeneratorOptions {
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            length: config.length,
            uppercase: true,
            lowercase: true,
            digits: true,
            symbols: config.symbols,
            exclude_ambiguous: config.exclude_ambiguous,
        }
    }

    fn classes(&self) -> Vec<&'static [u8]> {
        let pick = |plain: &'static str, unambiguous: &'static str| {
            if self.exclude_ambiguous {
                unambiguous.as_bytes()
            } else {
                plain.as_bytes()
            }
        };
        let mut classes = Vec::with_capacity(4);
        if self.uppercase {
            classes.push(pick(UPPER, UPPER_UNAMBIGUOUS));
        }
        if self.lowercase {
            classes.push(pick(LOWER, LOWER_UNAMBIGUOUS));
        }
        if self.digits {
            classes.push(pick(DIGITS, DIGITS_UNAMBIGUOUS));
        }
        if self.symbols {
            classes.push(SYMBOLS.as_bytes());
        }
        classes
    }
}

/// Generate one password containing at least one character of every
/// enabled class.
pub fn generate(options: &GeneratorOptions) -> Result<SecretString, LockboxError> {
    let classes = options.classes();
    if options.length == 0 {
        return Err(LockboxError::Config(
            "password length must be greater than zero".to_string(),
        ));
    }
    if classes.is_empty() {
        return Err(LockboxError::Config(
            "no character sets selected".to_string(),
        ));
    }
    if options.length < classes.len() {
        return Err(LockboxError::Config(format!(
            "length {} cannot fit {} required character sets",
            options.length,
            classes.len()
        )));
    }

    let mut rng = OsRng;
    let pool: Vec<u8> = classes.concat();
    let mut out = Zeroizing::new(Vec::with_capacity(options.length));

    for class in &classes {
        out.extend(class.choose(&mut rng));
    }
    while out.len() < options.length {
        out.extend(pool.choose(&mut rng));
    }
    out.shuffle(&mut rng);

    let text = std::str::from_utf8(&out)
        .map_err(|e| LockboxError::Internal(format!("generated non-ASCII password: {e}")))?;
    Ok(SecretString::from(text.to_owned()))
}
