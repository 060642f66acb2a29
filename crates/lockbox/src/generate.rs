// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lockbox generate` and the generator flags shared with `add`/`update`.

use clap::Args;
use lockbox_config::model::GeneratorConfig;
use lockbox_core::LockboxError;
use lockbox_vault::{generate, GeneratorOptions};
use secrecy::ExposeSecret;

/// Overrides for the `[generator]` config section.
#[derive(Args, Debug, Clone, Default)]
pub struct GeneratorArgs {
    /// Password length.
    #[arg(short, long)]
    pub length: Option<usize>,
    /// Leave out symbols.
    #[arg(long)]
    pub no_symbols: bool,
    /// Leave out uppercase letters.
    #[arg(long)]
    pub no_uppercase: bool,
    /// Leave out lowercase letters.
    #[arg(long)]
    pub no_lowercase: bool,
    /// Leave out digits.
    #[arg(long)]
    pub no_digits: bool,
    /// Leave out look-alike characters (I, O, l, o, 0, 1).
    #[arg(long)]
    pub exclude_ambiguous: bool,
}

impl GeneratorArgs {
    pub fn options(&self, config: &GeneratorConfig) -> GeneratorOptions {
        let mut options = GeneratorOptions::from_config(config);
        if let Some(length) = self.length {
            options.length = length;
        }
        options.symbols &= !self.no_symbols;
        options.uppercase &= !self.no_uppercase;
        options.lowercase &= !self.no_lowercase;
        options.digits &= !self.no_digits;
        options.exclude_ambiguous |= self.exclude_ambiguous;
        options
    }
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub generator: GeneratorArgs,
    /// How many passwords to print.
    #[arg(short, long, default_value_t = 1)]
    pub count: usize,
}

pub fn run_generate(args: &GenerateArgs, config: &GeneratorConfig) -> Result<(), LockboxError> {
    let options = args.generator.options(config);
    for _ in 0..args.count {
        let password = generate(&options)?;
        println!("{}", password.expose_secret());
    }
    Ok(())
}
