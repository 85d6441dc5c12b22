// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - shows the effective configuration

use crate::config::Config;
use anyhow::{bail, Context, Result};

/// Print the whole configuration, or a single key, as JSON
pub fn run(config: &Config, key: Option<&str>) -> Result<()> {
    println!("{}", render(config, key)?);
    Ok(())
}

/// Render the configuration with the token redacted
pub fn render(config: &Config, key: Option<&str>) -> Result<String> {
    let value = serde_json::to_value(config.redacted()).context("Failed to serialize config")?;
    let selected = match key {
        None => value,
        Some(k) => match value.get(k) {
            Some(v) => v.clone(),
            None => bail!("Unknown configuration key: {}", k),
        },
    };
    serde_json::to_string_pretty(&selected).context("Failed to serialize config")
}
