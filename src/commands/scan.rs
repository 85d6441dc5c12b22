// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Scan command - crawls the fork network and writes the web documents

use crate::config::Config;
use crate::github::GitHubSource;
use crate::pipeline::{run_census, Census};
use crate::sink::Sink;
use crate::types::degree_label;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Command-line overrides for the scan
#[derive(Debug, Default, Clone)]
pub struct ScanArgs {
    /// Root repository (`owner/name`)
    pub repo: Option<String>,
    /// Output directory
    pub output: Option<PathBuf>,
    /// Maximum fork depth
    pub max_depth: Option<u32>,
    /// Maximum repositories discovered
    pub max_total: Option<usize>,
    /// Forks listed per repository
    pub page_size: Option<u32>,
    /// Repositories scanned at once
    pub concurrency: Option<usize>,
    /// Discovery budget in seconds
    pub deadline: Option<u64>,
}

impl ScanArgs {
    /// Layer the flags over the loaded configuration
    #[must_use]
    pub fn apply(self, mut config: Config) -> Config {
        if let Some(repo) = self.repo {
            config.root_repo = Some(repo);
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if let Some(total) = self.max_total {
            config.max_total = total;
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(deadline) = self.deadline {
            config.deadline_secs = Some(deadline);
        }
        config
    }
}

/// Run the scan command
pub async fn run(config: Config, args: ScanArgs, color: bool) -> Result<()> {
    let config = args.apply(config);
    config.validate()?;
    let identity = config.root_identity()?;

    if config.github_token.is_none() {
        warn!("No GITHUB_TOKEN found. API limits will be strict.");
    }

    let source = GitHubSource::new(&config.github())
        .map_err(|e| crate::error::ForknetError::Client(e.to_string()))?;

    info!("Starting census of {}", identity);
    let census = run_census(&source, &identity, &config.census_options())
        .await
        .map_err(|e| {
            error!("Census of {} failed: {}", identity, e);
            e
        })?;

    let sink = Sink::new(&config.output_dir);
    let paths = sink
        .write_all(&census.views())
        .with_context(|| format!("Failed to write documents to {}", sink.dir().display()))?;

    print_summary(&census, &paths, color);
    Ok(())
}

fn print_summary(census: &Census, paths: &[PathBuf], color: bool) {
    println!();
    println!("Degree breakdown:");
    for (degree, count) in census.degree_breakdown() {
        println!("  {}: {} monkeys", degree_label(degree), count);
    }
    println!();

    let headline = format!(
        "Discovered {} repositories, {} with a monkey",
        census.discovered,
        census.records.len()
    );
    if color {
        println!("{}", headline.green().bold());
    } else {
        println!("{headline}");
    }

    for path in paths {
        println!("  {}", path.display());
    }
}
