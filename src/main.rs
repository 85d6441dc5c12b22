// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Forknet CLI - census of a repository's fork network

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use forknet::commands;
use forknet::commands::scan::ScanArgs;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "forknet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "FORKNET_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Disable colored output
    #[arg(
        long,
        env = "NO_COLOR",
        global = true,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the fork network and write the web documents
    Scan {
        /// Root repository (OWNER/NAME); forks are redirected to their parent
        #[arg(short, long)]
        repo: Option<String>,

        /// Output directory for the JSON documents
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,

        /// Depth at which forks stop being expanded
        #[arg(long)]
        max_depth: Option<u32>,

        /// Maximum number of repositories to discover
        #[arg(long)]
        max_total: Option<usize>,

        /// Forks listed per repository (1-100)
        #[arg(long)]
        page_size: Option<u32>,

        /// Repositories scanned at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Stop discovering new forks after this many seconds
        #[arg(long)]
        deadline: Option<u64>,
    },

    /// Show the effective configuration
    Config {
        /// Single key to show
        key: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over -v/-q
    let log_level = match cli.verbose {
        0 if cli.quiet => tracing::Level::ERROR,
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Scan {
            repo,
            output,
            max_depth,
            max_total,
            page_size,
            concurrency,
            deadline,
        } => {
            let config = forknet::config::load(cli.config.as_deref())?;
            let args = ScanArgs {
                repo,
                output,
                max_depth,
                max_total,
                page_size,
                concurrency,
                deadline,
            };
            commands::scan::run(config, args, !cli.no_color).await
        }
        Commands::Config { key } => {
            let config = forknet::config::load(cli.config.as_deref())?;
            commands::config::run(&config, key.as_deref())
        }
        Commands::Completions { shell } => commands::completions::run(shell, &mut Cli::command()),
    }
}
