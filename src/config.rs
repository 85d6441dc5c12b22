// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Layers, lowest first: built-in defaults, config file, `FORKNET_*`
//! environment variables, then command-line flags applied by the caller.

use crate::discover::DiscoverOptions;
use crate::error::{ForknetError, Result};
use crate::github::{GitHubConfig, DEFAULT_API_URL};
use crate::pipeline::CensusOptions;
use crate::types::RepositoryIdentity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Repository whose network is scanned (`owner/name`)
    #[serde(default)]
    pub root_repo: Option<String>,
    /// GitHub token
    #[serde(default)]
    pub github_token: Option<String>,
    /// API base URL
    pub api_url: String,
    /// Directory the documents are written to
    pub output_dir: PathBuf,
    /// Depth at which forks stop being expanded
    pub max_depth: u32,
    /// Maximum repositories discovered
    pub max_total: usize,
    /// Forks listed per repository
    pub page_size: u32,
    /// Repositories scanned at once
    pub concurrency: usize,
    /// Wall-clock budget for discovery, in seconds
    #[serde(default)]
    pub deadline_secs: Option<u64>,
    /// Per-request timeout, in seconds
    pub request_timeout_secs: u64,
    /// User agent sent to the API
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        let github = GitHubConfig::default();
        let discover = DiscoverOptions::default();
        Self {
            root_repo: None,
            github_token: None,
            api_url: DEFAULT_API_URL.to_string(),
            output_dir: PathBuf::from("web"),
            max_depth: discover.max_depth,
            max_total: discover.max_total,
            page_size: discover.page_size,
            concurrency: crate::scanner::DEFAULT_CONCURRENCY,
            deadline_secs: None,
            request_timeout_secs: github.timeout.as_secs(),
            user_agent: github.user_agent,
        }
    }
}

impl Config {
    /// Check bounds before anything touches the network
    pub fn validate(&self) -> Result<()> {
        if self.max_depth < 1 {
            return Err(ForknetError::Configuration("max_depth must be at least 1".into()));
        }
        if self.max_total < 1 {
            return Err(ForknetError::Configuration("max_total must be at least 1".into()));
        }
        if !(1..=100).contains(&self.page_size) {
            return Err(ForknetError::Configuration(
                "page_size must be between 1 and 100".into(),
            ));
        }
        if self.concurrency < 1 {
            return Err(ForknetError::Configuration("concurrency must be at least 1".into()));
        }
        Ok(())
    }

    /// The root repository identity; fatal when unset or malformed
    pub fn root_identity(&self) -> Result<RepositoryIdentity> {
        let name = self
            .root_repo
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                ForknetError::Configuration(
                    "no root repository configured (use --repo, FORKNET_ROOT_REPO or GITHUB_REPOSITORY)"
                        .into(),
                )
            })?;
        RepositoryIdentity::parse(name)
    }

    /// Settings for the GitHub client
    #[must_use]
    pub fn github(&self) -> GitHubConfig {
        GitHubConfig {
            api_url: self.api_url.clone(),
            token: self.github_token.clone(),
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    /// Run settings; the deadline clock starts now
    #[must_use]
    pub fn census_options(&self) -> CensusOptions {
        CensusOptions {
            discover: DiscoverOptions {
                max_depth: self.max_depth,
                max_total: self.max_total,
                page_size: self.page_size,
                deadline: self
                    .deadline_secs
                    .and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs))),
            },
            concurrency: self.concurrency,
        }
    }

    /// Copy with the token hidden, for display
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            github_token: self.github_token.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }
}

/// Default config file location
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "hyperpolymath", "forknet")
        .map(|dirs| dirs.config_dir().join("forknet.toml"))
}

/// Load configuration from an explicit file, the default file and the environment
pub fn load(path: Option<&Path>) -> Result<Config> {
    let mut config = load_layers(path)?;

    // Conventional variables set by CI runners
    if config.github_token.is_none() {
        config.github_token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
    }
    if config.root_repo.is_none() {
        config.root_repo = std::env::var("GITHUB_REPOSITORY").ok().filter(|r| !r.is_empty());
    }
    Ok(config)
}

fn load_layers(path: Option<&Path>) -> Result<Config> {
    let defaults = Config::default();
    let mut builder = config::Config::builder()
        .set_default("api_url", defaults.api_url.clone())
        .and_then(|b| b.set_default("output_dir", defaults.output_dir.to_string_lossy().to_string()))
        .and_then(|b| b.set_default("max_depth", i64::from(defaults.max_depth)))
        .and_then(|b| b.set_default("max_total", as_i64(defaults.max_total)))
        .and_then(|b| b.set_default("page_size", i64::from(defaults.page_size)))
        .and_then(|b| b.set_default("concurrency", as_i64(defaults.concurrency)))
        .and_then(|b| {
            b.set_default(
                "request_timeout_secs",
                i64::try_from(defaults.request_timeout_secs).unwrap_or(i64::MAX),
            )
        })
        .and_then(|b| b.set_default("user_agent", defaults.user_agent.clone()))
        .map_err(config_error)?;

    match path {
        Some(explicit) => {
            builder = builder.add_source(config::File::from(explicit).required(true));
        }
        None => {
            if let Some(default_path) = default_config_path() {
                builder = builder.add_source(config::File::from(default_path).required(false));
            }
        }
    }

    builder
        .add_source(config::Environment::with_prefix("FORKNET").try_parsing(true))
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(config_error)
}

fn as_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[allow(clippy::needless_pass_by_value)]
fn config_error(err: config::ConfigError) -> ForknetError {
    ForknetError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.max_total, 200);
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn test_missing_root_is_configuration_error() {
        let config = Config::default();
        assert!(matches!(
            config.root_identity(),
            Err(ForknetError::Configuration(_))
        ));
    }

    #[test]
    fn test_malformed_root_is_configuration_error() {
        let config = Config {
            root_repo: Some("just-a-name".into()),
            ..Config::default()
        };
        assert!(matches!(
            config.root_identity(),
            Err(ForknetError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_depth() {
        let config = Config {
            max_depth: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_page() {
        let config = Config {
            page_size: 500,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_layer_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("forknet.toml");
        fs::write(
            &path,
            "root_repo = \"roeiba/forkMonkey\"\nmax_depth = 2\noutput_dir = \"public\"\n",
        )
        .unwrap();

        let config = load_layers(Some(&path)).unwrap();

        assert_eq!(config.root_repo.as_deref(), Some("roeiba/forkMonkey"));
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.output_dir, PathBuf::from("public"));
        assert_eq!(config.max_total, 200);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        let err = load_layers(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ForknetError::Configuration(_)));
    }

    #[test]
    fn test_redacted_hides_token() {
        let config = Config {
            github_token: Some("ghp_secret".into()),
            ..Config::default()
        };
        assert_eq!(config.redacted().github_token.as_deref(), Some("********"));
    }

    #[test]
    fn test_deadline_applied_to_options() {
        let config = Config {
            deadline_secs: Some(60),
            ..Config::default()
        };
        assert!(config.census_options().discover.deadline.is_some());
        assert!(Config::default().census_options().discover.deadline.is_none());
    }
}
