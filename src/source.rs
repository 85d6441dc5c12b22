// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Repository source adapter contract
//!
//! The crawler only talks to the forge through [`ForkSource`]. A missing
//! file is a normal outcome (`Ok(None)`), distinct from transport failures.

use crate::types::RepositoryIdentity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Repository metadata as reported by the forge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    /// Owner and name
    pub identity: RepositoryIdentity,
    /// Browser URL
    pub html_url: String,
    /// Whether the forge marks this repository as a fork
    pub fork: bool,
    /// Full name of the repository it was forked from, when known
    pub parent: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

impl Repository {
    /// Canonical `owner/name`
    #[must_use]
    pub fn full_name(&self) -> String {
        self.identity.full_name()
    }
}

/// Failure of a single adapter call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The repository does not exist or is not visible
    #[error("not found: {0}")]
    NotFound(String),

    /// The forge refused the call because of its rate limit
    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimited {
        /// Seconds until the limit resets, if the forge said so
        retry_after: Option<u64>,
    },

    /// Network failure or unexpected status
    #[error("transient error: {0}")]
    Transient(String),

    /// The forge answered with something unparseable
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Read access to a forge's repositories, forks and files
#[async_trait]
pub trait ForkSource: Send + Sync {
    /// Fetch a repository by `owner/name`
    async fn get_repository(&self, full_name: &str) -> Result<Repository, SourceError>;

    /// List one page (1-based) of a repository's direct forks
    async fn list_forks(
        &self,
        repo: &Repository,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Repository>, SourceError>;

    /// Fetch a file's raw bytes; `Ok(None)` when the file does not exist
    async fn get_file_content(
        &self,
        repo: &Repository,
        path: &str,
    ) -> Result<Option<Vec<u8>>, SourceError>;
}

// =============================================================================
// In-memory source
// =============================================================================

/// A fork network held in memory, for offline runs and tests
#[derive(Debug, Default)]
pub struct MemorySource {
    repos: HashMap<String, Repository>,
    forks: HashMap<String, Vec<String>>,
    files: HashMap<(String, String), Vec<u8>>,
    failing_forks: HashSet<String>,
    failing_files: HashSet<(String, String)>,
    fork_calls: AtomicUsize,
}

impl MemorySource {
    /// Create an empty source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a repository
    pub fn add_repository(&mut self, repo: Repository) {
        self.repos.insert(repo.full_name(), repo);
    }

    /// Register `child` as a fork of `parent`; listing order follows insertion
    pub fn add_fork(&mut self, parent: &str, child: Repository) {
        self.forks
            .entry(parent.to_string())
            .or_default()
            .push(child.full_name());
        self.add_repository(child);
    }

    /// Store a file in a repository
    pub fn add_file(&mut self, full_name: &str, path: &str, content: impl Into<Vec<u8>>) {
        self.files
            .insert((full_name.to_string(), path.to_string()), content.into());
    }

    /// Make fork listing of `full_name` fail with a transient error
    pub fn fail_forks(&mut self, full_name: &str) {
        self.failing_forks.insert(full_name.to_string());
    }

    /// Make fetching `path` from `full_name` fail with a transient error
    pub fn fail_file(&mut self, full_name: &str, path: &str) {
        self.failing_files
            .insert((full_name.to_string(), path.to_string()));
    }

    /// Number of `list_forks` calls served so far
    #[must_use]
    pub fn fork_calls(&self) -> usize {
        self.fork_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForkSource for MemorySource {
    async fn get_repository(&self, full_name: &str) -> Result<Repository, SourceError> {
        self.repos
            .get(full_name)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(full_name.to_string()))
    }

    async fn list_forks(
        &self,
        repo: &Repository,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Repository>, SourceError> {
        self.fork_calls.fetch_add(1, Ordering::SeqCst);
        let full_name = repo.full_name();
        if self.failing_forks.contains(&full_name) {
            return Err(SourceError::Transient(format!("forks of {full_name}")));
        }
        let per_page = per_page.max(1) as usize;
        let skip = (page.max(1) as usize - 1) * per_page;
        Ok(self
            .forks
            .get(&full_name)
            .map(|children| {
                children
                    .iter()
                    .skip(skip)
                    .take(per_page)
                    .filter_map(|name| self.repos.get(name).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_file_content(
        &self,
        repo: &Repository,
        path: &str,
    ) -> Result<Option<Vec<u8>>, SourceError> {
        let key = (repo.full_name(), path.to_string());
        if self.failing_files.contains(&key) {
            return Err(SourceError::Transient(format!("{} in {}", key.1, key.0)));
        }
        Ok(self.files.get(&key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn repo(owner: &str, name: &str) -> Repository {
        Repository {
            identity: RepositoryIdentity::new(owner, name),
            html_url: format!("https://github.com/{owner}/{name}"),
            fork: owner != "root",
            parent: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_none_not_error() {
        let mut source = MemorySource::new();
        source.add_repository(repo("root", "monkey"));
        let root = source.get_repository("root/monkey").await.unwrap();

        let content = source.get_file_content(&root, "monkey_data/stats.json").await;
        assert_eq!(content, Ok(None));
    }

    #[tokio::test]
    async fn test_fork_pages() {
        let mut source = MemorySource::new();
        let root = repo("root", "monkey");
        source.add_repository(root.clone());
        for i in 0..5 {
            source.add_fork("root/monkey", repo(&format!("user{i}"), "monkey"));
        }

        let first = source.list_forks(&root, 1, 2).await.unwrap();
        let third = source.list_forks(&root, 3, 2).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first[0].full_name(), "user0/monkey");
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].full_name(), "user4/monkey");
        assert_eq!(source.fork_calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_repository_is_not_found() {
        let source = MemorySource::new();
        let err = source.get_repository("nobody/nothing").await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }
}
