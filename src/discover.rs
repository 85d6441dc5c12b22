// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Fork network discovery
//!
//! Breadth-first walk over the fork graph starting at the network root.
//! Discovered repositories live in a single arena; the BFS queue holds
//! indices into it and the seen set has one owner, so no locking is needed.

use crate::error::ForknetError;
use crate::source::{ForkSource, Repository, SourceError};
use crate::types::{degree_label, RepositoryIdentity};
use std::collections::{HashSet, VecDeque};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Bounds for a discovery run
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// Repositories at this depth are included but not expanded
    pub max_depth: u32,
    /// Upper bound on the number of returned repositories
    pub max_total: usize,
    /// Forks requested per repository (one page)
    pub page_size: u32,
    /// No fork pages are fetched after this instant
    pub deadline: Option<Instant>,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_total: 200,
            page_size: 50,
            deadline: None,
        }
    }
}

/// A repository together with its BFS depth from the root
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredRepo {
    /// Repository metadata
    pub repository: Repository,
    /// Distance from the root (root = 0)
    pub degree: u32,
}

/// Resolve the repository whose network should be scanned
///
/// A fork is redirected to its parent so that the scan always starts from
/// the network root rather than from the caller's position in it.
pub async fn resolve_network_root(
    source: &dyn ForkSource,
    identity: &RepositoryIdentity,
) -> Result<Repository, ForknetError> {
    let full_name = identity.full_name();
    let repo = source
        .get_repository(&full_name)
        .await
        .map_err(|source| ForknetError::RootResolution {
            repo: full_name.clone(),
            source,
        })?;

    match repo.parent.as_deref() {
        Some(parent) if repo.fork => {
            info!("Detected fork of {}. Scanning parent's network...", parent);
            source
                .get_repository(parent)
                .await
                .map_err(|source| ForknetError::RootResolution {
                    repo: parent.to_string(),
                    source,
                })
        }
        _ => Ok(repo),
    }
}

/// Collect the root and its forks, level by level
///
/// The root is always first at degree 0. Each repository appears once, at
/// the depth it was first seen. A failure to list one repository's forks is
/// logged and only prunes that branch.
pub async fn discover(
    source: &dyn ForkSource,
    root: Repository,
    options: &DiscoverOptions,
) -> Vec<DiscoveredRepo> {
    let max_total = options.max_total.max(1);
    let mut seen: HashSet<String> = HashSet::from([root.full_name()]);
    let mut found = vec![DiscoveredRepo {
        repository: root,
        degree: 0,
    }];
    let mut queue: VecDeque<usize> = VecDeque::from([0]);

    while found.len() < max_total {
        let Some(index) = queue.pop_front() else {
            break;
        };
        let depth = found[index].degree;
        if depth >= options.max_depth {
            continue;
        }
        if options.deadline.is_some_and(|d| Instant::now() >= d) {
            warn!(
                "Discovery deadline reached with {} repositories found; stopping early",
                found.len()
            );
            break;
        }

        let current = &found[index].repository;
        let current_name = current.full_name();
        let forks = match source.list_forks(current, 1, options.page_size).await {
            Ok(forks) => forks,
            Err(err) => {
                log_branch_failure(&current_name, &err);
                continue;
            }
        };

        for mut fork in forks {
            if found.len() >= max_total {
                break;
            }
            let name = fork.full_name();
            if !seen.insert(name.clone()) {
                continue;
            }
            // Fork listings omit the parent; we know it from the walk.
            if fork.parent.is_none() {
                fork.parent = Some(current_name.clone());
            }
            let degree = depth + 1;
            debug!("Found {} fork: {}", degree_label(degree), name);
            queue.push_back(found.len());
            found.push(DiscoveredRepo {
                repository: fork,
                degree,
            });
        }
    }

    info!("Discovered {} repositories in the network", found.len());
    found
}

fn log_branch_failure(full_name: &str, err: &SourceError) {
    match err {
        SourceError::RateLimited { .. } => {
            warn!("Rate limited while listing forks of {}: {}", full_name, err);
        }
        _ => warn!("Error fetching forks of {}: {}", full_name, err),
    }
}
