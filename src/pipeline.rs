// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! End-to-end census run: resolve, discover, scan

use crate::discover::{discover, resolve_network_root, DiscoverOptions};
use crate::error::Result;
use crate::scanner::{scan_network, DEFAULT_CONCURRENCY};
use crate::source::{ForkSource, Repository};
use crate::types::{RepositoryIdentity, RepositoryRecord};
use crate::views::Views;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::info;

/// Settings for one run
#[derive(Debug, Clone)]
pub struct CensusOptions {
    /// Discovery bounds
    pub discover: DiscoverOptions,
    /// Repositories scanned at once
    pub concurrency: usize,
}

impl Default for CensusOptions {
    fn default() -> Self {
        Self {
            discover: DiscoverOptions::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Result of a run, before anything is written
#[derive(Debug, Clone)]
pub struct Census {
    /// The network root the walk started from
    pub root: Repository,
    /// Repositories discovered, with or without artifacts
    pub discovered: usize,
    /// Repositories that published artifacts, in discovery order
    pub records: Vec<RepositoryRecord>,
    /// Time the run was stamped with
    pub generated_at: DateTime<Utc>,
}

impl Census {
    /// Full name of the network root
    #[must_use]
    pub fn root_name(&self) -> String {
        self.root.full_name()
    }

    /// Number of records per degree
    #[must_use]
    pub fn degree_breakdown(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.degree).or_insert(0) += 1;
        }
        counts
    }

    /// Derive the four output documents
    #[must_use]
    pub fn views(&self) -> Views {
        Views::build(&self.root_name(), &self.records, self.generated_at)
    }
}

/// Run discovery and scanning against `source`
///
/// Only a failure to resolve the root is fatal. An expired deadline yields
/// the records gathered so far.
pub async fn run_census(
    source: &dyn ForkSource,
    identity: &RepositoryIdentity,
    options: &CensusOptions,
) -> Result<Census> {
    let root = resolve_network_root(source, identity).await?;
    let root_name = root.full_name();
    info!("Scanning forks of {}...", root_name);

    let nodes = discover(source, root.clone(), &options.discover).await;
    info!("Found {} potential habitats", nodes.len());

    let now = Utc::now();
    let records = scan_network(source, &nodes, &root_name, options.concurrency, now).await;
    info!(
        "Scan complete: {} of {} repositories have a monkey",
        records.len(),
        nodes.len()
    );

    Ok(Census {
        root,
        discovered: nodes.len(),
        records,
        generated_at: now,
    })
}
