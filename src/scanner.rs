// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Per-repository artifact scanning

use crate::discover::DiscoveredRepo;
use crate::source::{ForkSource, Repository, SourceError};
use crate::types::{degree_label, GenomeArtifact, RepositoryRecord, StatsArtifact};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::fmt::Display;
use tracing::{debug, warn};

/// Path of the stats artifact inside each repository
pub const STATS_PATH: &str = "monkey_data/stats.json";
/// Path of the rendered image
pub const SVG_PATH: &str = "monkey_data/monkey.svg";
/// Path of the genome document
pub const DNA_PATH: &str = "monkey_data/dna.json";

/// Default number of repositories scanned at once
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Whole days between `created_at` and `now`, never negative
#[must_use]
pub fn age_in_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - created_at).num_days()).unwrap_or(0)
}

/// Scan one discovered repository
///
/// The three artifacts are fetched independently; each failure only makes
/// that artifact absent. Returns `None` when neither stats nor image exist.
pub async fn scan_node(
    source: &dyn ForkSource,
    node: &DiscoveredRepo,
    root_full_name: &str,
    now: DateTime<Utc>,
) -> Option<RepositoryRecord> {
    let repo = &node.repository;
    let (stats, svg, genome) = tokio::join!(
        fetch_artifact(source, repo, STATS_PATH, StatsArtifact::from_slice),
        fetch_artifact(source, repo, SVG_PATH, |bytes: &[u8]| String::from_utf8(
            bytes.to_vec()
        )),
        fetch_artifact(source, repo, DNA_PATH, GenomeArtifact::from_slice),
    );

    let record = assemble_record(repo, node.degree, root_full_name, now, stats, svg, genome);
    if record.is_none() {
        debug!("No monkey in {}", repo.full_name());
    }
    record
}

/// Combine fetched artifacts into a record
///
/// At least one of stats or image must be present. Missing stats are
/// replaced by a placeholder, and the stats' `age_days` is always
/// recomputed from the repository's creation date.
#[must_use]
pub fn assemble_record(
    repo: &Repository,
    degree: u32,
    root_full_name: &str,
    now: DateTime<Utc>,
    stats: Option<StatsArtifact>,
    svg: Option<String>,
    genome: Option<GenomeArtifact>,
) -> Option<RepositoryRecord> {
    if stats.is_none() && svg.is_none() {
        return None;
    }

    let age_days = age_in_days(repo.created_at, now);
    let stats = match stats {
        Some(mut stats) => {
            stats.age_days = age_days;
            stats
        }
        None => StatsArtifact::placeholder(age_days),
    };
    let full_name = repo.full_name();

    Some(RepositoryRecord {
        identity: repo.identity.clone(),
        is_root: full_name == root_full_name,
        full_name,
        url: repo.html_url.clone(),
        degree,
        degree_label: degree_label(degree),
        parent: repo.parent.clone(),
        created_at: repo.created_at,
        updated_at: repo.updated_at,
        stats,
        svg,
        genome,
    })
}

/// Scan every discovered repository with at most `concurrency` in flight
///
/// Records come back in discovery order; repositories without artifacts are
/// left out.
pub async fn scan_network(
    source: &dyn ForkSource,
    nodes: &[DiscoveredRepo],
    root_full_name: &str,
    concurrency: usize,
    now: DateTime<Utc>,
) -> Vec<RepositoryRecord> {
    stream::iter(nodes)
        .map(|node| scan_node(source, node, root_full_name, now))
        .buffered(concurrency.max(1))
        .filter_map(futures::future::ready)
        .collect()
        .await
}

async fn fetch_artifact<T, E, F>(
    source: &dyn ForkSource,
    repo: &Repository,
    path: &str,
    parse: F,
) -> Option<T>
where
    E: Display,
    F: Fn(&[u8]) -> Result<T, E>,
{
    match source.get_file_content(repo, path).await {
        Ok(Some(bytes)) => match parse(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Skipping unreadable {} in {}: {}", path, repo.full_name(), err);
                None
            }
        },
        Ok(None) | Err(SourceError::NotFound(_)) => None,
        Err(err) => {
            warn!("Failed to fetch {} from {}: {}", path, repo.full_name(), err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use crate::types::RepositoryIdentity;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn repo(full_name: &str, days_old: i64) -> Repository {
        Repository {
            identity: RepositoryIdentity::parse(full_name).unwrap(),
            html_url: format!("https://github.com/{full_name}"),
            fork: full_name != "root/monkey",
            parent: None,
            created_at: now() - Duration::days(days_old),
            updated_at: None,
        }
    }

    fn node(full_name: &str, degree: u32) -> DiscoveredRepo {
        DiscoveredRepo {
            repository: repo(full_name, 5),
            degree,
        }
    }

    #[test]
    fn test_age_override() {
        let stats = StatsArtifact::from_slice(
            br#"{"generation": 3, "rarity_score": 71.5, "mutation_count": 4, "age_days": 9999}"#,
        )
        .unwrap();

        let record = assemble_record(
            &repo("a/monkey", 5),
            1,
            "root/monkey",
            now(),
            Some(stats),
            None,
            None,
        )
        .unwrap();

        assert_eq!(record.stats.age_days, 5);
        assert_eq!(record.stats.generation, 3);
        assert!(!record.is_root);
        assert_eq!(record.degree_label, "1st degree");
    }

    #[test]
    fn test_svg_only_gets_placeholder_stats() {
        let record = assemble_record(
            &repo("root/monkey", 12),
            0,
            "root/monkey",
            now(),
            None,
            Some("<svg/>".into()),
            None,
        )
        .unwrap();

        assert!(record.is_root);
        assert_eq!(record.stats, StatsArtifact::placeholder(12));
    }

    #[test]
    fn test_genome_alone_is_not_enough() {
        let genome = GenomeArtifact::from_slice(br#"{"traits": {}}"#).unwrap();
        let record = assemble_record(
            &repo("a/monkey", 1),
            1,
            "root/monkey",
            now(),
            None,
            None,
            Some(genome),
        );
        assert!(record.is_none());
    }

    #[test]
    fn test_future_creation_date_is_zero_days() {
        assert_eq!(age_in_days(now() + Duration::hours(3), now()), 0);
    }

    #[tokio::test]
    async fn test_failed_fetch_does_not_block_other_artifacts() {
        let mut source = MemorySource::new();
        source.add_file("a/monkey", SVG_PATH, "<svg/>");
        source.add_file("a/monkey", DNA_PATH, r#"{"traits": {"eyes": {"value": "laser"}}}"#);
        source.fail_file("a/monkey", STATS_PATH);

        let record = scan_node(&source, &node("a/monkey", 1), "root/monkey", now())
            .await
            .unwrap();

        assert_eq!(record.svg.as_deref(), Some("<svg/>"));
        assert!(record.genome.is_some());
        assert_eq!(record.stats.rarity_score, 0.0);
    }

    #[tokio::test]
    async fn test_malformed_stats_treated_as_absent() {
        let mut source = MemorySource::new();
        source.add_file("a/monkey", STATS_PATH, "{not json");

        let record = scan_node(&source, &node("a/monkey", 1), "root/monkey", now()).await;

        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_unusable_published_age_keeps_stats() {
        for age in ["null", "12.5", "-3", "\"old\""] {
            let mut source = MemorySource::new();
            source.add_file(
                "a/monkey",
                STATS_PATH,
                format!(r#"{{"generation": 2, "rarity_score": 55, "age_days": {age}}}"#),
            );

            let record = scan_node(&source, &node("a/monkey", 1), "root/monkey", now())
                .await
                .unwrap();

            assert_eq!(record.stats.generation, 2, "age_days = {age}");
            assert_eq!(record.stats.rarity_score, 55.0, "age_days = {age}");
            assert_eq!(record.stats.age_days, 5, "age_days = {age}");
        }
    }

    #[tokio::test]
    async fn test_scan_network_keeps_discovery_order_and_drops_empty() {
        let mut source = MemorySource::new();
        for name in ["root/monkey", "b/monkey", "d/monkey"] {
            source.add_file(name, SVG_PATH, format!("<svg id=\"{name}\"/>"));
        }
        let nodes = vec![
            node("root/monkey", 0),
            node("a/monkey", 1),
            node("b/monkey", 1),
            node("c/monkey", 2),
            node("d/monkey", 2),
        ];

        let records = scan_network(&source, &nodes, "root/monkey", 2, now()).await;

        let names: Vec<_> = records.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["root/monkey", "b/monkey", "d/monkey"]);
    }

    #[test]
    fn test_rarity_is_clamped() {
        let stats = StatsArtifact::from_slice(br#"{"rarity_score": 250}"#).unwrap();
        assert_eq!(stats.rarity_score, 100.0);
        assert_eq!(stats.generation, 1);
    }
}
