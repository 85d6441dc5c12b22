// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Rarity leaderboard

use super::View;
use crate::types::RepositoryRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ranked repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: usize,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Canonical `owner/name`
    pub full_name: String,
    /// Browser URL
    pub url: String,
    /// Rarity score used for ranking
    pub rarity_score: f64,
    /// Generation number
    pub generation: u32,
    /// Age in days
    pub age_days: u64,
    /// Number of mutations
    pub mutation_count: u32,
    /// Whether this is the network root
    pub is_root: bool,
    /// BFS depth from the root
    pub degree: u32,
    /// Label for `degree`
    pub degree_label: String,
    /// Raw SVG markup
    pub monkey_svg: Option<String>,
}

impl LeaderboardEntry {
    fn from_record(rank: usize, record: &RepositoryRecord) -> Self {
        Self {
            rank,
            owner: record.identity.owner.clone(),
            repo: record.identity.name.clone(),
            full_name: record.full_name.clone(),
            url: record.url.clone(),
            rarity_score: record.stats.rarity_score,
            generation: record.stats.generation,
            age_days: record.stats.age_days,
            mutation_count: record.stats.mutation_count,
            is_root: record.is_root,
            degree: record.degree,
            degree_label: record.degree_label.clone(),
            monkey_svg: record.svg.clone(),
        }
    }
}

/// `leaderboard.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    /// Generation timestamp
    pub last_updated: DateTime<Utc>,
    /// Number of ranked entries
    pub total_ranked: usize,
    /// Entries, highest rarity first
    pub rankings: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Rank records by rarity, descending
    ///
    /// The sort is stable: equal scores keep their input order.
    #[must_use]
    pub fn build(records: &[RepositoryRecord], now: DateTime<Utc>) -> Self {
        let mut ordered: Vec<&RepositoryRecord> = records.iter().collect();
        ordered.sort_by(|a, b| b.stats.rarity_score.total_cmp(&a.stats.rarity_score));

        let rankings: Vec<LeaderboardEntry> = ordered
            .into_iter()
            .enumerate()
            .map(|(i, record)| LeaderboardEntry::from_record(i + 1, record))
            .collect();

        Self {
            last_updated: now,
            total_ranked: rankings.len(),
            rankings,
        }
    }
}

impl View for Leaderboard {
    const FILE_NAME: &'static str = "leaderboard.json";

    fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}
