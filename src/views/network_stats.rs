// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Network-wide statistics
//!
//! Computed as a fold: [`StatsAccumulator`] absorbs records one at a time,
//! accumulators over disjoint shards can be merged, and [`StatsAccumulator::finish`]
//! produces the immutable document.

use super::{round2, View};
use crate::types::RepositoryRecord;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A `(trait, value)` pair and how many repositories carry it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitCount {
    /// Trait name
    #[serde(rename = "trait")]
    pub trait_name: String,
    /// Trait value
    pub value: String,
    /// Number of repositories
    pub count: usize,
}

/// `network_stats.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    /// Generation timestamp
    pub last_updated: DateTime<Utc>,
    /// Number of records
    pub total_monkeys: usize,
    /// Records updated during the current UTC day
    pub active_today: usize,
    /// Record count per generation, in ascending generation order
    pub generations: IndexMap<String, usize>,
    /// Mean rarity, two decimals
    pub avg_rarity: f64,
    /// Highest rarity, two decimals
    pub max_rarity: f64,
    /// Lowest rarity, two decimals
    pub min_rarity: f64,
    /// Least common trait value, `null` without traits
    pub rarest_trait: Option<TraitCount>,
    /// Most common trait value, `null` without traits
    pub most_common_trait: Option<TraitCount>,
    /// `trait -> value -> count`
    pub trait_distribution: IndexMap<String, IndexMap<String, usize>>,
}

impl NetworkStats {
    /// Aggregate every record in one pass
    #[must_use]
    pub fn build(records: &[RepositoryRecord], now: DateTime<Utc>) -> Self {
        records
            .iter()
            .fold(StatsAccumulator::new(now), |mut acc, record| {
                acc.add(record);
                acc
            })
            .finish()
    }
}

impl View for NetworkStats {
    const FILE_NAME: &'static str = "network_stats.json";

    fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

/// Running totals for [`NetworkStats`]
#[derive(Debug, Clone)]
pub struct StatsAccumulator {
    now: DateTime<Utc>,
    total: usize,
    active_today: usize,
    generations: BTreeMap<u32, usize>,
    rarity_sum: f64,
    rarity_min: Option<f64>,
    rarity_max: Option<f64>,
    traits: IndexMap<(String, String), usize>,
}

impl StatsAccumulator {
    /// Empty accumulator; `now` decides which records count as active today
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            total: 0,
            active_today: 0,
            generations: BTreeMap::new(),
            rarity_sum: 0.0,
            rarity_min: None,
            rarity_max: None,
            traits: IndexMap::new(),
        }
    }

    /// Absorb one record
    pub fn add(&mut self, record: &RepositoryRecord) {
        self.total += 1;
        *self.generations.entry(record.stats.generation).or_insert(0) += 1;

        let rarity = record.stats.rarity_score;
        self.rarity_sum += rarity;
        self.rarity_min = Some(self.rarity_min.map_or(rarity, |m| m.min(rarity)));
        self.rarity_max = Some(self.rarity_max.map_or(rarity, |m| m.max(rarity)));

        if record
            .updated_at
            .is_some_and(|updated| updated.date_naive() == self.now.date_naive())
        {
            self.active_today += 1;
        }

        for key in record.trait_values() {
            *self.traits.entry(key).or_insert(0) += 1;
        }
    }

    /// Combine with an accumulator over records that came after this one's
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.total += other.total;
        self.active_today += other.active_today;
        for (generation, count) in other.generations {
            *self.generations.entry(generation).or_insert(0) += count;
        }
        self.rarity_sum += other.rarity_sum;
        self.rarity_min = match (self.rarity_min, other.rarity_min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.rarity_max = match (self.rarity_max, other.rarity_max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        for (key, count) in other.traits {
            *self.traits.entry(key).or_insert(0) += count;
        }
        self
    }

    /// Produce the document
    ///
    /// A tie for most common goes to the pair seen first; a tie for rarest
    /// goes to the pair seen last.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn finish(self) -> NetworkStats {
        let avg_rarity = if self.total == 0 {
            0.0
        } else {
            self.rarity_sum / self.total as f64
        };

        let mut most_common: Option<(&(String, String), usize)> = None;
        let mut rarest: Option<(&(String, String), usize)> = None;
        for (key, &count) in &self.traits {
            if most_common.map_or(true, |(_, best)| count > best) {
                most_common = Some((key, count));
            }
            if rarest.map_or(true, |(_, best)| count <= best) {
                rarest = Some((key, count));
            }
        }
        let to_count = |(key, count): (&(String, String), usize)| TraitCount {
            trait_name: key.0.clone(),
            value: key.1.clone(),
            count,
        };
        let most_common_trait = most_common.map(to_count);
        let rarest_trait = rarest.map(to_count);

        let mut trait_distribution: IndexMap<String, IndexMap<String, usize>> = IndexMap::new();
        for ((name, value), count) in self.traits {
            trait_distribution
                .entry(name)
                .or_default()
                .insert(value, count);
        }

        NetworkStats {
            last_updated: self.now,
            total_monkeys: self.total,
            active_today: self.active_today,
            generations: self
                .generations
                .into_iter()
                .map(|(generation, count)| (generation.to_string(), count))
                .collect(),
            avg_rarity: round2(avg_rarity),
            max_rarity: round2(self.rarity_max.unwrap_or(0.0)),
            min_rarity: round2(self.rarity_min.unwrap_or(0.0)),
            rarest_trait,
            most_common_trait,
            trait_distribution,
        }
    }
}
