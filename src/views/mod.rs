// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Read-models derived from the scanned records
//!
//! Every view is a pure function of the record list and a timestamp. Two
//! builds over the same records serialize identically apart from
//! `last_updated`.

pub mod family_tree;
pub mod leaderboard;
pub mod network_stats;
pub mod snapshot;

pub use family_tree::{FamilyTree, FamilyTreeNode};
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use network_stats::{NetworkStats, StatsAccumulator, TraitCount};
pub use snapshot::CommunitySnapshot;

use crate::types::RepositoryRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A self-contained output document
pub trait View: Serialize {
    /// File name of the document inside the output directory
    const FILE_NAME: &'static str;

    /// When the document was generated
    fn last_updated(&self) -> DateTime<Utc>;
}

/// All four documents of one run
#[derive(Debug, Clone)]
pub struct Views {
    /// Every record, unchanged
    pub snapshot: CommunitySnapshot,
    /// Records ranked by rarity
    pub leaderboard: Leaderboard,
    /// Parent/child genealogy
    pub family_tree: FamilyTree,
    /// Network-wide aggregates
    pub network_stats: NetworkStats,
}

impl Views {
    /// Build every view from the same records and timestamp
    #[must_use]
    pub fn build(root: &str, records: &[RepositoryRecord], now: DateTime<Utc>) -> Self {
        Self {
            snapshot: CommunitySnapshot::build(root, records, now),
            leaderboard: Leaderboard::build(records, now),
            family_tree: FamilyTree::build(root, records, now),
            network_stats: NetworkStats::build(records, now),
        }
    }
}

/// Round to two decimal places
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
