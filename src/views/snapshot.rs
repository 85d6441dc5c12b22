// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Community snapshot: every record in an envelope

use super::View;
use crate::types::RepositoryRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `community_data.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySnapshot {
    /// Generation timestamp
    pub last_updated: DateTime<Utc>,
    /// Full name of the network root
    pub source_repo: String,
    /// Number of records
    pub total_forks: usize,
    /// Records in discovery order
    pub forks: Vec<RepositoryRecord>,
}

impl CommunitySnapshot {
    /// Wrap the records
    #[must_use]
    pub fn build(source_repo: &str, records: &[RepositoryRecord], now: DateTime<Utc>) -> Self {
        Self {
            last_updated: now,
            source_repo: source_repo.to_string(),
            total_forks: records.len(),
            forks: records.to_vec(),
        }
    }
}

impl View for CommunitySnapshot {
    const FILE_NAME: &'static str = "community_data.json";

    fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}
