// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Artifact payloads come from arbitrary forks; parsing and aggregating them
//! must never panic.

#![no_main]

use chrono::Utc;
use forknet::types::{GenomeArtifact, RepositoryIdentity, RepositoryRecord, StatsArtifact};
use forknet::views::Views;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let stats = StatsArtifact::from_slice(data).ok();
    let genome = GenomeArtifact::from_slice(data).ok();
    if let Some(stats) = &stats {
        assert!((0.0..=100.0).contains(&stats.rarity_score));
    }

    let identity = RepositoryIdentity::new("fuzz", "monkey");
    let record = RepositoryRecord {
        full_name: identity.full_name(),
        url: String::new(),
        identity,
        is_root: true,
        degree: 0,
        degree_label: "root".to_string(),
        parent: None,
        created_at: Utc::now(),
        updated_at: None,
        stats: stats.unwrap_or_else(|| StatsArtifact::placeholder(0)),
        svg: None,
        genome,
    };
    let views = Views::build("fuzz/monkey", &[record], Utc::now());
    let _ = serde_json::to_string(&views.network_stats);
});
