// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Forknet library - census of a repository's fork network
//!
//! This crate discovers a root repository and its forks (breadth-first, up to
//! a bounded depth), collects the per-fork monkey artifacts and folds them into
//! the static documents served to the web front end.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod config;
pub mod discover;
pub mod error;
pub mod github;
pub mod pipeline;
pub mod scanner;
pub mod sink;
pub mod source;
pub mod views;

/// Core data types shared by the crawler and the views
pub mod types {
    use crate::error::ForknetError;
    use chrono::{DateTime, Utc};
    use indexmap::IndexMap;
    use serde::{Deserialize, Serialize};
    use serde_json::Value;
    use std::fmt;

    // =========================================================================
    // Identity
    // =========================================================================

    /// `owner/name` pair identifying a repository on the forge
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RepositoryIdentity {
        /// Repository owner (user or organisation login)
        pub owner: String,
        /// Repository name
        #[serde(rename = "repo")]
        pub name: String,
    }

    impl RepositoryIdentity {
        /// Create an identity from its parts
        #[must_use]
        pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
            Self {
                owner: owner.into(),
                name: name.into(),
            }
        }

        /// Parse an `owner/name` string
        pub fn parse(full_name: &str) -> Result<Self, ForknetError> {
            let trimmed = full_name.trim();
            match trimmed.split_once('/') {
                Some((owner, name))
                    if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
                {
                    Ok(Self::new(owner, name))
                }
                _ => Err(ForknetError::Configuration(format!(
                    "invalid repository name '{trimmed}', expected OWNER/NAME"
                ))),
            }
        }

        /// Canonical `owner/name` key
        #[must_use]
        pub fn full_name(&self) -> String {
            format!("{}/{}", self.owner, self.name)
        }
    }

    impl fmt::Display for RepositoryIdentity {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}/{}", self.owner, self.name)
        }
    }

    /// Human readable label for a fork degree
    #[must_use]
    pub fn degree_label(degree: u32) -> String {
        match degree {
            0 => "root".to_string(),
            1 => "1st degree".to_string(),
            2 => "2nd degree".to_string(),
            3 => "3rd degree".to_string(),
            n => format!("{n}th degree"),
        }
    }

    // =========================================================================
    // Artifacts
    // =========================================================================

    /// Object form of a trait entry
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct TraitDetail {
        /// The trait's value
        #[serde(default)]
        pub value: Option<Value>,
        /// Rarity and other generator metadata
        #[serde(flatten)]
        pub extra: serde_json::Map<String, Value>,
    }

    /// A single trait entry, either `{ "value": ..., ... }` or a bare scalar
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum TraitValue {
        /// Object form carrying a `value` plus arbitrary metadata
        Detailed(TraitDetail),
        /// Bare scalar form
        Plain(Value),
    }

    impl TraitValue {
        /// Value used for counting, `"unknown"` when none is recorded
        #[must_use]
        pub fn display_value(&self) -> String {
            let value = match self {
                Self::Detailed(TraitDetail { value: Some(v), .. }) | Self::Plain(v) => v,
                Self::Detailed(TraitDetail { value: None, .. }) => return "unknown".to_string(),
            };
            match value {
                Value::String(s) => s.clone(),
                Value::Null => "unknown".to_string(),
                other => other.to_string(),
            }
        }
    }

    /// Trait table keyed by trait name, in document order
    pub type TraitMap = IndexMap<String, TraitValue>;

    fn default_generation() -> u32 {
        1
    }

    /// The published age is overwritten on assembly, so any shape is accepted
    fn lenient_age_days<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_u64().unwrap_or(0))
    }

    /// Contents of `monkey_data/stats.json`
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct StatsArtifact {
        /// Generation number (root monkeys are generation 1)
        #[serde(default = "default_generation")]
        pub generation: u32,
        /// Rarity score in `[0, 100]`
        #[serde(default)]
        pub rarity_score: f64,
        /// Age in days, recomputed from the repository's creation date
        #[serde(default, deserialize_with = "lenient_age_days")]
        pub age_days: u64,
        /// Number of mutations applied so far
        #[serde(default)]
        pub mutation_count: u32,
        /// Optional trait table
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub traits: Option<TraitMap>,
        /// Fields this crate does not interpret, kept for the front end
        #[serde(flatten)]
        pub extra: serde_json::Map<String, Value>,
    }

    impl StatsArtifact {
        /// Stats substituted for a repository that only published an image
        #[must_use]
        pub fn placeholder(age_days: u64) -> Self {
            Self {
                generation: 1,
                rarity_score: 0.0,
                age_days,
                mutation_count: 0,
                traits: None,
                extra: serde_json::Map::new(),
            }
        }

        /// Parse and normalise a raw `stats.json` payload
        pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
            let mut stats: Self = serde_json::from_slice(bytes)?;
            stats.rarity_score = if stats.rarity_score.is_finite() {
                stats.rarity_score.clamp(0.0, 100.0)
            } else {
                0.0
            };
            Ok(stats)
        }
    }

    /// Contents of `monkey_data/dna.json`, opaque apart from `traits`
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct GenomeArtifact(pub serde_json::Map<String, Value>);

    impl GenomeArtifact {
        /// Parse a raw `dna.json` payload; anything but a JSON object is rejected
        pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
            serde_json::from_slice(bytes)
        }

        /// Trait table, if the genome carries a well-formed one
        #[must_use]
        pub fn traits(&self) -> Option<TraitMap> {
            self.0
                .get("traits")
                .and_then(|v| serde_json::from_value(v.clone()).ok())
        }
    }

    // =========================================================================
    // Record
    // =========================================================================

    /// A scanned repository that published at least stats or an image
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct RepositoryRecord {
        /// Owner and repository name
        #[serde(flatten)]
        pub identity: RepositoryIdentity,
        /// Canonical `owner/name`
        pub full_name: String,
        /// Browser URL
        pub url: String,
        /// Whether this is the network root
        pub is_root: bool,
        /// BFS depth from the root
        pub degree: u32,
        /// Label for `degree`
        pub degree_label: String,
        /// Full name of the repository this one was forked from
        pub parent: Option<String>,
        /// Creation timestamp
        pub created_at: DateTime<Utc>,
        /// Last update timestamp
        pub updated_at: Option<DateTime<Utc>>,
        /// Stats, substituted with a placeholder when only an image exists
        #[serde(rename = "monkey_stats")]
        pub stats: StatsArtifact,
        /// Raw SVG markup
        #[serde(rename = "monkey_svg")]
        pub svg: Option<String>,
        /// Genome document
        #[serde(rename = "monkey_dna")]
        pub genome: Option<GenomeArtifact>,
    }

    impl RepositoryRecord {
        /// `(trait, value)` pairs from the stats, falling back to the genome
        #[must_use]
        pub fn trait_values(&self) -> Vec<(String, String)> {
            let from_stats = self.stats.traits.as_ref().filter(|t| !t.is_empty());
            let table = match from_stats {
                Some(traits) => traits.clone(),
                None => self
                    .genome
                    .as_ref()
                    .and_then(GenomeArtifact::traits)
                    .unwrap_or_default(),
            };
            table
                .iter()
                .map(|(name, value)| (name.clone(), value.display_value()))
                .collect()
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::ForknetError;
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
