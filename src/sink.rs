// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Writing views to the output directory

use crate::error::{ForknetError, Result};
use crate::views::{View, Views};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory the static front end serves its data from
#[derive(Debug, Clone)]
pub struct Sink {
    dir: PathBuf,
}

impl Sink {
    /// Sink writing into `dir`, created on first write
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one view as pretty JSON, replacing any previous version
    ///
    /// The document is written to a temporary sibling and renamed, so a
    /// reader never sees a half-written file.
    pub fn write<V: View>(&self, view: &V) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|source| ForknetError::Write {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(V::FILE_NAME);
        let tmp = self.dir.join(format!(".{}.tmp", V::FILE_NAME));
        let json = render(view)?;

        fs::write(&tmp, json).map_err(|source| ForknetError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| ForknetError::Write {
            path: path.clone(),
            source,
        })?;

        info!("Generated {}", path.display());
        Ok(path)
    }

    /// Write all four views
    pub fn write_all(&self, views: &Views) -> Result<Vec<PathBuf>> {
        Ok(vec![
            self.write(&views.snapshot)?,
            self.write(&views.leaderboard)?,
            self.write(&views.family_tree)?,
            self.write(&views.network_stats)?,
        ])
    }
}

/// Serialize a view exactly as it is written to disk
pub fn render<V: View>(view: &V) -> Result<String> {
    let mut json = serde_json::to_string_pretty(view)?;
    json.push('\n');
    Ok(json)
}
