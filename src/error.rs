// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Fatal errors of a census run

use crate::source::SourceError;
use std::path::PathBuf;

/// Errors that abort a run
///
/// Failures of a single artifact or a single fork branch never surface here;
/// they are logged and the run continues.
#[derive(Debug, thiserror::Error)]
pub enum ForknetError {
    /// Missing or malformed settings, detected before any network call
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The network root could not be fetched
    #[error("Failed to resolve root repository {repo}: {source}")]
    RootResolution {
        /// Repository that was requested
        repo: String,
        /// Underlying adapter failure
        #[source]
        source: SourceError,
    },

    /// The forge client could not be constructed
    #[error("Failed to initialise forge client: {0}")]
    Client(String),

    /// An output document could not be written
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Target file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// An output document could not be serialized
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result alias for fatal errors
pub type Result<T> = std::result::Result<T, ForknetError>;
