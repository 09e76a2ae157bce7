//! Error types for the indexing run.

use thiserror::Error;

use crate::graph::GraphError;
use crate::interactions::InteractionError;
use pathway_search_repository::SearchIndexError;

/// Fatal, run-level errors.
///
/// Everything recoverable (a single entity that fails to map, a document
/// that fails its individual retry, a throttled lineage lookup) is handled
/// and logged where it happens; only faults that abort the run surface as
/// this type.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// Configuration or wiring error during startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unrecoverable graph query failure.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Fatal search index failure (clear or commit).
    #[error("Search index error: {0}")]
    Index(#[from] SearchIndexError),

    /// Interaction dataset failure.
    #[error("Interaction dataset error: {0}")]
    Interactions(#[from] InteractionError),

    /// Export mirror I/O failure.
    #[error("Export error: {0}")]
    Export(#[from] std::io::Error),
}

impl IndexerError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
