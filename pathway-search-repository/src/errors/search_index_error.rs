//! Search index error types.
//!
//! This module defines the unified error type for all search index
//! operations. The pipeline treats clear/commit failures as fatal and
//! degrades bulk-add failures to a per-document retry, so the variants
//! distinguish those operations.

use thiserror::Error;

/// Unified errors from search index operations.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Failed to establish connection to the search index backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to index a single document.
    #[error("Index error: {0}")]
    IndexError(String),

    /// Bulk indexing call failed or was rejected by the backend.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// Failed to clear the index.
    #[error("Clear error: {0}")]
    ClearError(String),

    /// Failed to commit pending documents.
    #[error("Commit error: {0}")]
    CommitError(String),

    /// Failed to create the search index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to serialize a document for the backend.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SearchIndexError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index error.
    pub fn index(msg: impl Into<String>) -> Self {
        Self::IndexError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create a clear error.
    pub fn clear(msg: impl Into<String>) -> Self {
        Self::ClearError(msg.into())
    }

    /// Create a commit error.
    pub fn commit(msg: impl Into<String>) -> Self {
        Self::CommitError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }
}
