//! Search index provider trait definition.
//!
//! This module defines the abstract interface the indexing pipeline drives,
//! allowing for different backend implementations and for mock providers in
//! tests.

use async_trait::async_trait;

use crate::errors::SearchIndexError;
use pathway_search_shared::IndexDocument;

/// Abstracts the underlying search index implementation.
///
/// The pipeline relies on a specific failure contract:
///
/// - [`add_documents`](Self::add_documents) must surface any transport error
///   or server-side rejection (including per-item bulk errors) as `Err`, so
///   the caller can degrade to per-document retries.
/// - [`clear_index`](Self::clear_index) and [`commit`](Self::commit)
///   failures are fatal to a run and must not be swallowed.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Ensure the search index and any required aliases exist, creating them
    /// if necessary. Called once during startup.
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError>;

    /// Delete every document currently in the index.
    async fn clear_index(&self) -> Result<(), SearchIndexError>;

    /// Add a batch of documents in a single bulk call.
    async fn add_documents(&self, documents: &[IndexDocument]) -> Result<(), SearchIndexError>;

    /// Add a single document. Used as the fallback path when a bulk call
    /// failed.
    async fn add_document(&self, document: &IndexDocument) -> Result<(), SearchIndexError>;

    /// Make everything added so far durable and visible to searches.
    async fn commit(&self) -> Result<(), SearchIndexError>;

    /// Release the backend connection. Called once at the end of a run,
    /// on both the success and the failure path.
    async fn close(&self) -> Result<(), SearchIndexError>;
}
