//! # Pathway Search Repository
//!
//! Repository interfaces and OpenSearch implementation for the pathway
//! search indexer. The [`SearchIndexProvider`] trait abstracts the backend
//! so the pipeline can be tested against mock implementations; the
//! [`OpenSearchProvider`] is the production backend.

#![recursion_limit = "256"]

pub mod errors;
pub mod interfaces;
pub mod opensearch;

pub use errors::SearchIndexError;
pub use interfaces::SearchIndexProvider;
pub use opensearch::{IndexConfig, OpenSearchProvider};
