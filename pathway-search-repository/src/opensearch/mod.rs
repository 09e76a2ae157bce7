//! OpenSearch backend for the search index.

pub mod index_config;
pub mod provider;

pub use index_config::IndexConfig;
pub use provider::OpenSearchProvider;
