//! Abstract interfaces for the search index backend.

mod search_index_provider;

pub use search_index_provider::SearchIndexProvider;
