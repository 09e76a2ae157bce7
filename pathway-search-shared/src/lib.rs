//! # Pathway Search Shared
//!
//! This crate defines shared data structures used across the pathway search
//! indexer ecosystem. It includes the flat search document produced by the
//! document builder and consumed by the index repository and export mirror.

pub mod types;

pub use types::cross_reference::CrossReference;
pub use types::index_document::IndexDocument;
