//! Core data structures shared between the indexing pipeline, the search
//! index repository and the export mirror.

pub mod cross_reference;
pub mod index_document;

pub use cross_reference::CrossReference;
pub use index_document::IndexDocument;
