//! Structured cross-reference pair retained for the export mirror.

use serde::{Deserialize, Serialize};

/// A single external cross-reference of a graph entity.
///
/// The search index itself only carries the flattened `DB:ID` display
/// strings; this structured pair is kept on the document so the export
/// mirror can emit proper `dbname`/`dbkey` attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
    /// The identifier within the external database.
    pub id: String,
    /// The external database display name.
    pub db_name: String,
}

impl CrossReference {
    pub fn new(id: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            db_name: db_name.into(),
        }
    }
}
