//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the pathway
//! search index.

use serde_json::{json, Value};

/// Configuration for the search index.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// The alias name for the search index (used for all operations).
    pub alias: String,
    /// The version number for the index (e.g., 0 for "pathways_v0").
    pub version: u32,
}

impl IndexConfig {
    /// Create a new index configuration.
    pub fn new(alias: impl Into<String>, version: u32) -> Self {
        Self {
            alias: alias.into(),
            version,
        }
    }

    /// Get the versioned physical index name behind the alias.
    pub fn versioned_name(&self) -> String {
        format!("{}_v{}", self.alias, self.version)
    }
}

/// Get the index settings and mappings for the pathway search index.
///
/// Identifier-like fields are `keyword` for exact lookups; names, synonyms
/// and summaries are `text` for full-text search; the type facets are
/// `keyword` so the UI can aggregate on them.
pub fn get_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "dbId": { "type": "keyword" },
                "stId": { "type": "keyword" },
                "oldStId": { "type": "keyword" },
                "type": { "type": "keyword" },
                "exactType": { "type": "keyword" },
                "name": {
                    "type": "text",
                    "fields": {
                        "raw": { "type": "keyword" }
                    }
                },
                "synonyms": { "type": "text" },
                "summation": { "type": "text" },
                "inferredSummation": { "type": "text" },
                "isDisease": { "type": "boolean" },
                "diseaseId": { "type": "keyword" },
                "diseaseName": { "type": "text" },
                "diseaseSynonyms": { "type": "text" },
                "compartmentName": { "type": "text" },
                "compartmentAccession": { "type": "keyword" },
                "crossReferences": { "type": "keyword" },
                "goBiologicalProcessName": { "type": "text" },
                "goBiologicalProcessAccessions": { "type": "keyword" },
                "goCellularComponentName": { "type": "text" },
                "goCellularComponentAccessions": { "type": "keyword" },
                "goMolecularFunctionName": { "type": "text" },
                "goMolecularFunctionAccession": { "type": "keyword" },
                "species": { "type": "keyword" },
                "taxId": { "type": "keyword" },
                "relatedSpecies": { "type": "keyword" },
                "keywords": { "type": "keyword" },
                "literatureReferenceTitle": { "type": "text" },
                "literatureReferencePubMedId": { "type": "keyword" },
                "literatureReferenceIsbn": { "type": "keyword" },
                "literatureReferenceAuthor": { "type": "text" },
                "author": { "type": "text" },
                "authorOrcid": { "type": "keyword" },
                "referenceName": { "type": "text" },
                "referenceSynonyms": { "type": "text" },
                "referenceGeneNames": { "type": "text" },
                "referenceSecondaryIdentifier": { "type": "keyword" },
                "referenceOtherIdentifier": { "type": "keyword" },
                "referenceCrossReferences": { "type": "keyword" },
                "referenceIdentifiers": { "type": "keyword" },
                "databaseName": { "type": "keyword" },
                "referenceUrl": { "type": "keyword", "index": false },
                "regulatedEntity": { "type": "text" },
                "regulatedEntityId": { "type": "keyword" },
                "regulator": { "type": "text" },
                "regulatorId": { "type": "keyword" },
                "interactionIds": { "type": "keyword" },
                "interactorAccessions": { "type": "keyword" },
                "interactingEntityIds": { "type": "keyword" },
                "interactingEntityNames": { "type": "text" },
                "scores": { "type": "double" }
            }
        }
    })
}
