//! The flat document indexed into the search engine.
//!
//! The document is a superset of the fields produced for every entity kind.
//! Fields irrelevant to a given source kind are simply left unset and are
//! skipped during serialization.

use serde::{Deserialize, Serialize};

use crate::types::cross_reference::CrossReference;

/// Flat search document for one graph entity or one external interactor.
///
/// `db_id`, `doc_type` and `exact_type` are required at construction time,
/// so a built document can never reach the index without an identifier or a
/// type facet. Everything else is optional and filled in by the document
/// builder depending on the entity kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    pub db_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub st_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_st_id: Option<String>,
    /// Coarse type facet, e.g. "Pathway", "Reaction", "Protein".
    #[serde(rename = "type")]
    pub doc_type: String,
    /// The schema class of the source entity.
    pub exact_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub synonyms: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inferred_summation: Option<String>,

    pub is_disease: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub disease_id: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub disease_name: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub disease_synonyms: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub compartment_name: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub compartment_accession: Vec<String>,

    /// Flattened `DB:ID` display strings plus raw identifiers.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub cross_references: Vec<String>,
    /// Structured cross-references, consumed by the export mirror only.
    #[serde(skip)]
    pub all_cross_references: Vec<CrossReference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub go_biological_process_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub go_biological_process_accessions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub go_cellular_component_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub go_cellular_component_accessions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub go_molecular_function_name: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub go_molecular_function_accession: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub species: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tax_id: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub related_species: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub keywords: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub literature_reference_title: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub literature_reference_pub_med_id: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub literature_reference_isbn: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub literature_reference_author: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub author: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub author_orcid: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub reference_synonyms: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub reference_gene_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub reference_secondary_identifier: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub reference_other_identifier: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub reference_cross_references: Vec<String>,
    /// `[identifier, "DB:identifier"]` for the resolved reference entity.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub reference_identifiers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub regulated_entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regulated_entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regulator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regulator_id: Option<String>,

    /// `#`-joined evidence identifiers, one value per interaction partner.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub interaction_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub interactor_accessions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub interacting_entity_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub interacting_entity_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub scores: Vec<f64>,
}

impl IndexDocument {
    /// Create a document with the three required fields set.
    pub fn new(
        db_id: impl Into<String>,
        doc_type: impl Into<String>,
        exact_type: impl Into<String>,
    ) -> Self {
        Self {
            db_id: db_id.into(),
            doc_type: doc_type.into(),
            exact_type: exact_type.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_required_fields() {
        let doc = IndexDocument::new("123", "Pathway", "TopLevelPathway");

        assert_eq!(doc.db_id, "123");
        assert_eq!(doc.doc_type, "Pathway");
        assert_eq!(doc.exact_type, "TopLevelPathway");
        assert!(doc.name.is_none());
        assert!(doc.synonyms.is_empty());
        assert!(!doc.is_disease);
    }

    #[test]
    fn serialization_skips_unset_fields() {
        let mut doc = IndexDocument::new("123", "Reaction", "Reaction");
        doc.name = Some("Phosphorylation of X".to_string());

        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["dbId"], "123");
        assert_eq!(json["type"], "Reaction");
        assert_eq!(json["name"], "Phosphorylation of X");
        assert!(json.get("synonyms").is_none());
        assert!(json.get("summation").is_none());
        assert!(json.get("regulatedEntity").is_none());
        // structured cross-references never reach the index payload
        assert!(json.get("allCrossReferences").is_none());
    }

    #[test]
    fn serialization_round_trip() {
        let mut doc = IndexDocument::new("R-HSA-1", "Set", "DefinedSet");
        doc.species = vec!["Homo sapiens".to_string()];
        doc.tax_id = vec!["9606".to_string()];
        doc.scores = vec![0.97];

        let json = serde_json::to_string(&doc).unwrap();
        let back: IndexDocument = serde_json::from_str(&json).unwrap();

        assert_eq!(back.db_id, doc.db_id);
        assert_eq!(back.species, doc.species);
        assert_eq!(back.scores, doc.scores);
    }
}
