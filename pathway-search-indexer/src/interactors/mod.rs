//! Reconciles interaction-dataset accessions against the graph and builds
//! the interactor documents.
//!
//! An interactor document is created for an external molecule (one NOT in
//! the graph) and lists the graph entities its partners resolve to; only
//! interactions that connect an external molecule to something already in
//! the graph are indexed.

pub mod taxonomy;

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::graph::{GraphError, GraphProvider};
use crate::interactions::{
    accession_url, alias_without_species, database_name_for, join_multivalue, Interactor,
};
use pathway_search_shared::IndexDocument;

/// Aggregate of every graph entity referencing one accession. Ids and names
/// accumulate pairwise and are never overwritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphEntrySummary {
    pub ids: Vec<String>,
    pub names: Vec<String>,
}

/// One interaction partner resolved into the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractorSummary {
    pub accession: String,
    pub summary: GraphEntrySummary,
    pub score: f64,
    pub evidence_ids: Vec<String>,
}

/// Result of partitioning the accession universe against the graph.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// Accessions with no reference entity in the graph.
    pub unresolved: HashSet<String>,
    /// Per resolved accession, the graph entities referencing it.
    pub summaries: HashMap<String, GraphEntrySummary>,
}

/// Partition the input accessions into those present in the graph (with
/// their referencing entities aggregated) and those absent.
///
/// One graph traversal per matched accession; acceptable for a batch run,
/// not for an online path.
pub async fn reconcile(
    graph: &dyn GraphProvider,
    accessions: &HashSet<String>,
) -> Result<ReconcileOutcome, GraphError> {
    let mut unresolved: HashSet<String> = accessions.clone();
    let mut summaries: HashMap<String, GraphEntrySummary> = HashMap::new();

    let reference_identifiers = graph.reference_identifiers().await?;
    info!(
        accessions = accessions.len(),
        reference_entities = reference_identifiers.len(),
        "Reconciling accessions against the graph"
    );

    for accession in reference_identifiers {
        if !accessions.contains(&accession) {
            continue;
        }

        unresolved.remove(&accession);

        let stubs = graph.entities_referencing(&accession).await?;
        if stubs.is_empty() {
            continue;
        }

        let summary = summaries.entry(accession).or_default();
        for stub in stubs {
            let id = match stub.st_id.as_deref().filter(|s| !s.is_empty()) {
                Some(st_id) => st_id.to_string(),
                None => {
                    warn!(
                        db_id = stub.db_id,
                        display_name = %stub.display_name,
                        "No stable identifier, falling back to the numeric id"
                    );
                    stub.db_id.to_string()
                }
            };
            summary.ids.push(id);
            summary.names.push(stub.display_name);
        }
    }

    info!(
        resolved = summaries.len(),
        unresolved = unresolved.len(),
        "Accession reconciliation finished"
    );

    Ok(ReconcileOutcome {
        unresolved,
        summaries,
    })
}

/// Build the document for one external interactor and its resolved partner
/// summaries. `species` is the already-resolved organism display name.
pub fn build_interactor_document(
    interactor: &Interactor,
    summaries: &[InteractorSummary],
    species: &str,
) -> IndexDocument {
    let mut document =
        IndexDocument::new(interactor.accession.clone(), "Interactor", "Interactor");

    document.name = Some(match &interactor.alias {
        Some(alias) => alias_without_species(alias),
        None => interactor.accession.clone(),
    });
    document.synonyms = interactor.alias.clone().into_iter().collect();
    document.reference_identifiers = vec![interactor.accession.clone()];
    document.reference_url = Some(accession_url(&interactor.accession));
    document.database_name = Some(database_name_for(&interactor.accession).to_string());
    document.species = vec![species.to_string()];

    for summary in summaries {
        document
            .interacting_entity_ids
            .push(join_multivalue(&summary.summary.ids));
        document
            .interacting_entity_names
            .push(join_multivalue(&summary.summary.names));
        document
            .interaction_ids
            .push(join_multivalue(&summary.evidence_ids));
        document.scores.push(summary.score);
        document.interactor_accessions.push(summary.accession.clone());
    }

    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::SpeciesRef;
    use crate::graph::{EntityKind, EntityStub, GraphEntity};
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockGraph {
        reference_identifiers: Vec<String>,
        referencing: HashMap<String, Vec<EntityStub>>,
        traversals: AtomicUsize,
    }

    #[async_trait]
    impl GraphProvider for MockGraph {
        async fn entity_ids(&self, _kind: EntityKind) -> Result<Vec<i64>, GraphError> {
            Ok(Vec::new())
        }

        async fn count_entities(&self, _kind: EntityKind) -> Result<u64, GraphError> {
            Ok(0)
        }

        async fn load_entity(&self, _db_id: i64) -> Result<Option<GraphEntity>, GraphError> {
            Ok(None)
        }

        async fn species_index(
            &self,
        ) -> Result<HashMap<i64, BTreeSet<String>>, GraphError> {
            Ok(HashMap::new())
        }

        async fn all_species(&self) -> Result<Vec<SpeciesRef>, GraphError> {
            Ok(Vec::new())
        }

        async fn reference_identifiers(&self) -> Result<Vec<String>, GraphError> {
            Ok(self.reference_identifiers.clone())
        }

        async fn entities_referencing(
            &self,
            accession: &str,
        ) -> Result<Vec<EntityStub>, GraphError> {
            self.traversals.fetch_add(1, Ordering::SeqCst);
            Ok(self.referencing.get(accession).cloned().unwrap_or_default())
        }

        async fn release_number(&self) -> Result<u32, GraphError> {
            Ok(1)
        }

        async fn clear_cache(&self) {}
    }

    fn stub(db_id: i64, st_id: Option<&str>, name: &str) -> EntityStub {
        EntityStub {
            db_id,
            st_id: st_id.map(|s| s.to_string()),
            display_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn partitions_resolved_and_unresolved() {
        let mut referencing = HashMap::new();
        referencing.insert(
            "P04637".to_string(),
            vec![
                stub(1, Some("R-HSA-1"), "TP53 [nucleoplasm]"),
                stub(2, None, "TP53 complex"),
            ],
        );
        let graph = MockGraph {
            reference_identifiers: vec![
                "P04637".to_string(),
                // in the graph but never queried for
                "Q00001".to_string(),
            ],
            referencing,
            traversals: AtomicUsize::new(0),
        };

        let accessions: HashSet<String> = ["P04637", "P99999", "CHEBI:1"]
            .into_iter()
            .map(String::from)
            .collect();

        let outcome = reconcile(&graph, &accessions).await.unwrap();

        assert_eq!(
            outcome.unresolved,
            ["P99999", "CHEBI:1"].into_iter().map(String::from).collect()
        );
        assert_eq!(outcome.summaries.len(), 1);
        let summary = &outcome.summaries["P04637"];
        assert_eq!(summary.ids, vec!["R-HSA-1", "2"]);
        assert_eq!(summary.names, vec!["TP53 [nucleoplasm]", "TP53 complex"]);
        // one traversal per matched accession only
        assert_eq!(graph.traversals.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn matched_accession_without_referers_gets_no_summary() {
        let graph = MockGraph {
            reference_identifiers: vec!["P04637".to_string()],
            referencing: HashMap::new(),
            traversals: AtomicUsize::new(0),
        };
        let accessions: HashSet<String> = [String::from("P04637")].into_iter().collect();

        let outcome = reconcile(&graph, &accessions).await.unwrap();

        assert!(outcome.unresolved.is_empty());
        assert!(outcome.summaries.is_empty());
    }

    #[test]
    fn interactor_document_fields() {
        let interactor = Interactor {
            accession: "Q13501".to_string(),
            alias: Some("SQSTM_HUMAN".to_string()),
            tax_id: 9606,
        };
        let summaries = vec![InteractorSummary {
            accession: "P04637".to_string(),
            summary: GraphEntrySummary {
                ids: vec!["R-HSA-1".to_string(), "R-HSA-2".to_string()],
                names: vec!["TP53 [nucleoplasm]".to_string(), "TP53 complex".to_string()],
            },
            score: 0.97,
            evidence_ids: vec!["EBI-1000".to_string(), "EBI-1001".to_string()],
        }];

        let doc = build_interactor_document(&interactor, &summaries, "Homo sapiens");

        assert_eq!(doc.db_id, "Q13501");
        assert_eq!(doc.doc_type, "Interactor");
        assert_eq!(doc.exact_type, "Interactor");
        assert_eq!(doc.name.as_deref(), Some("SQSTM"));
        assert_eq!(doc.synonyms, vec!["SQSTM_HUMAN"]);
        assert_eq!(doc.species, vec!["Homo sapiens"]);
        assert_eq!(doc.database_name.as_deref(), Some("UniProt"));
        assert_eq!(
            doc.reference_url.as_deref(),
            Some("https://www.uniprot.org/uniprot/Q13501")
        );
        assert_eq!(doc.interacting_entity_ids, vec!["R-HSA-1#R-HSA-2"]);
        assert_eq!(
            doc.interacting_entity_names,
            vec!["TP53 [nucleoplasm]#TP53 complex"]
        );
        assert_eq!(doc.interaction_ids, vec!["EBI-1000#EBI-1001"]);
        assert_eq!(doc.scores, vec![0.97]);
        assert_eq!(doc.interactor_accessions, vec!["P04637"]);
    }

    #[test]
    fn interactor_without_alias_uses_accession_as_name() {
        let interactor = Interactor {
            accession: "CHEBI:15422".to_string(),
            alias: None,
            tax_id: 0,
        };

        let doc = build_interactor_document(&interactor, &[], "Entries without species");

        assert_eq!(doc.name.as_deref(), Some("CHEBI:15422"));
        assert!(doc.synonyms.is_empty());
        assert_eq!(doc.database_name.as_deref(), Some("ChEBI"));
    }
}
