//! Integration tests for the indexing pipeline.
//!
//! These tests run the real pipeline against mock collaborators (graph,
//! search index, interaction dataset and lineage service) to verify the
//! batching, commit and fallback behavior end to end.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use pathway_search_indexer::document::DocumentBuilder;
use pathway_search_indexer::graph::model::{
    EntityCore, Event, EventKind, GraphEntity, PhysicalEntity, PhysicalEntityKind, SpeciesRef,
};
use pathway_search_indexer::graph::{EntityKind, EntityStub, GraphError, GraphProvider};
use pathway_search_indexer::interactions::{
    Interaction, InteractionError, InteractionProvider, Interactor, ScoringMode,
};
use pathway_search_indexer::interactors::taxonomy::{LineageClient, LineageError, TaxonomyCache};
use pathway_search_indexer::pipeline::{IndexPipeline, PipelineConfig};
use pathway_search_repository::{SearchIndexError, SearchIndexProvider};
use pathway_search_shared::IndexDocument;

// Mock graph collaborator backed by in-memory entities.
struct MockGraph {
    entities: HashMap<i64, GraphEntity>,
    populations: HashMap<&'static str, Vec<i64>>,
    referencing: HashMap<String, Vec<EntityStub>>,
    reference_identifiers: Vec<String>,
    cache_clears: AtomicUsize,
}

impl MockGraph {
    fn new() -> Self {
        Self {
            entities: HashMap::new(),
            populations: HashMap::new(),
            referencing: HashMap::new(),
            reference_identifiers: Vec::new(),
            cache_clears: AtomicUsize::new(0),
        }
    }

    fn with_entity(mut self, kind: EntityKind, entity: GraphEntity) -> Self {
        let db_id = entity.core().db_id;
        self.entities.insert(db_id, entity);
        self.populations.entry(kind.label()).or_default().push(db_id);
        self
    }

    /// Register an id in a population without a loadable entity behind it.
    fn with_missing(mut self, kind: EntityKind, db_id: i64) -> Self {
        self.populations.entry(kind.label()).or_default().push(db_id);
        self
    }
}

#[async_trait]
impl GraphProvider for MockGraph {
    async fn entity_ids(&self, kind: EntityKind) -> Result<Vec<i64>, GraphError> {
        Ok(self.populations.get(kind.label()).cloned().unwrap_or_default())
    }

    async fn count_entities(&self, kind: EntityKind) -> Result<u64, GraphError> {
        Ok(self
            .populations
            .get(kind.label())
            .map(|ids| ids.len() as u64)
            .unwrap_or(0))
    }

    async fn load_entity(&self, db_id: i64) -> Result<Option<GraphEntity>, GraphError> {
        Ok(self.entities.get(&db_id).cloned())
    }

    async fn species_index(&self) -> Result<HashMap<i64, BTreeSet<String>>, GraphError> {
        Ok(HashMap::new())
    }

    async fn all_species(&self) -> Result<Vec<SpeciesRef>, GraphError> {
        Ok(vec![SpeciesRef {
            tax_id: "9606".to_string(),
            display_name: "Homo sapiens".to_string(),
        }])
    }

    async fn reference_identifiers(&self) -> Result<Vec<String>, GraphError> {
        Ok(self.reference_identifiers.clone())
    }

    async fn entities_referencing(
        &self,
        accession: &str,
    ) -> Result<Vec<EntityStub>, GraphError> {
        Ok(self.referencing.get(accession).cloned().unwrap_or_default())
    }

    async fn release_number(&self) -> Result<u32, GraphError> {
        Ok(93)
    }

    async fn clear_cache(&self) {
        self.cache_clears.fetch_add(1, Ordering::SeqCst);
    }
}

// Mock search index recording every call.
struct MockIndex {
    bulk_sizes: Mutex<Vec<usize>>,
    single_added: Mutex<Vec<String>>,
    clears: AtomicUsize,
    commits: AtomicUsize,
    closes: AtomicUsize,
    fail_bulk: bool,
    fail_single_for: HashSet<String>,
}

impl MockIndex {
    fn new() -> Self {
        Self {
            bulk_sizes: Mutex::new(Vec::new()),
            single_added: Mutex::new(Vec::new()),
            clears: AtomicUsize::new(0),
            commits: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            fail_bulk: false,
            fail_single_for: HashSet::new(),
        }
    }

    fn failing_bulk() -> Self {
        Self {
            fail_bulk: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl SearchIndexProvider for MockIndex {
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        Ok(())
    }

    async fn clear_index(&self) -> Result<(), SearchIndexError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn add_documents(&self, documents: &[IndexDocument]) -> Result<(), SearchIndexError> {
        if self.fail_bulk {
            return Err(SearchIndexError::bulk_index("mock bulk failure"));
        }
        self.bulk_sizes.lock().unwrap().push(documents.len());
        Ok(())
    }

    async fn add_document(&self, document: &IndexDocument) -> Result<(), SearchIndexError> {
        if self.fail_single_for.contains(&document.db_id) {
            return Err(SearchIndexError::index("mock single failure"));
        }
        self.single_added.lock().unwrap().push(document.db_id.clone());
        Ok(())
    }

    async fn commit(&self) -> Result<(), SearchIndexError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), SearchIndexError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// Mock interaction dataset.
struct MockInteractions {
    accessions: Vec<String>,
    interactions: HashMap<String, Vec<Interaction>>,
}

impl MockInteractions {
    fn empty() -> Self {
        Self {
            accessions: Vec::new(),
            interactions: HashMap::new(),
        }
    }
}

#[async_trait]
impl InteractionProvider for MockInteractions {
    async fn all_accessions(&self) -> Result<Vec<String>, InteractionError> {
        Ok(self.accessions.clone())
    }

    async fn interactions_for(
        &self,
        accessions: &HashSet<String>,
        _mode: ScoringMode,
    ) -> Result<HashMap<String, Vec<Interaction>>, InteractionError> {
        Ok(self
            .interactions
            .iter()
            .filter(|(accession, _)| accessions.contains(*accession))
            .map(|(accession, list)| (accession.clone(), list.clone()))
            .collect())
    }
}

struct NoLineage;

#[async_trait]
impl LineageClient for NoLineage {
    async fn parent_tax_id(&self, _tax_id: i32) -> Result<i32, LineageError> {
        Err(LineageError::Failed("unexpected lineage lookup".to_string()))
    }
}

fn physical_entity(db_id: i64) -> GraphEntity {
    GraphEntity::PhysicalEntity(PhysicalEntity {
        core: EntityCore {
            db_id,
            st_id: Some(format!("R-HSA-{}", db_id)),
            old_st_id: None,
            display_name: format!("Entity {}", db_id),
            schema_class: "Complex".to_string(),
        },
        kind: PhysicalEntityKind::Complex,
        names: vec![format!("Entity {}", db_id)],
        literature: Vec::new(),
        summations: Vec::new(),
        diseases: Vec::new(),
        compartments: Vec::new(),
        cross_references: Vec::new(),
        go_cellular_component: None,
        reference_entity: None,
        species: Vec::new(),
        related_species: Vec::new(),
    })
}

fn event(db_id: i64) -> GraphEntity {
    GraphEntity::Event(Event {
        core: EntityCore {
            db_id,
            st_id: Some(format!("R-HSA-{}", db_id)),
            old_st_id: None,
            display_name: format!("Event {}", db_id),
            schema_class: "Pathway".to_string(),
        },
        kind: EventKind::Pathway,
        names: vec![format!("Event {}", db_id)],
        literature: Vec::new(),
        summations: Vec::new(),
        diseases: Vec::new(),
        compartments: Vec::new(),
        cross_references: Vec::new(),
        go_biological_process: None,
        authored: Vec::new(),
        reviewed: Vec::new(),
        species: Vec::new(),
        related_species: Vec::new(),
    })
}

fn pipeline(
    graph: Arc<MockGraph>,
    index: Arc<MockIndex>,
    interactions: Arc<MockInteractions>,
) -> IndexPipeline {
    IndexPipeline::new(
        graph,
        index,
        interactions,
        DocumentBuilder::new(None),
        TaxonomyCache::new(Arc::new(NoLineage)),
        None,
    )
}

#[tokio::test]
async fn one_batch_add_per_non_empty_kind_and_one_commit_each() {
    let graph = Arc::new(
        MockGraph::new()
            .with_entity(EntityKind::PhysicalEntity, physical_entity(1))
            .with_entity(EntityKind::PhysicalEntity, physical_entity(2))
            .with_entity(EntityKind::PhysicalEntity, physical_entity(3))
            .with_entity(EntityKind::Event, event(10))
            .with_entity(EntityKind::Event, event(11)),
    );
    let index = Arc::new(MockIndex::new());
    let interactions = Arc::new(MockInteractions::empty());

    let entries = pipeline(graph.clone(), index.clone(), interactions)
        .run()
        .await
        .unwrap();

    assert_eq!(entries, 5);
    // one bulk add per non-empty kind; the empty regulation batch is skipped
    assert_eq!(*index.bulk_sizes.lock().unwrap(), vec![3, 2]);
    // one commit per non-empty kind plus the cleanup commit
    assert_eq!(index.commits.load(Ordering::SeqCst), 3);
    assert_eq!(index.clears.load(Ordering::SeqCst), 1);
    // the connection is closed exactly once
    assert_eq!(index.closes.load(Ordering::SeqCst), 1);
    // the cache hint fires between kinds
    assert_eq!(graph.cache_clears.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn bulk_failure_degrades_to_per_document_retry() {
    let graph = Arc::new(
        MockGraph::new()
            .with_entity(EntityKind::PhysicalEntity, physical_entity(1))
            .with_entity(EntityKind::PhysicalEntity, physical_entity(2))
            .with_entity(EntityKind::PhysicalEntity, physical_entity(3)),
    );
    let mut index = MockIndex::failing_bulk();
    // one document keeps failing even individually; the run still succeeds
    index.fail_single_for.insert("2".to_string());
    let index = Arc::new(index);
    let interactions = Arc::new(MockInteractions::empty());

    let entries = pipeline(graph, index.clone(), interactions)
        .run()
        .await
        .unwrap();

    assert_eq!(entries, 3);
    assert!(index.bulk_sizes.lock().unwrap().is_empty());
    // the two recoverable documents were added individually
    assert_eq!(*index.single_added.lock().unwrap(), vec!["1", "3"]);
    // the cleanup commit plus the physical-entity commit; a
    // partially-successful batch still commits
    assert_eq!(index.commits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unmappable_entities_are_skipped_not_fatal() {
    let graph = Arc::new(
        MockGraph::new()
            .with_entity(EntityKind::PhysicalEntity, physical_entity(1))
            .with_missing(EntityKind::PhysicalEntity, 99)
            .with_entity(EntityKind::PhysicalEntity, physical_entity(3)),
    );
    let index = Arc::new(MockIndex::new());
    let interactions = Arc::new(MockInteractions::empty());

    let entries = pipeline(graph, index.clone(), interactions)
        .run()
        .await
        .unwrap();

    // the missing id counts as processed but produces no document
    assert_eq!(entries, 3);
    assert_eq!(*index.bulk_sizes.lock().unwrap(), vec![2]);
}

#[tokio::test]
async fn batches_flush_at_the_configured_size() {
    let mut graph = MockGraph::new();
    for db_id in 1..=5 {
        graph = graph.with_entity(EntityKind::PhysicalEntity, physical_entity(db_id));
    }
    let graph = Arc::new(graph);
    let index = Arc::new(MockIndex::new());
    let interactions = Arc::new(MockInteractions::empty());

    let mut pipeline = IndexPipeline::with_config(
        graph,
        index.clone(),
        interactions,
        DocumentBuilder::new(None),
        TaxonomyCache::new(Arc::new(NoLineage)),
        None,
        PipelineConfig {
            batch_size: 2,
            cache_clear_interval: 30_000,
        },
    );
    pipeline.run().await.unwrap();

    assert_eq!(*index.bulk_sizes.lock().unwrap(), vec![2, 2, 1]);
}

#[tokio::test]
async fn interactor_phase_indexes_resolved_partners_only() {
    let mut graph = MockGraph::new();
    graph.reference_identifiers = vec!["P04637".to_string()];
    graph.referencing.insert(
        "P04637".to_string(),
        vec![EntityStub {
            db_id: 1,
            st_id: Some("R-HSA-1".to_string()),
            display_name: "TP53 [nucleoplasm]".to_string(),
        }],
    );
    let graph = Arc::new(graph);

    let in_graph = Interactor {
        accession: "P04637".to_string(),
        alias: None,
        tax_id: 9606,
    };
    let external = Interactor {
        accession: "Q13501".to_string(),
        alias: Some("SQSTM_HUMAN".to_string()),
        tax_id: 9606,
    };
    let orphan = Interactor {
        accession: "Q99999".to_string(),
        alias: None,
        tax_id: 9606,
    };

    let mut interactions = MockInteractions::empty();
    interactions.accessions = vec![
        "P04637".to_string(),
        "Q13501".to_string(),
        "Q99999".to_string(),
        // dataset-internal identifier, dropped before reconciliation
        "EBI-123456".to_string(),
    ];
    // external molecule interacting with something in the graph: indexed
    interactions.interactions.insert(
        "Q13501".to_string(),
        vec![Interaction {
            interactor_a: external.clone(),
            interactor_b: in_graph.clone(),
            score: 0.98,
            evidence_ids: vec!["EBI-1000".to_string()],
        }],
    );
    // external molecule whose only partner is also external: not indexed
    interactions.interactions.insert(
        "Q99999".to_string(),
        vec![Interaction {
            interactor_a: orphan,
            interactor_b: external.clone(),
            score: 0.99,
            evidence_ids: Vec::new(),
        }],
    );
    let interactions = Arc::new(interactions);
    let index = Arc::new(MockIndex::new());

    let entries = pipeline(graph, index.clone(), interactions)
        .run()
        .await
        .unwrap();

    assert_eq!(entries, 1);
    assert_eq!(*index.bulk_sizes.lock().unwrap(), vec![1]);
    // the cleanup commit plus the interactor commit
    assert_eq!(index.commits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn graph_cache_hint_fires_at_the_configured_interval() {
    let mut graph = MockGraph::new();
    for db_id in 1..=5 {
        graph = graph.with_entity(EntityKind::PhysicalEntity, physical_entity(db_id));
    }
    let graph = Arc::new(graph);
    let index = Arc::new(MockIndex::new());
    let interactions = Arc::new(MockInteractions::empty());

    let mut pipeline = IndexPipeline::with_config(
        graph.clone(),
        index,
        interactions,
        DocumentBuilder::new(None),
        TaxonomyCache::new(Arc::new(NoLineage)),
        None,
        PipelineConfig {
            batch_size: 1000,
            cache_clear_interval: 2,
        },
    );
    pipeline.run().await.unwrap();

    // twice inside the kind (after 2 and 4 entities) plus once after each
    // of the three kinds
    assert_eq!(graph.cache_clears.load(Ordering::SeqCst), 5);
}
