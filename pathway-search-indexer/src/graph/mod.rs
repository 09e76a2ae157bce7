//! Read-only access to the knowledge graph.
//!
//! The [`GraphProvider`] trait is the boundary the pipeline, document
//! builder and reconciler drive; [`Neo4jGraphProvider`] is the production
//! implementation.

pub mod model;
pub mod neo4j;

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use thiserror::Error;

pub use model::GraphEntity;
pub use neo4j::Neo4jGraphProvider;

use model::SpeciesRef;

/// The entity populations indexed by the pipeline, in indexing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    PhysicalEntity,
    Event,
    Regulation,
}

impl EntityKind {
    /// Fixed order the pipeline walks the populations in.
    pub const INDEXING_ORDER: [EntityKind; 3] = [
        EntityKind::PhysicalEntity,
        EntityKind::Event,
        EntityKind::Regulation,
    ];

    /// The node label of this population in the graph.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::PhysicalEntity => "PhysicalEntity",
            EntityKind::Event => "Event",
            EntityKind::Regulation => "Regulation",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors from the graph collaborator.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The query itself failed (connection, syntax, server error).
    #[error("Graph query error: {0}")]
    Query(#[from] neo4rs::Error),

    /// A result row could not be mapped into the typed model.
    #[error("Entity mapping error: {0}")]
    Mapping(String),
}

impl GraphError {
    /// Create a mapping error.
    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::Mapping(msg.into())
    }
}

impl From<neo4rs::DeError> for GraphError {
    fn from(err: neo4rs::DeError) -> Self {
        Self::Mapping(err.to_string())
    }
}

/// Minimal projection of a graph entity, used by the accession reconciler.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityStub {
    pub db_id: i64,
    pub st_id: Option<String>,
    pub display_name: String,
}

/// Read-only queries against the knowledge graph.
///
/// Failure contract: [`load_entity`](Self::load_entity) errors are caught
/// per entity by the document builder and treated as "missing"; every other
/// method's error is fatal to the run.
#[async_trait]
pub trait GraphProvider: Send + Sync {
    /// All identifiers of the given entity kind.
    async fn entity_ids(&self, kind: EntityKind) -> Result<Vec<i64>, GraphError>;

    /// Population size of the given entity kind.
    async fn count_entities(&self, kind: EntityKind) -> Result<u64, GraphError>;

    /// Load one entity with all attributes the document builder consumes.
    /// Returns `Ok(None)` when no node carries the identifier.
    async fn load_entity(&self, db_id: i64) -> Result<Option<GraphEntity>, GraphError>;

    /// Aggregate species per simple entity, for the one kind that has no
    /// direct species attribute. Computed once per run.
    async fn species_index(&self) -> Result<HashMap<i64, BTreeSet<String>>, GraphError>;

    /// Every species known to the graph, used to seed the taxonomy cache.
    async fn all_species(&self) -> Result<Vec<SpeciesRef>, GraphError>;

    /// The full reference-identifier universe of the graph.
    async fn reference_identifiers(&self) -> Result<Vec<String>, GraphError>;

    /// Every entity transitively referencing the given accession through the
    /// structural relations up to a reaction-like event.
    async fn entities_referencing(&self, accession: &str)
        -> Result<Vec<EntityStub>, GraphError>;

    /// The release number of the loaded graph, for the export header.
    async fn release_number(&self) -> Result<u32, GraphError>;

    /// Cooperative hint that per-request caches can be dropped. Best-effort;
    /// failures are swallowed by the implementation.
    async fn clear_cache(&self);
}
