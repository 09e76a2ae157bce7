//! The molecular interaction dataset collaborator.
//!
//! The dataset lives outside the graph; the pipeline only ever asks for the
//! accession universe and for score-filtered interactions scoped to a set of
//! accessions. The queried accession is always interactor A of a returned
//! interaction.

pub mod postgres;

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use thiserror::Error;

pub use postgres::PgInteractionProvider;

/// Interactions below this score are never indexed.
pub const MINIMUM_VALID_SCORE: f64 = 0.45;

/// Scoring mode applied by the dataset when filtering interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    /// The fixed minimum-score cutoff.
    Static,
}

/// One molecule of the interaction dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Interactor {
    pub accession: String,
    /// `None` when the alias equals the accession.
    pub alias: Option<String>,
    pub tax_id: i32,
}

/// A scored, directional interaction; the queried accession is always side A.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub interactor_a: Interactor,
    pub interactor_b: Interactor,
    pub score: f64,
    pub evidence_ids: Vec<String>,
}

/// Errors from the interaction dataset.
#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("Interaction database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read-only queries against the interaction dataset.
#[async_trait]
pub trait InteractionProvider: Send + Sync {
    /// All unique accession identifiers known to the dataset.
    async fn all_accessions(&self) -> Result<Vec<String>, InteractionError>;

    /// Interactions scoped to the given accessions, keyed by the queried
    /// accession, already filtered by the scoring mode.
    async fn interactions_for(
        &self,
        accessions: &HashSet<String>,
        mode: ScoringMode,
    ) -> Result<HashMap<String, Vec<Interaction>>, InteractionError>;
}

/// External database an accession belongs to, judged by its namespace.
pub fn database_name_for(accession: &str) -> &'static str {
    if accession.starts_with("CHEBI") {
        "ChEBI"
    } else {
        "UniProt"
    }
}

/// Public URL for an accession in its home database.
pub fn accession_url(accession: &str) -> String {
    if accession.starts_with("CHEBI") {
        format!("https://www.ebi.ac.uk/chebi/searchId.do?chebiId={}", accession)
    } else {
        format!("https://www.uniprot.org/uniprot/{}", accession)
    }
}

/// Strip the species suffix from a dataset alias (`BRCA1_HUMAN` → `BRCA1`).
pub fn alias_without_species(alias: &str) -> String {
    alias.split('_').next().unwrap_or(alias).to_string()
}

/// Join a multivalued field with `#`.
///
/// Names in the graph can contain commas, so a comma-separated encoding
/// would split wrongly on the consumer side.
pub fn join_multivalue(values: &[String]) -> String {
    values.join("#")
}
