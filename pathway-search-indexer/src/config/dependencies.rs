//! Dependency initialization and wiring for the indexing pipeline.

use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::document::DocumentBuilder;
use crate::errors::IndexerError;
use crate::export::EbeyeExporter;
use crate::graph::Neo4jGraphProvider;
use crate::interactions::PgInteractionProvider;
use crate::interactors::taxonomy::{RestLineageClient, TaxonomyCache};
use crate::pipeline::IndexPipeline;
use pathway_search_repository::{IndexConfig, OpenSearchProvider, SearchIndexProvider};

/// Default Neo4j bolt URI.
const DEFAULT_NEO4J_URI: &str = "bolt://localhost:7687";

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default search index alias.
const DEFAULT_INDEX_ALIAS: &str = "pathways";

/// Default taxonomy lineage service.
const DEFAULT_TAXONOMY_URL: &str = "https://rest.ensembl.org";

/// Default controlled vocabulary resource.
const DEFAULT_VOCABULARY_PATH: &str = "resources/controlled_vocabulary.csv";

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured pipeline ready to run.
    pub pipeline: IndexPipeline,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `NEO4J_URI`: Neo4j bolt URI (default: bolt://localhost:7687)
    /// - `NEO4J_USER` / `NEO4J_PASSWORD`: graph credentials
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `INDEX_ALIAS`: index alias name (default: "pathways")
    /// - `INDEX_VERSION`: index version number (default: 0)
    /// - `DATABASE_URL`: Postgres URL of the interaction dataset (required)
    /// - `EBEYE_XML`: path of the export mirror file (unset disables export)
    /// - `CONTROLLED_VOCABULARY`: keyword vocabulary path
    ///   (default: resources/controlled_vocabulary.csv; load failure
    ///   disables keyword tagging but is not fatal)
    /// - `TAXONOMY_URL`: lineage service base URL
    ///   (default: https://rest.ensembl.org)
    pub async fn new() -> Result<Self, IndexerError> {
        let neo4j_uri = env::var("NEO4J_URI").unwrap_or_else(|_| DEFAULT_NEO4J_URI.to_string());
        let neo4j_user = env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".to_string());
        let neo4j_password = env::var("NEO4J_PASSWORD").unwrap_or_default();
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let index_alias =
            env::var("INDEX_ALIAS").unwrap_or_else(|_| DEFAULT_INDEX_ALIAS.to_string());
        let index_version = env::var("INDEX_VERSION")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| IndexerError::config("DATABASE_URL must be set"))?;
        let taxonomy_url =
            env::var("TAXONOMY_URL").unwrap_or_else(|_| DEFAULT_TAXONOMY_URL.to_string());
        let vocabulary_path = env::var("CONTROLLED_VOCABULARY")
            .unwrap_or_else(|_| DEFAULT_VOCABULARY_PATH.to_string());
        let ebeye_path = env::var("EBEYE_XML").ok();

        info!(
            neo4j_uri = %neo4j_uri,
            opensearch_url = %opensearch_url,
            index_alias = %index_alias,
            index_version,
            export = ebeye_path.is_some(),
            "Initializing dependencies"
        );

        let graph = Neo4jGraphProvider::connect(&neo4j_uri, &neo4j_user, &neo4j_password)
            .map_err(|e| IndexerError::config(format!("Failed to connect to Neo4j: {}", e)))?;

        let index_config = IndexConfig::new(index_alias, index_version);
        let search_provider = OpenSearchProvider::new(&opensearch_url, index_config)
            .map_err(|e| {
                IndexerError::config(format!("Failed to create OpenSearch provider: {}", e))
            })?;
        search_provider.ensure_index_exists().await.map_err(|e| {
            IndexerError::config(format!("Failed to ensure index exists: {}", e))
        })?;
        info!("OpenSearch connection established");

        let interactions = PgInteractionProvider::connect(&database_url).await.map_err(|e| {
            IndexerError::config(format!("Failed to connect to the interaction dataset: {}", e))
        })?;

        let builder = DocumentBuilder::new(load_vocabulary(&vocabulary_path));

        let lineage = Arc::new(RestLineageClient::new(taxonomy_url));
        let taxonomy = TaxonomyCache::new(lineage);

        let exporter = match ebeye_path {
            Some(path) => Some(EbeyeExporter::create(Path::new(&path))?),
            None => None,
        };

        let pipeline = IndexPipeline::new(
            Arc::new(graph),
            Arc::new(search_provider),
            Arc::new(interactions),
            builder,
            taxonomy,
            exporter,
        );

        Ok(Self { pipeline })
    }
}

/// Load the controlled vocabulary, one term per line. Absence disables
/// keyword tagging but is not fatal.
fn load_vocabulary(path: &str) -> Option<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let terms: Vec<String> = content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect();
            info!(path = %path, terms = terms.len(), "Controlled vocabulary loaded");
            Some(terms)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Could not load the controlled vocabulary");
            None
        }
    }
}
