//! Pathway Search Indexer Main Entry Point
//!
//! Walks the knowledge graph, flattens every entity into a search document,
//! loads the documents into OpenSearch in checkpointed batches and
//! cross-references the molecular interaction dataset against the graph.

use std::error::Error as _;

use dotenv::dotenv;
use pathway_search_indexer::{Dependencies, IndexerError};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pathway_search_indexer=info"));

    if env::var("LOG_JSON").is_ok() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();
    }

    info!(
        service_name = "pathway-search-indexer",
        service_version = env!("CARGO_PKG_VERSION"),
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), IndexerError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing();

    info!("Starting pathway search indexer");

    let mut deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match deps.pipeline.run().await {
        Ok(entries) => {
            info!(entries, "Indexing run completed successfully");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Indexing run failed");
            if let Some(cause) = e.source() {
                error!(cause = %cause, "Root cause");
            }
            Err(e)
        }
    }
}
