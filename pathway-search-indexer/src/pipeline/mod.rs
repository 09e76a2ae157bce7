//! The batch indexing pipeline.
//!
//! Drives a full run: count the populations, clear the index, stream each
//! entity kind through the document builder in fixed-size batches, mirror
//! entries to the export sink when enabled, then reconcile and index the
//! external interactors. Batch submission degrades to a per-document retry
//! on bulk failures; clear and commit failures abort the run.

pub mod progress;

use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::document::DocumentBuilder;
use crate::errors::IndexerError;
use crate::export::EbeyeExporter;
use crate::graph::{EntityKind, GraphProvider};
use crate::interactions::{InteractionProvider, ScoringMode};
use crate::interactors::taxonomy::TaxonomyCache;
use crate::interactors::{build_interactor_document, reconcile, InteractorSummary};
use crate::pipeline::progress::ProgressBar;
use pathway_search_repository::SearchIndexProvider;
use pathway_search_shared::IndexDocument;

/// Configuration for the indexing pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of documents accumulated before a batch is submitted.
    pub batch_size: usize,
    /// Number of processed entities between graph cache-clear hints.
    pub cache_clear_interval: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            cache_clear_interval: 30_000,
        }
    }
}

/// One full indexing run over the graph and the interaction dataset.
pub struct IndexPipeline {
    graph: Arc<dyn GraphProvider>,
    index: Arc<dyn SearchIndexProvider>,
    interactions: Arc<dyn InteractionProvider>,
    builder: DocumentBuilder,
    taxonomy: TaxonomyCache,
    exporter: Option<EbeyeExporter<BufWriter<File>>>,
    config: PipelineConfig,
    progress: ProgressBar,
}

impl IndexPipeline {
    pub fn new(
        graph: Arc<dyn GraphProvider>,
        index: Arc<dyn SearchIndexProvider>,
        interactions: Arc<dyn InteractionProvider>,
        builder: DocumentBuilder,
        taxonomy: TaxonomyCache,
        exporter: Option<EbeyeExporter<BufWriter<File>>>,
    ) -> Self {
        Self::with_config(
            graph,
            index,
            interactions,
            builder,
            taxonomy,
            exporter,
            PipelineConfig::default(),
        )
    }

    pub fn with_config(
        graph: Arc<dyn GraphProvider>,
        index: Arc<dyn SearchIndexProvider>,
        interactions: Arc<dyn InteractionProvider>,
        builder: DocumentBuilder,
        taxonomy: TaxonomyCache,
        exporter: Option<EbeyeExporter<BufWriter<File>>>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            graph,
            index,
            interactions,
            builder,
            taxonomy,
            exporter,
            config,
            progress: ProgressBar::new(),
        }
    }

    /// Run the full indexing pipeline. Returns the number of indexed
    /// entries. The index connection is closed on both outcomes.
    pub async fn run(&mut self) -> Result<u64, IndexerError> {
        let outcome = self.run_inner().await;
        if let Err(e) = self.index.close().await {
            warn!(error = %e, "Failed to close the index connection");
        }
        outcome
    }

    async fn run_inner(&mut self) -> Result<u64, IndexerError> {
        let started = Instant::now();
        let mut entries: u64 = 0;

        self.count_total().await?;

        if self.exporter.is_some() {
            let release = match self.graph.release_number().await {
                Ok(release) => release,
                Err(e) => {
                    error!(error = %e, "Could not retrieve the release number from the graph");
                    0
                }
            };
            if let Some(exporter) = &mut self.exporter {
                exporter.write_header(release)?;
            }
        }

        self.clear_index().await?;

        for kind in EntityKind::INDEXING_ORDER {
            let indexed = self.index_kind(kind, entries).await?;
            entries += indexed;
            if indexed > 0 {
                self.commit().await?;
            }
            self.graph.clear_cache().await;
        }

        if let Some(exporter) = &mut self.exporter {
            exporter.write_footer(entries)?;
        }

        info!("Started indexing interactors");
        let interactors = self.index_interactors().await?;
        entries += interactors;
        if interactors > 0 {
            self.commit().await?;
        }

        info!(
            total = entries,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Full indexing finished"
        );
        println!("\nData import finished with {} entries imported.", entries);

        Ok(entries)
    }

    /// Sum the population sizes up front; used only to size the progress
    /// bar, never for correctness.
    async fn count_total(&mut self) -> Result<(), IndexerError> {
        info!("Counting entries of every entity kind");
        let mut total = 0;
        for kind in EntityKind::INDEXING_ORDER {
            total += self.graph.count_entities(kind).await?;
        }
        self.progress.set_total(total);
        Ok(())
    }

    /// Clear the index; failing to clear means the run cannot proceed.
    async fn clear_index(&self) -> Result<(), IndexerError> {
        info!("Clearing the search index");
        self.index.clear_index().await?;
        self.commit().await?;
        info!("Search index has been cleared");
        Ok(())
    }

    async fn commit(&self) -> Result<(), IndexerError> {
        self.index.commit().await?;
        info!("Search index has been committed");
        Ok(())
    }

    /// Stream one entity population through the document builder.
    ///
    /// Returns the number of processed identifiers; entities that fail to
    /// map are logged in bulk at the end of the kind and never abort it.
    async fn index_kind(&mut self, kind: EntityKind, previous: u64) -> Result<u64, IndexerError> {
        let started = Instant::now();
        let ids = self.graph.entity_ids(kind).await?;
        info!(kind = %kind, population = ids.len(), "Indexing entity population");

        let mut batch: Vec<IndexDocument> = Vec::with_capacity(self.config.batch_size);
        let mut missing: Vec<i64> = Vec::new();
        let mut processed: u64 = 0;

        for db_id in ids {
            match self.builder.build(self.graph.as_ref(), db_id).await {
                Some(document) => {
                    if let Some(exporter) = &mut self.exporter {
                        exporter.write_entry(&document)?;
                    }
                    batch.push(document);
                }
                None => missing.push(db_id),
            }

            processed += 1;
            if processed as usize % self.config.batch_size == 0 && !batch.is_empty() {
                self.submit_batch(&mut batch).await;
                if let Some(exporter) = &mut self.exporter {
                    exporter.flush()?;
                }
                info!(kind = %kind, processed, "Documents added to the search index");
            }
            if (previous + processed) % 100 == 0 {
                self.progress.update(previous + processed);
            }
            if processed as usize % self.config.cache_clear_interval == 0 {
                self.graph.clear_cache().await;
            }
        }

        if !batch.is_empty() {
            self.submit_batch(&mut batch).await;
        }

        if !missing.is_empty() {
            warn!(
                kind = %kind,
                count = missing.len(),
                ids = ?missing,
                "Entities could not be mapped"
            );
        }

        self.progress.update(previous + processed);
        info!(
            kind = %kind,
            processed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Finished entity population"
        );

        Ok(processed)
    }

    /// Submit a batch, degrading to per-document retries when the bulk call
    /// fails. A partially-successful batch is an accepted outcome; residual
    /// per-document failures are logged and the run continues. Leaves the
    /// batch empty.
    async fn submit_batch(&self, batch: &mut Vec<IndexDocument>) {
        if batch.is_empty() {
            return;
        }

        if let Err(e) = self.index.add_documents(batch).await {
            warn!(
                error = %e,
                count = batch.len(),
                "Bulk add failed, retrying documents individually"
            );
            for document in batch.iter() {
                if let Err(single) = self.index.add_document(document).await {
                    error!(
                        db_id = %document.db_id,
                        name = ?document.name,
                        error = %single,
                        "Could not add document"
                    );
                }
            }
        } else {
            debug!(count = batch.len(), "Documents added to the search index");
        }

        batch.clear();
    }

    /// Reconcile the interaction dataset against the graph and index one
    /// document per external accession with at least one resolved partner.
    async fn index_interactors(&mut self) -> Result<u64, IndexerError> {
        info!("Fetching accessions from the interaction dataset");
        let mut accessions = self.interactions.all_accessions().await?;

        let species_list = self.graph.all_species().await?;
        self.taxonomy.seed(&species_list);

        // dataset-internal identifiers carry no accession to reconcile
        accessions.retain(|accession| !accession.starts_with("EBI-"));
        let accession_set: HashSet<String> = accessions.into_iter().collect();

        let outcome = reconcile(self.graph.as_ref(), &accession_set).await?;

        let interactions = self
            .interactions
            .interactions_for(&outcome.unresolved, ScoringMode::Static)
            .await?;
        info!(count = interactions.len(), "Preparing interactor documents");

        // the progress total is recomputed from the interaction count here;
        // the resulting jump in the bar is accepted behavior
        self.progress.set_total(interactions.len() as u64);

        let mut documents = Vec::new();
        let mut prepared: u64 = 0;
        for list in interactions.values() {
            let mut summaries: Vec<InteractorSummary> = Vec::new();
            for interaction in list {
                if let Some(summary) = outcome.summaries.get(&interaction.interactor_b.accession) {
                    summaries.push(InteractorSummary {
                        accession: interaction.interactor_b.accession.clone(),
                        summary: summary.clone(),
                        score: interaction.score,
                        evidence_ids: interaction.evidence_ids.clone(),
                    });
                }
            }

            if !summaries.is_empty() {
                let interactor = &list[0].interactor_a;
                let species = self.taxonomy.resolve(interactor.tax_id).await;
                documents.push(build_interactor_document(interactor, &summaries, &species));
            }

            prepared += 1;
            if prepared % 1000 == 0 {
                info!(prepared, "Preparing interactor documents");
            }
            if prepared % 100 == 0 {
                self.progress.update(prepared);
            }
        }

        let count = documents.len() as u64;
        self.submit_batch(&mut documents).await;
        self.progress.update(prepared);
        info!(count, "Interactors added to the search index");

        Ok(count)
    }
}
