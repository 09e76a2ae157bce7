//! Run-scoped taxonomy cache with a lineage-service fallback.
//!
//! The cache is seeded from the graph's species list at the start of the
//! interactor phase. Unknown organism ids are resolved through the external
//! lineage service: the parent id is looked up and, when the parent is
//! already cached, the child is cached under the parent's name. A throttled
//! request is retried once after a fixed backoff; any other failure degrades
//! to the sentinel species value without caching it, so later lookups of
//! other ids still get a fresh attempt.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::document::NO_SPECIES;
use crate::graph::model::SpeciesRef;

/// Fixed wait after a throttled lineage request.
const THROTTLE_BACKOFF: Duration = Duration::from_secs(50);

/// Organism ids that never resolve to a species.
const UNRESOLVABLE_TAX_IDS: [i32; 3] = [0, 1, -1];

/// Errors from the lineage service.
#[derive(Debug, Error)]
pub enum LineageError {
    /// The service rate-limited the request.
    #[error("lineage service throttled the request")]
    Throttled,

    /// Any other failure (transport, unknown id, malformed body).
    #[error("lineage lookup failed: {0}")]
    Failed(String),
}

/// Lookup of an organism's parent in the taxonomy tree.
#[async_trait]
pub trait LineageClient: Send + Sync {
    async fn parent_tax_id(&self, tax_id: i32) -> Result<i32, LineageError>;
}

#[derive(Debug, Deserialize)]
struct LineageResponse {
    parent: LineageParent,
}

#[derive(Debug, Deserialize)]
struct LineageParent {
    id: i32,
}

/// HTTP client for the taxonomy lineage REST service.
pub struct RestLineageClient {
    base_url: String,
    client: reqwest::Client,
}

impl RestLineageClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LineageClient for RestLineageClient {
    async fn parent_tax_id(&self, tax_id: i32) -> Result<i32, LineageError> {
        let url = format!("{}/taxonomy/id/{}", self.base_url, tax_id);
        let response = self
            .client
            .get(&url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| LineageError::Failed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LineageError::Throttled);
        }
        if !response.status().is_success() {
            return Err(LineageError::Failed(format!(
                "status {} for taxonomy id {}",
                response.status(),
                tax_id
            )));
        }

        let body: LineageResponse = response
            .json()
            .await
            .map_err(|e| LineageError::Failed(e.to_string()))?;
        Ok(body.parent.id)
    }
}

/// Organism-id to display-name cache, owned by the pipeline run.
pub struct TaxonomyCache {
    entries: HashMap<i32, String>,
    lineage: Arc<dyn LineageClient>,
    backoff: Duration,
}

impl TaxonomyCache {
    pub fn new(lineage: Arc<dyn LineageClient>) -> Self {
        Self {
            entries: HashMap::new(),
            lineage,
            backoff: THROTTLE_BACKOFF,
        }
    }

    /// Seed the cache from the graph's species list.
    pub fn seed(&mut self, species: &[SpeciesRef]) {
        for entry in species {
            match entry.tax_id.parse::<i32>() {
                Ok(tax_id) => {
                    self.entries.insert(tax_id, entry.display_name.clone());
                }
                Err(_) => {
                    warn!(tax_id = %entry.tax_id, "Species has a non-numeric taxonomy id");
                }
            }
        }
        info!(entries = self.entries.len(), "Taxonomy cache seeded");
    }

    /// Resolve an organism id to a display name, falling back to the
    /// lineage service and, ultimately, to the sentinel species value.
    pub async fn resolve(&mut self, tax_id: i32) -> String {
        if UNRESOLVABLE_TAX_IDS.contains(&tax_id) {
            return NO_SPECIES.to_string();
        }
        if let Some(name) = self.entries.get(&tax_id) {
            return name.clone();
        }
        self.resolve_via_lineage(tax_id).await
    }

    async fn resolve_via_lineage(&mut self, tax_id: i32) -> String {
        let mut throttled_once = false;
        loop {
            match self.lineage.parent_tax_id(tax_id).await {
                Ok(parent_id) => {
                    if let Some(name) = self.entries.get(&parent_id).cloned() {
                        self.entries.insert(tax_id, name.clone());
                        return name;
                    }
                    // the sentinel is never cached, so a later id with a
                    // known parent still resolves
                    return NO_SPECIES.to_string();
                }
                Err(LineageError::Throttled) if !throttled_once => {
                    warn!(
                        tax_id,
                        backoff_secs = self.backoff.as_secs(),
                        "Lineage service throttled, backing off"
                    );
                    sleep(self.backoff).await;
                    throttled_once = true;
                }
                Err(e) => {
                    info!(tax_id, error = %e, "Taxonomy id could not be resolved");
                    return NO_SPECIES.to_string();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockLineage {
        responses: Mutex<Vec<Result<i32, LineageError>>>,
        calls: AtomicUsize,
    }

    impl MockLineage {
        fn new(responses: Vec<Result<i32, LineageError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LineageClient for MockLineage {
        async fn parent_tax_id(&self, _tax_id: i32) -> Result<i32, LineageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn species(tax_id: &str, name: &str) -> SpeciesRef {
        SpeciesRef {
            tax_id: tax_id.to_string(),
            display_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn sentinel_ids_never_hit_the_service() {
        let lineage = Arc::new(MockLineage::new(vec![]));
        let mut cache = TaxonomyCache::new(lineage.clone());

        for tax_id in [0, 1, -1] {
            assert_eq!(cache.resolve(tax_id).await, NO_SPECIES);
        }
        assert_eq!(lineage.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn seeded_id_resolves_without_lookup() {
        let lineage = Arc::new(MockLineage::new(vec![]));
        let mut cache = TaxonomyCache::new(lineage.clone());
        cache.seed(&[species("9606", "Homo sapiens")]);

        assert_eq!(cache.resolve(9606).await, "Homo sapiens");
        assert_eq!(lineage.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn child_cached_under_known_parent() {
        let lineage = Arc::new(MockLineage::new(vec![Ok(9606)]));
        let mut cache = TaxonomyCache::new(lineage.clone());
        cache.seed(&[species("9606", "Homo sapiens")]);

        assert_eq!(cache.resolve(63221).await, "Homo sapiens");
        assert_eq!(lineage.calls.load(Ordering::SeqCst), 1);

        // second resolution of the same id comes from the cache
        assert_eq!(cache.resolve(63221).await, "Homo sapiens");
        assert_eq!(lineage.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_parent_degrades_to_sentinel_without_caching() {
        let lineage = Arc::new(MockLineage::new(vec![Ok(12345), Ok(9606)]));
        let mut cache = TaxonomyCache::new(lineage.clone());
        cache.seed(&[species("9606", "Homo sapiens")]);

        assert_eq!(cache.resolve(777).await, NO_SPECIES);
        // the sentinel was not cached: the next resolve tries again
        assert_eq!(cache.resolve(777).await, "Homo sapiens");
        assert_eq!(lineage.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_retried_exactly_once() {
        let lineage = Arc::new(MockLineage::new(vec![Err(LineageError::Throttled), Ok(9606)]));
        let mut cache = TaxonomyCache::new(lineage.clone());
        cache.seed(&[species("9606", "Homo sapiens")]);

        assert_eq!(cache.resolve(63221).await, "Homo sapiens");
        assert_eq!(lineage.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn second_throttle_degrades_to_sentinel() {
        let lineage = Arc::new(MockLineage::new(vec![
            Err(LineageError::Throttled),
            Err(LineageError::Throttled),
        ]));
        let mut cache = TaxonomyCache::new(lineage.clone());

        assert_eq!(cache.resolve(63221).await, NO_SPECIES);
        assert_eq!(lineage.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn other_failures_degrade_without_retry() {
        let lineage = Arc::new(MockLineage::new(vec![Err(LineageError::Failed(
            "status 404".to_string(),
        ))]));
        let mut cache = TaxonomyCache::new(lineage.clone());

        assert_eq!(cache.resolve(63221).await, NO_SPECIES);
        assert_eq!(lineage.calls.load(Ordering::SeqCst), 1);
    }
}
