//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::{
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts, IndicesPutAliasParts, IndicesRefreshParts},
    BulkParts, DeleteByQueryParts, IndexParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::{get_index_settings, IndexConfig};
use pathway_search_shared::IndexDocument;

/// OpenSearch provider implementation.
///
/// Documents are indexed under their `db_id`, which is unique across entity
/// kinds in the graph and across interactor accessions.
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    pub fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            alias = %index_config.alias,
            version = index_config.version,
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Build the interleaved action/document body for a bulk request.
    fn build_bulk_body(
        documents: &[IndexDocument],
    ) -> Result<Vec<JsonBody<Value>>, SearchIndexError> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);
        for document in documents {
            body.push(json!({ "index": { "_id": document.db_id } }).into());
            let value = serde_json::to_value(document)
                .map_err(|e| SearchIndexError::serialization(e.to_string()))?;
            body.push(value.into());
        }
        Ok(body)
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        let index_name = self.index_config.versioned_name();

        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[&index_name]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if exists.status_code().is_success() {
            debug!(index = %index_name, "Search index already exists");
            return Ok(());
        }

        info!(index = %index_name, "Creating search index");
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&index_name))
            .body(get_index_settings())
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        if !response.status_code().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchIndexError::index_creation(format!(
                "Index creation failed: {}",
                body
            )));
        }

        let alias_response = self
            .client
            .indices()
            .put_alias(IndicesPutAliasParts::IndexName(
                &[&index_name],
                &self.index_config.alias,
            ))
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        if !alias_response.status_code().is_success() {
            let body = alias_response.text().await.unwrap_or_default();
            return Err(SearchIndexError::index_creation(format!(
                "Alias creation failed: {}",
                body
            )));
        }

        Ok(())
    }

    async fn clear_index(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .delete_by_query(DeleteByQueryParts::Index(&[&self.index_config.alias]))
            .body(json!({ "query": { "match_all": {} } }))
            .send()
            .await
            .map_err(|e| SearchIndexError::clear(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Clear request failed");
            return Err(SearchIndexError::clear(format!(
                "Clear failed with status {}: {}",
                status, body
            )));
        }

        debug!("Search index cleared");
        Ok(())
    }

    async fn add_documents(&self, documents: &[IndexDocument]) -> Result<(), SearchIndexError> {
        if documents.is_empty() {
            return Ok(());
        }

        let body = Self::build_bulk_body(documents)?;
        let response = self
            .client
            .bulk(BulkParts::Index(&self.index_config.alias))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::bulk_index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchIndexError::bulk_index(format!(
                "Bulk add failed with status {}: {}",
                status, body
            )));
        }

        // The bulk endpoint returns 200 even when individual items were
        // rejected; the `errors` flag covers those.
        let json: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::bulk_index(e.to_string()))?;
        if json["errors"].as_bool().unwrap_or(false) {
            return Err(SearchIndexError::bulk_index(
                "Bulk add reported item-level errors".to_string(),
            ));
        }

        debug!(count = documents.len(), "Documents added to the search index");
        Ok(())
    }

    async fn add_document(&self, document: &IndexDocument) -> Result<(), SearchIndexError> {
        let value = serde_json::to_value(document)
            .map_err(|e| SearchIndexError::serialization(e.to_string()))?;

        let response = self
            .client
            .index(IndexParts::IndexId(
                &self.index_config.alias,
                &document.db_id,
            ))
            .body(value)
            .send()
            .await
            .map_err(|e| SearchIndexError::index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchIndexError::index(format!(
                "Add failed with status {}: {}",
                status, body
            )));
        }

        debug!(db_id = %document.db_id, "Document added to the search index");
        Ok(())
    }

    async fn commit(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[&self.index_config.alias]))
            .send()
            .await
            .map_err(|e| SearchIndexError::commit(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Commit request failed");
            return Err(SearchIndexError::commit(format!(
                "Commit failed with status {}: {}",
                status, body
            )));
        }

        debug!("Search index committed");
        Ok(())
    }

    async fn close(&self) -> Result<(), SearchIndexError> {
        // The OpenSearch client holds no long-lived connection state of its
        // own; dropping the provider releases the transport.
        info!("OpenSearch provider shutdown");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_body_pairs_action_and_document() {
        let documents = vec![
            IndexDocument::new("1", "Pathway", "Pathway"),
            IndexDocument::new("2", "Reaction", "Reaction"),
        ];

        let body = OpenSearchProvider::build_bulk_body(&documents).unwrap();

        // one action line plus one document line per input document
        assert_eq!(body.len(), 4);
    }

    #[test]
    fn bulk_body_empty_input() {
        let body = OpenSearchProvider::build_bulk_body(&[]).unwrap();
        assert!(body.is_empty());
    }
}
