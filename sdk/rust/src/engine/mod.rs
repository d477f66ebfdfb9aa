//! Search engine
//!
//! Keeps the search index in step with application records and turns
//! [`SearchBuilder`] queries into search service requests.

mod builder;
mod config;
mod error;
mod searchable;

use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::filters::FilterCompiler;
use crate::gateway::SearchGateway;

pub use builder::{OrderClause, SearchBuilder, SortDirection};
pub use config::{
    DEFAULT_SOFT_DELETE_COLUMN, DEFAULT_SOFT_DELETE_MARKER, EngineConfig, SoftDeleteConfig,
};
pub use error::EngineError;
pub use searchable::{DEFAULT_KEY_NAME, Searchable};

/// Document field carrying the indexing action
const SEARCH_ACTION: &str = "@search.action";

const ACTION_MERGE_OR_UPLOAD: &str = "mergeOrUpload";
const ACTION_DELETE: &str = "delete";

/// Response field holding the total match count
const ODATA_COUNT: &str = "@odata.count";

const SOFT_DELETE_POLICY_TYPE: &str =
    "#Microsoft.Azure.Search.SoftDeleteColumnDeletionDetectionPolicy";

#[derive(Debug, Clone)]
pub struct SearchEngine {
    gateway: Arc<dyn SearchGateway>,
    compiler: FilterCompiler,
    config: EngineConfig,
}

impl SearchEngine {
    pub fn new(gateway: Arc<dyn SearchGateway>, config: EngineConfig) -> Self {
        tracing::debug!(
            gateway = gateway.name(),
            strict = config.compiler.strict,
            soft_delete = config.soft_delete.enabled,
            "Search engine initialized"
        );
        Self {
            gateway,
            compiler: FilterCompiler::new(config.compiler),
            config,
        }
    }

    /// Merge-or-upload the searchable documents of `models`
    ///
    /// Records with an empty searchable document are skipped. Returns the
    /// service response, or `None` when nothing was sent.
    pub async fn update<M: Searchable>(&self, models: &[M]) -> Result<Option<Value>, EngineError> {
        let Some(first) = models.first() else {
            return Ok(None);
        };
        let index = first.searchable_as();

        let documents: Vec<Value> = models
            .iter()
            .filter_map(|model| {
                let mut document = model.to_searchable_document();
                if document.is_empty() {
                    return None;
                }
                document.insert(SEARCH_ACTION.to_string(), json!(ACTION_MERGE_OR_UPLOAD));
                document.insert(model.key_name().to_string(), model.key());
                Some(Value::Object(document))
            })
            .collect();

        if documents.is_empty() {
            tracing::debug!(index = %index, "No searchable documents to upload");
            return Ok(None);
        }

        tracing::debug!(index = %index, count = documents.len(), "Syncing documents");
        let response = self.gateway.upload_documents(&index, &documents).await?;
        Ok(Some(response))
    }

    /// Remove the documents of `models` from their index
    pub async fn delete<M: Searchable>(&self, models: &[M]) -> Result<Option<Value>, EngineError> {
        let Some(first) = models.first() else {
            return Ok(None);
        };
        let index = first.searchable_as();

        let documents: Vec<Value> = models
            .iter()
            .map(|model| {
                let mut document = Map::new();
                document.insert(SEARCH_ACTION.to_string(), json!(ACTION_DELETE));
                document.insert(model.key_name().to_string(), model.key());
                Value::Object(document)
            })
            .collect();

        tracing::debug!(index = %index, count = documents.len(), "Deleting documents");
        let response = self.gateway.upload_documents(&index, &documents).await?;
        Ok(Some(response))
    }

    /// Run a search with the builder's limit
    pub async fn search(&self, builder: &SearchBuilder) -> Result<Value, EngineError> {
        let mut body = Map::new();
        if let Some(limit) = builder.limit {
            body.insert("top".to_string(), json!(limit));
        }
        self.execute(builder, body).await
    }

    /// Run a search for one page of results; pages start at 1
    pub async fn paginate(
        &self,
        builder: &SearchBuilder,
        per_page: usize,
        page: usize,
    ) -> Result<Value, EngineError> {
        let page = page.max(1);
        let mut body = Map::new();
        body.insert("top".to_string(), json!(per_page));
        body.insert("skip".to_string(), json!(per_page.saturating_mul(page - 1)));
        self.execute(builder, body).await
    }

    /// Assemble the request body for a builder
    ///
    /// `paging` carries `top`/`skip`. Builder options come first and are
    /// overridden by any field the builder sets itself.
    pub fn build_query(
        &self,
        builder: &SearchBuilder,
        paging: Map<String, Value>,
    ) -> Result<Map<String, Value>, EngineError> {
        let mut query = builder.options.clone();
        query.insert("search".to_string(), json!(builder.query));
        query.extend(paging);

        if !builder.wheres.is_empty() {
            let filter = self.compiler.compile(&builder.wheres)?;
            if !filter.is_empty() {
                query.insert("filter".to_string(), json!(filter));
            }
        }

        if let Some(orderby) = builder.order_by_clause() {
            query.insert("orderby".to_string(), json!(orderby));
        }

        Ok(query)
    }

    async fn execute(
        &self,
        builder: &SearchBuilder,
        paging: Map<String, Value>,
    ) -> Result<Value, EngineError> {
        let query = self.build_query(builder, paging)?;
        Ok(self.gateway.search(&builder.index, &query).await?)
    }

    /// Drop an index and recreate it from configured settings
    pub async fn flush(&self, index: &str) -> Result<Option<Value>, EngineError> {
        let deleted = self.gateway.delete_index(index).await?;
        tracing::debug!(index, deleted, "Flushed index");
        self.create_index(index).await
    }

    /// Create an index from its configured settings
    ///
    /// Returns `None` when no settings are configured for `name`.
    pub async fn create_index(&self, name: &str) -> Result<Option<Value>, EngineError> {
        let Some(settings) = self.config.index_settings.get(name) else {
            tracing::debug!(index = name, "No index settings configured");
            return Ok(None);
        };

        let settings = if self.config.soft_delete.enabled {
            self.configure_soft_delete_policy(settings.clone())
        } else {
            settings.clone()
        };

        self.update_index_settings(name, &settings).await.map(Some)
    }

    pub async fn delete_index(&self, name: &str) -> Result<bool, EngineError> {
        Ok(self.gateway.delete_index(name).await?)
    }

    /// Push an index definition to the service
    pub async fn update_index_settings(
        &self,
        name: &str,
        settings: &Value,
    ) -> Result<Value, EngineError> {
        let empty = match settings {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        };
        if empty {
            return Err(EngineError::MissingSettings(name.to_string()));
        }

        Ok(self.gateway.create_or_update_index(name, settings).await?)
    }

    /// Add the soft-delete detection policy to index settings
    pub fn configure_soft_delete_policy(&self, mut settings: Value) -> Value {
        let policy = json!({
            "@odata.type": SOFT_DELETE_POLICY_TYPE,
            "softDeleteColumnName": self.config.soft_delete.column,
            "softDeleteMarkerValue": self.config.soft_delete.marker,
        });

        match settings.as_object_mut() {
            Some(map) => {
                map.insert("dataDeletionDetectionPolicy".to_string(), policy);
                settings
            }
            None => json!({ "dataDeletionDetectionPolicy": policy }),
        }
    }
}

/// Keys of the documents in a search response
pub fn map_ids(results: &Value, key_name: &str) -> Vec<Value> {
    results
        .get("value")
        .and_then(Value::as_array)
        .map(|docs| {
            docs.iter()
                .filter_map(|doc| doc.get(key_name).cloned())
                .collect()
        })
        .unwrap_or_default()
}

/// Total match count reported by the service, 0 when absent
pub fn total_count(results: &Value) -> u64 {
    results
        .get(ODATA_COUNT)
        .and_then(Value::as_u64)
        .unwrap_or(0)
}
