//! Search service gateway
//!
//! HTTP transport to the search service. The engine talks to the service only
//! through [`SearchGateway`], so tests can substitute a recording fake.

mod client;
mod error;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use client::{AzureSearchClient, DEFAULT_API_VERSION, DEFAULT_TIMEOUT_SECS, GatewayConfig};
pub use error::GatewayError;

#[async_trait]
pub trait SearchGateway: Send + Sync + std::fmt::Debug {
    /// Index a batch of documents; each carries its own `@search.action`
    async fn upload_documents(&self, index: &str, documents: &[Value])
    -> Result<Value, GatewayError>;

    /// Run a search request; `query` is the request body
    async fn search(&self, index: &str, query: &Map<String, Value>) -> Result<Value, GatewayError>;

    /// Create an index from a full definition
    async fn create_index(&self, index: &str, definition: &Value) -> Result<Value, GatewayError>;

    /// Create an index or update its definition without downtime
    async fn create_or_update_index(
        &self,
        index: &str,
        definition: &Value,
    ) -> Result<Value, GatewayError>;

    /// Delete an index; `true` when the service confirmed the deletion
    async fn delete_index(&self, index: &str) -> Result<bool, GatewayError>;

    /// Human-readable gateway name
    fn name(&self) -> &'static str;
}
