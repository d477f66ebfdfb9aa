use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Map, Value};

use super::SearchGateway;
use super::error::GatewayError;

/// REST API version sent with every request
pub const DEFAULT_API_VERSION: &str = "2024-07-01";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Index names are limited to this many characters by the service
const MAX_INDEX_NAME_LEN: usize = 128;

/// Connection settings for [`AzureSearchClient`]
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Service endpoint, e.g. `https://my-service.search.windows.net`
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub timeout_secs: u64,
}

impl GatewayConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// REST client for the search service
#[derive(Debug, Clone)]
pub struct AzureSearchClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl AzureSearchClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let base_url = config.endpoint.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(GatewayError::Config("endpoint must not be empty".to_string()));
        }
        if config.api_key.is_empty() {
            return Err(GatewayError::Config("api key must not be empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| GatewayError::Config(format!("invalid api key: {}", e)))?;
        key.set_sensitive(true);
        headers.insert("api-key", key);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {}", e)))?;

        tracing::debug!(
            endpoint = %base_url,
            api_version = %config.api_version,
            "Search client initialized"
        );
        Ok(Self {
            client,
            base_url,
            api_version: config.api_version.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/indexes/{index}{suffix}?{extra&}api-version={version}`
    fn index_url(&self, index: &str, suffix: &str, extra_query: Option<&str>) -> String {
        let query = match extra_query {
            Some(extra) => format!("{}&api-version={}", extra, self.api_version),
            None => format!("api-version={}", self.api_version),
        };
        format!("{}/indexes/{}{}?{}", self.base_url, index, suffix, query)
    }

    /// Read a JSON body; an empty body reads as `null`
    async fn read_json(
        resp: reqwest::Response,
        method: &'static str,
        url: &str,
    ) -> Result<Value, GatewayError> {
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(GatewayError::status(method, url, status.as_u16(), body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Lowercase letters, digits and dashes; no leading or trailing dash
fn validate_index_name(index: &str) -> Result<(), GatewayError> {
    let valid = !index.is_empty()
        && index.len() <= MAX_INDEX_NAME_LEN
        && !index.starts_with('-')
        && !index.ends_with('-')
        && index
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if valid {
        Ok(())
    } else {
        Err(GatewayError::InvalidIndexName(index.to_string()))
    }
}

#[async_trait]
impl SearchGateway for AzureSearchClient {
    async fn upload_documents(
        &self,
        index: &str,
        documents: &[Value],
    ) -> Result<Value, GatewayError> {
        validate_index_name(index)?;
        let url = self.index_url(index, "/docs/index", None);
        tracing::debug!(index, count = documents.len(), "Uploading documents");

        let payload = serde_json::json!({ "value": documents });
        let resp = self.client.post(&url).json(&payload).send().await?;
        Self::read_json(resp, "POST", &url).await
    }

    async fn search(&self, index: &str, query: &Map<String, Value>) -> Result<Value, GatewayError> {
        validate_index_name(index)?;
        let url = self.index_url(index, "/docs/search", None);
        let filter = query.get("filter").and_then(Value::as_str).unwrap_or_default();
        tracing::debug!(index, filter = %filter, "Searching index");

        let resp = self.client.post(&url).json(query).send().await?;
        Self::read_json(resp, "POST", &url).await
    }

    async fn create_index(&self, index: &str, definition: &Value) -> Result<Value, GatewayError> {
        validate_index_name(index)?;
        let url = self.index_url(index, "", None);
        tracing::debug!(index, "Creating index");

        let resp = self.client.put(&url).json(definition).send().await?;
        Self::read_json(resp, "PUT", &url).await
    }

    async fn create_or_update_index(
        &self,
        index: &str,
        definition: &Value,
    ) -> Result<Value, GatewayError> {
        validate_index_name(index)?;
        let url = self.index_url(index, "", Some("allowIndexDowntime=false"));
        tracing::debug!(index, "Creating or updating index");

        let resp = self.client.put(&url).json(definition).send().await?;
        Self::read_json(resp, "PUT", &url).await
    }

    async fn delete_index(&self, index: &str) -> Result<bool, GatewayError> {
        validate_index_name(index)?;
        let url = self.index_url(index, "", None);
        let resp = self.client.delete(&url).send().await?;
        let status = resp.status();

        if status == reqwest::StatusCode::NO_CONTENT {
            tracing::debug!(index, "Index deleted");
            return Ok(true);
        }
        if status == reqwest::StatusCode::NOT_FOUND || status.is_success() {
            tracing::debug!(index, status = status.as_u16(), "Index not deleted");
            return Ok(false);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(GatewayError::status("DELETE", url, status.as_u16(), body))
    }

    fn name(&self) -> &'static str {
        "azure"
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn client_for(server: &MockServer) -> AzureSearchClient {
        let config = GatewayConfig::new(format!("{}/", server.base_url()), "secret-key");
        AzureSearchClient::new(&config).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_endpoint() {
        let config = GatewayConfig::new("  ", "key");
        assert!(matches!(
            AzureSearchClient::new(&config),
            Err(GatewayError::Config(_))
        ));
    }

    #[test]
    fn test_new_rejects_empty_key() {
        let config = GatewayConfig::new("https://svc.search.windows.net", "");
        assert!(matches!(
            AzureSearchClient::new(&config),
            Err(GatewayError::Config(_))
        ));
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let config = GatewayConfig::new("https://svc.search.windows.net///", "key");
        let client = AzureSearchClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://svc.search.windows.net");
        assert_eq!(
            client.index_url("products", "/docs/search", None),
            "https://svc.search.windows.net/indexes/products/docs/search?api-version=2024-07-01"
        );
        assert_eq!(
            client.index_url("products", "", Some("allowIndexDowntime=false")),
            "https://svc.search.windows.net/indexes/products?allowIndexDowntime=false&api-version=2024-07-01"
        );
    }

    #[test]
    fn test_validate_index_name() {
        assert!(validate_index_name("products").is_ok());
        assert!(validate_index_name("products-2024").is_ok());
        assert!(validate_index_name("").is_err());
        assert!(validate_index_name("Products").is_err());
        assert!(validate_index_name("-products").is_err());
        assert!(validate_index_name("../admin").is_err());
        assert!(validate_index_name(&"a".repeat(129)).is_err());
    }

    #[tokio::test]
    async fn test_upload_documents_posts_value_envelope() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/indexes/products/docs/index")
                    .query_param("api-version", "2024-07-01")
                    .header("api-key", "secret-key")
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "value": [{"@search.action": "mergeOrUpload", "id": 1}]
                    }));
                then.status(200)
                    .json_body(json!({"value": [{"key": "1", "status": true}]}));
            })
            .await;

        let client = client_for(&server);
        let result = client
            .upload_documents("products", &[json!({"@search.action": "mergeOrUpload", "id": 1})])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result["value"][0]["status"], true);
    }

    #[tokio::test]
    async fn test_search_posts_query_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/indexes/products/docs/search")
                    .query_param("api-version", "2024-07-01")
                    .json_body(json!({"search": "test", "top": 10, "filter": "age gt 18"}));
                then.status(200)
                    .json_body(json!({"value": [{"id": 1, "name": "Test"}]}));
            })
            .await;

        let mut query = Map::new();
        query.insert("search".to_string(), json!("test"));
        query.insert("top".to_string(), json!(10));
        query.insert("filter".to_string(), json!("age gt 18"));

        let result = client_for(&server).search("products", &query).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result["value"][0]["name"], "Test");
    }

    #[tokio::test]
    async fn test_search_error_status_is_surfaced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/indexes/products/docs/search");
                then.status(400).body("Invalid expression");
            })
            .await;

        let err = client_for(&server)
            .search("products", &Map::new())
            .await
            .unwrap_err();

        match err {
            GatewayError::Status { status, body, .. } => {
                assert_eq!(status, 400);
                assert_eq!(body, "Invalid expression");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_index_puts_definition() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/indexes/products")
                    .query_param("api-version", "2024-07-01")
                    .json_body(json!({"name": "products", "fields": []}));
                then.status(201).json_body(json!({"name": "products"}));
            })
            .await;

        let result = client_for(&server)
            .create_index("products", &json!({"name": "products", "fields": []}))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result["name"], "products");
    }

    #[tokio::test]
    async fn test_create_or_update_index_disallows_downtime() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/indexes/products")
                    .query_param("allowIndexDowntime", "false")
                    .query_param("api-version", "2024-07-01");
                then.status(204);
            })
            .await;

        let result = client_for(&server)
            .create_or_update_index("products", &json!({"name": "products"}))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result, Value::Null);
    }

    #[tokio::test]
    async fn test_delete_index_reports_no_content_as_success() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(DELETE)
                    .path("/indexes/products")
                    .query_param("api-version", "2024-07-01");
                then.status(204);
            })
            .await;

        assert!(client_for(&server).delete_index("products").await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_missing_index_is_not_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/indexes/products");
                then.status(404);
            })
            .await;

        assert!(!client_for(&server).delete_index("products").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_index_name_never_hits_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200);
            })
            .await;

        let err = client_for(&server).delete_index("Bad/Name").await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidIndexName(_)));
        mock.assert_calls_async(0).await;
    }
}
