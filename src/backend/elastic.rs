//! Elasticsearch REST client
//!
//! Implements [`DiscoveryBackend`] over the `_bulk` and `_search` APIs.

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::time::Duration;

use crate::backend::{
    BackendError, BulkSummary, DiscoveryBackend, Hit, IndexOperation, RefreshPolicy,
    SearchHits, SearchRequest,
};

/// Elasticsearch REST client
pub struct ElasticClient {
    client: Client,
    config: ElasticConfig,
}

/// Connection settings for [`ElasticClient`]
#[derive(Debug, Clone)]
pub struct ElasticConfig {
    /// Base URL (e.g., "http://localhost:9200")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Basic auth user
    pub username: Option<String>,
    /// Basic auth password
    pub password: Option<String>,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9200".to_string(),
            request_timeout_ms: 5000,
            username: None,
            password: None,
        }
    }
}

impl ElasticClient {
    /// Create a client. One client is shared by every writer and reader.
    pub fn new(config: ElasticConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &ElasticConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Attach credentials, send, and classify failures
    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let request = match &self.config.username {
            Some(user) => request.basic_auth(user, self.config.password.as_ref()),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout
            } else if e.is_connect() {
                BackendError::Unavailable(e.to_string())
            } else {
                BackendError::Request(e)
            }
        })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(BackendError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }
}

#[async_trait]
impl DiscoveryBackend for ElasticClient {
    async fn bulk(
        &self,
        ops: Vec<IndexOperation>,
        refresh: RefreshPolicy,
    ) -> Result<BulkSummary, BackendError> {
        if ops.is_empty() {
            return Ok(BulkSummary::default());
        }

        let body = bulk_body(&ops);
        let mut request = self
            .client
            .post(self.url("_bulk"))
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body);
        if let Some(refresh) = refresh.as_param() {
            request = request.query(&[("refresh", refresh)]);
        }

        tracing::debug!(operations = ops.len(), "Submitting bulk request");

        let response = self.send(request).await?;
        let parsed: BulkResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(format!("bulk response: {}", e)))?;

        Ok(parsed.summarize(ops.len()))
    }

    async fn search(&self, request: SearchRequest) -> Result<SearchHits, BackendError> {
        let path = format!("{}/_search", urlencoding::encode(&request.index));
        let body = json!({
            "size": request.size,
            "query": request.query.to_json(),
        });

        tracing::debug!(index = %request.index, query = %body, "Searching");

        let mut builder = self.client.post(self.url(&path)).json(&body);
        if let Some(routing) = &request.routing {
            builder = builder.query(&[("routing", routing)]);
        }

        let response = self.send(builder).await?;
        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(format!("search response: {}", e)))?;

        Ok(SearchHits {
            total: parsed.hits.total.map(|t| t.value()),
            hits: parsed
                .hits
                .hits
                .into_iter()
                .map(|h| Hit {
                    index: h.index,
                    id: h.id,
                    source: h.source,
                })
                .collect(),
        })
    }

    async fn ping(&self) -> Result<(), BackendError> {
        self.send(self.client.get(self.url(""))).await.map(|_| ())
    }
}

/// NDJSON body: one action line and one source line per document
fn bulk_body(ops: &[IndexOperation]) -> String {
    let mut body = String::new();
    for op in ops {
        let action = json!({
            "index": { "_index": op.index, "_id": op.id, "routing": op.routing }
        });
        body.push_str(&action.to_string());
        body.push('\n');
        body.push_str(&Value::Object(op.source.clone()).to_string());
        body.push('\n');
    }
    body
}

// ============================================
// Response DTOs
// ============================================

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    #[serde(default)]
    status: u16,
    error: Option<Value>,
}

impl BulkResponse {
    fn summarize(self, total: usize) -> BulkSummary {
        if !self.errors {
            return BulkSummary {
                total,
                ..Default::default()
            };
        }

        let failures: Vec<BulkItem> = self
            .items
            .into_iter()
            .flat_map(|item| item.into_values())
            .filter(|item| item.error.is_some() || item.status >= 300)
            .collect();

        BulkSummary {
            total,
            failed: failures.len(),
            transient: !failures.is_empty()
                && failures
                    .iter()
                    .all(|item| item.status == 429 || item.status >= 500),
            first_error: failures
                .first()
                .and_then(|item| item.error.as_ref())
                .map(|error| match error.get("reason").and_then(Value::as_str) {
                    Some(reason) => reason.to_string(),
                    None => error.to_string(),
                }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    total: Option<TotalHits>,
    #[serde(default)]
    hits: Vec<RawHit>,
}

/// `hits.total` is a number before 7.0 and an object after
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Count(u64),
    Object { value: u64 },
}

impl TotalHits {
    fn value(&self) -> u64 {
        match self {
            TotalHits::Count(n) => *n,
            TotalHits::Object { value } => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_index", default)]
    index: String,
    #[serde(rename = "_id", default)]
    id: String,
    #[serde(rename = "_source", default)]
    source: Map<String, Value>,
}
