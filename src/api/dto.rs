//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::discovery::{Annotations, SearchResult, SearchResults};

// ============================================
// INGEST DTOs
// ============================================

/// One metric in an ingest request
#[derive(Debug, Deserialize)]
pub struct MetricDiscoveryRequest {
    pub tenant_id: String,
    /// Absent names are rejected before anything is written
    #[serde(default)]
    pub metric_name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, rename = "type")]
    pub data_type: Option<String>,
    /// Extra annotations stored next to `unit` and `type`
    #[serde(default)]
    pub annotations: Option<Annotations>,
}

/// Batch ingest request
#[derive(Debug, Deserialize)]
pub struct DiscoveryIngestRequest {
    pub metrics: Vec<MetricDiscoveryRequest>,
}

/// Batch ingest response
#[derive(Debug, Serialize, Deserialize)]
pub struct DiscoveryIngestResponse {
    /// Number of documents written
    pub indexed: usize,
}

// ============================================
// SEARCH DTOs
// ============================================

/// Query string of `GET /api/v1/search`
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub tenant: String,
    pub query: String,
}

/// Body of `POST /api/v1/search`
#[derive(Debug, Deserialize)]
pub struct BatchSearchRequest {
    pub tenant: String,
    pub queries: Vec<String>,
}

/// Query string of `GET /api/v1/search/next-level`
#[derive(Debug, Deserialize)]
pub struct NextLevelParams {
    pub tenant: String,
    pub prefix: String,
}

/// Search response
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub count: usize,
    /// More metrics matched than the result cap let through
    pub truncated: bool,
    pub results: Vec<SearchResult>,
}

impl From<SearchResults> for SearchResponse {
    fn from(results: SearchResults) -> Self {
        Self {
            count: results.len(),
            truncated: results.is_truncated(),
            results: results.into_vec(),
        }
    }
}

// ============================================
// ADMIN DTOs
// ============================================

/// Active and configured index names
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexTargetsResponse {
    pub read_index: String,
    pub write_index: String,
    pub default_read_index: String,
    pub default_write_index: String,
}

/// Body of `PUT /api/v1/admin/indices/{read,write}`
#[derive(Debug, Deserialize)]
pub struct SetIndexRequest {
    pub name: String,
}

/// Result of a cutover
#[derive(Debug, Serialize, Deserialize)]
pub struct SetIndexResponse {
    pub previous: String,
    pub current: String,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Readiness details
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    /// "ok" or the backend error
    pub backend: String,
    pub uptime_seconds: u64,
    pub version: String,
}
