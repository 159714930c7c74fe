//! Backing store
//!
//! The discovery layer treats the document index as a black box with
//! four capabilities:
//!
//! - bulk upsert by document id, with a routing key per document
//! - boolean queries over term / wildcard / regexp clauses
//! - a result-size cap per search
//! - index-name addressing chosen per call
//!
//! ## Implementations
//!
//! - [`ElasticClient`]: Elasticsearch over HTTP
//! - [`MemoryBackend`]: in-process store with the same matching rules,
//!   used for tests and local runs
//!
//! Newly written documents follow the store's own visibility rules.
//! Elasticsearch only exposes them to search after its refresh interval
//! unless the write asked for a refresh.

mod elastic;
mod memory;

pub use elastic::{ElasticClient, ElasticConfig};
pub use memory::MemoryBackend;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::query::QueryFragment;

/// Document store used by the index writer and reader
#[async_trait]
pub trait DiscoveryBackend: Send + Sync {
    /// Upsert every operation in a single request
    async fn bulk(
        &self,
        ops: Vec<IndexOperation>,
        refresh: RefreshPolicy,
    ) -> Result<BulkSummary, BackendError>;

    /// Run one query against one index (or alias)
    async fn search(&self, request: SearchRequest) -> Result<SearchHits, BackendError>;

    /// Check the store is reachable
    async fn ping(&self) -> Result<(), BackendError>;
}

/// One upsert inside a bulk request
#[derive(Debug, Clone, PartialEq)]
pub struct IndexOperation {
    pub index: String,
    pub id: String,
    pub routing: String,
    pub source: Map<String, Value>,
}

/// Outcome of a bulk request that reached the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSummary {
    /// Operations submitted
    pub total: usize,
    /// Operations the store rejected
    pub failed: usize,
    /// Reason given for the first rejected operation
    pub first_error: Option<String>,
    /// Every rejection was a throttle or server-side error (429 / 5xx),
    /// so resubmitting may succeed
    pub transient: bool,
}

/// A single search call
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub index: String,
    /// Partition key; only documents written with this key are searched
    pub routing: Option<String>,
    pub query: QueryFragment,
    /// Maximum number of hits returned
    pub size: usize,
}

/// A matching document
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub index: String,
    pub id: String,
    pub source: Map<String, Value>,
}

/// Search response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    pub hits: Vec<Hit>,
    /// Total matches as reported by the store, if it reports one
    pub total: Option<u64>,
}

impl SearchHits {
    /// True if the store matched more documents than it returned
    pub fn is_truncated(&self) -> bool {
        self.total
            .map(|total| total > self.hits.len() as u64)
            .unwrap_or(false)
    }
}

/// When a bulk write becomes visible to search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Store's normal refresh interval
    #[default]
    None,
    /// Block until the next refresh makes the writes visible
    WaitFor,
    /// Force a refresh right after the write
    Immediate,
}

impl RefreshPolicy {
    /// Value of the `refresh` request parameter, if any
    pub fn as_param(&self) -> Option<&'static str> {
        match self {
            RefreshPolicy::None => None,
            RefreshPolicy::WaitFor => Some("wait_for"),
            RefreshPolicy::Immediate => Some("true"),
        }
    }
}

/// Errors talking to the backing store
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl BackendError {
    /// Failures that may go away if the same request is sent again
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Unavailable(_) | BackendError::Timeout | BackendError::Request(_) => {
                true
            }
            BackendError::Api { status, .. } => *status == 429 || *status >= 500,
            BackendError::BadRequest(_) | BackendError::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_param() {
        assert_eq!(RefreshPolicy::None.as_param(), None);
        assert_eq!(RefreshPolicy::WaitFor.as_param(), Some("wait_for"));
        assert_eq!(RefreshPolicy::Immediate.as_param(), Some("true"));
    }

    #[test]
    fn test_transient_errors() {
        assert!(BackendError::Timeout.is_transient());
        assert!(BackendError::Unavailable("down".into()).is_transient());
        assert!(BackendError::Api {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!BackendError::Api {
            status: 400,
            message: String::new()
        }
        .is_transient());
        assert!(!BackendError::Decode("bad".into()).is_transient());
    }

    #[test]
    fn test_truncation() {
        let hits = SearchHits {
            hits: Vec::new(),
            total: Some(3),
        };
        assert!(hits.is_truncated());
        assert!(!SearchHits::default().is_truncated());
    }
}
