//! Discovery facade
//!
//! [`MetricDiscovery`] wires one backend, one set of index targets, a
//! writer and a reader together and applies an optional per-call
//! deadline. [`DiscoveryIo`] is the ingest/query seam the REST layer
//! and the CLI program against.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{DiscoveryBackend, ElasticClient, MemoryBackend, RefreshPolicy};
use crate::config::Config;
use crate::discovery::error::{DiscoveryError, DiscoveryResult};
use crate::discovery::reader::IndexReader;
use crate::discovery::retry::RetryPolicy;
use crate::discovery::targets::IndexTargets;
use crate::discovery::types::{DiscoveryDocument, SearchResults};
use crate::discovery::writer::IndexWriter;

/// Ingest and query interface
#[async_trait]
pub trait DiscoveryIo: Send + Sync {
    /// Index a batch of documents, returning how many were written
    async fn insert_discovery(&self, documents: Vec<DiscoveryDocument>) -> DiscoveryResult<usize>;

    /// Metrics of `tenant_id` matching one glob pattern
    async fn search(&self, tenant_id: &str, pattern: &str) -> DiscoveryResult<SearchResults>;

    /// De-duplicated union over several glob patterns
    async fn search_batch(
        &self,
        tenant_id: &str,
        patterns: &[String],
    ) -> DiscoveryResult<SearchResults>;
}

/// Metric discovery over a document store
pub struct MetricDiscovery {
    backend: Arc<dyn DiscoveryBackend>,
    targets: Arc<IndexTargets>,
    writer: IndexWriter,
    reader: IndexReader,
    deadline: Option<Duration>,
}

impl MetricDiscovery {
    /// Build over `backend`, sharing `targets` between writer and reader
    pub fn new(backend: Arc<dyn DiscoveryBackend>, targets: Arc<IndexTargets>) -> Self {
        Self {
            writer: IndexWriter::new(backend.clone(), targets.clone()),
            reader: IndexReader::new(backend.clone(), targets.clone()),
            backend,
            targets,
            deadline: None,
        }
    }

    /// Elasticsearch-backed instance from static configuration
    pub fn from_config(config: &Config) -> DiscoveryResult<Self> {
        let es = &config.elasticsearch;
        let client = ElasticClient::new(es.client_config())?;
        Self::with_backend_from_config(Arc::new(client), config)
    }

    /// In-process instance laid out like a cluster: the configured read
    /// name is an alias over the configured write index
    pub fn in_memory(config: &Config) -> DiscoveryResult<Self> {
        let es = &config.elasticsearch;
        let backend = MemoryBackend::with_read_alias(&es.read_index, &es.write_index);
        Self::with_backend_from_config(Arc::new(backend), config)
    }

    /// Instance over any backend, with index names, result cap and
    /// refresh policy taken from configuration
    pub fn with_backend_from_config(
        backend: Arc<dyn DiscoveryBackend>,
        config: &Config,
    ) -> DiscoveryResult<Self> {
        let es = &config.elasticsearch;
        let targets = Arc::new(IndexTargets::new(&es.read_index, &es.write_index)?);
        Ok(Self::new(backend, targets)
            .with_max_results(es.max_results)
            .with_refresh(es.refresh))
    }

    /// Fail any call that takes longer than `deadline`
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.reader = self.reader.with_max_results(max_results);
        self
    }

    pub fn with_refresh(mut self, refresh: RefreshPolicy) -> Self {
        self.writer = self.writer.with_refresh(refresh);
        self
    }

    pub fn with_retry_policy(mut self, retry: Arc<dyn RetryPolicy>) -> Self {
        self.writer = self.writer.with_retry_policy(retry);
        self
    }

    /// Live read/write index names
    pub fn targets(&self) -> &Arc<IndexTargets> {
        &self.targets
    }

    pub fn writer(&self) -> &IndexWriter {
        &self.writer
    }

    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Metrics exactly one segment below `prefix`
    pub async fn search_next_level(
        &self,
        tenant_id: &str,
        prefix: &str,
    ) -> DiscoveryResult<SearchResults> {
        self.bounded(self.reader.search_next_level(tenant_id, prefix))
            .await
    }

    /// Check the backing store is reachable
    pub async fn ping(&self) -> DiscoveryResult<()> {
        self.bounded(async { self.backend.ping().await.map_err(DiscoveryError::from) })
            .await
    }

    async fn bounded<T, F>(&self, call: F) -> DiscoveryResult<T>
    where
        F: Future<Output = DiscoveryResult<T>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, call)
                .await
                .map_err(|_| DiscoveryError::DeadlineExceeded(deadline))?,
            None => call.await,
        }
    }
}

#[async_trait]
impl DiscoveryIo for MetricDiscovery {
    async fn insert_discovery(&self, documents: Vec<DiscoveryDocument>) -> DiscoveryResult<usize> {
        self.bounded(self.writer.insert_documents(documents)).await
    }

    async fn search(&self, tenant_id: &str, pattern: &str) -> DiscoveryResult<SearchResults> {
        self.bounded(self.reader.search(tenant_id, pattern)).await
    }

    async fn search_batch(
        &self,
        tenant_id: &str,
        patterns: &[String],
    ) -> DiscoveryResult<SearchResults> {
        self.bounded(self.reader.search_batch(tenant_id, patterns))
            .await
    }
}
