//! Index Writer
//!
//! Turns locators into identity-keyed upserts and submits each batch as
//! one bulk request against the live write index, routed by tenant.

use std::sync::Arc;

use crate::backend::{DiscoveryBackend, IndexOperation, RefreshPolicy};
use crate::discovery::error::{DiscoveryError, DiscoveryResult};
use crate::discovery::retry::{NoRetry, RetryPolicy};
use crate::discovery::targets::IndexTargets;
use crate::discovery::types::{Annotations, DiscoveryDocument, Locator};

/// Bulk writer for discovery documents
pub struct IndexWriter {
    backend: Arc<dyn DiscoveryBackend>,
    targets: Arc<IndexTargets>,
    refresh: RefreshPolicy,
    retry: Arc<dyn RetryPolicy>,
}

impl IndexWriter {
    pub fn new(backend: Arc<dyn DiscoveryBackend>, targets: Arc<IndexTargets>) -> Self {
        Self {
            backend,
            targets,
            refresh: RefreshPolicy::default(),
            retry: Arc::new(NoRetry),
        }
    }

    /// Set when written documents become visible to search
    pub fn with_refresh(mut self, refresh: RefreshPolicy) -> Self {
        self.refresh = refresh;
        self
    }

    /// Set the retry strategy for failed bulk requests
    pub fn with_retry_policy(mut self, retry: Arc<dyn RetryPolicy>) -> Self {
        self.retry = retry;
        self
    }

    /// Index a batch of locators with optional annotations.
    ///
    /// Returns the number of documents written. Every item is validated
    /// before anything is sent.
    pub async fn insert<I>(&self, batch: I) -> DiscoveryResult<usize>
    where
        I: IntoIterator<Item = (Locator, Option<Annotations>)>,
    {
        let documents = batch
            .into_iter()
            .map(|(locator, annotations)| {
                DiscoveryDocument::from_locator(locator, annotations.unwrap_or_default())
            })
            .collect::<DiscoveryResult<Vec<_>>>()?;

        self.insert_documents(documents).await
    }

    /// Index a single metric
    pub async fn insert_metric(
        &self,
        tenant_id: &str,
        metric_name: &str,
        annotations: Option<Annotations>,
    ) -> DiscoveryResult<usize> {
        let locator = Locator::new(tenant_id, metric_name)?;
        self.insert([(locator, annotations)]).await
    }

    /// Index already built documents as one bulk request
    pub async fn insert_documents(&self, documents: Vec<DiscoveryDocument>) -> DiscoveryResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let mut attempt = 0;
        loop {
            match self.submit(&documents).await {
                Ok(written) => return Ok(written),
                Err(e) => {
                    attempt += 1;
                    match self.retry.backoff(attempt, &e) {
                        Some(delay) => {
                            tracing::warn!(
                                error = %e,
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                "Bulk write failed, retrying"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(e),
                    }
                }
            }
        }
    }

    /// One bulk request. The write index is read on every attempt so a
    /// cutover between retries is honoured.
    async fn submit(&self, documents: &[DiscoveryDocument]) -> DiscoveryResult<usize> {
        let index = self.targets.write_index();
        let ops: Vec<IndexOperation> = documents
            .iter()
            .map(|doc| IndexOperation {
                index: index.to_string(),
                id: doc.document_id(),
                routing: doc.routing().to_string(),
                source: doc.source(),
            })
            .collect();

        tracing::debug!(index = %index, documents = ops.len(), "Indexing discovery documents");

        let summary = self.backend.bulk(ops, self.refresh).await?;
        if summary.failed > 0 {
            return Err(DiscoveryError::PartialBatchFailure {
                failed: summary.failed,
                total: summary.total,
                first_reason: summary.first_error,
                transient: summary.transient,
            });
        }

        Ok(summary.total)
    }
}
