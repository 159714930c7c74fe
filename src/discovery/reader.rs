//! Index Reader
//!
//! Tenant-scoped glob search against the live read index.
//!
//! Tenant isolation holds twice over: every query is a conjunction with
//! an exact `tenantId` term, and every request is routed by the tenant.
//! Hits that still carry another tenant are dropped.

use std::collections::HashSet;
use std::sync::Arc;

use crate::backend::{DiscoveryBackend, SearchRequest};
use crate::discovery::error::{DiscoveryError, DiscoveryResult};
use crate::discovery::targets::IndexTargets;
use crate::discovery::types::{SearchResult, SearchResults};
use crate::glob::{compile, next_level_fragment, parse_glob, Glob};
use crate::query::{fields, QueryFragment};

/// Maximum hits returned by a single query
pub const DEFAULT_MAX_RESULTS: usize = 500;

/// Spellings of the tenant field a pattern may not mention
const TENANT_REFERENCES: [&str; 2] = ["tenantid", "tenant_id"];

/// Glob search over discovery documents
pub struct IndexReader {
    backend: Arc<dyn DiscoveryBackend>,
    targets: Arc<IndexTargets>,
    max_results: usize,
}

impl IndexReader {
    pub fn new(backend: Arc<dyn DiscoveryBackend>, targets: Arc<IndexTargets>) -> Self {
        Self {
            backend,
            targets,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Cap the number of hits per query
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// All metrics of `tenant_id` matching `pattern`.
    ///
    /// At most [`max_results`](Self::max_results) hits come back; a
    /// capped result has [`SearchResults::truncated`] set.
    pub async fn search(&self, tenant_id: &str, pattern: &str) -> DiscoveryResult<SearchResults> {
        validate_tenant(tenant_id)?;
        let query = compile(&checked_glob(pattern)?);
        let mut out = SearchResults::default();
        let mut seen = HashSet::new();
        self.execute(tenant_id, query, pattern, &mut seen, &mut out)
            .await?;
        Ok(out)
    }

    /// Union of the matches of every pattern, each metric once.
    ///
    /// All patterns are validated before any query runs. The union is
    /// truncated if any single query was.
    pub async fn search_batch<S: AsRef<str>>(
        &self,
        tenant_id: &str,
        patterns: &[S],
    ) -> DiscoveryResult<SearchResults> {
        validate_tenant(tenant_id)?;
        let queries = patterns
            .iter()
            .map(|p| checked_glob(p.as_ref()).map(|glob| (p.as_ref(), compile(&glob))))
            .collect::<DiscoveryResult<Vec<_>>>()?;

        let mut out = SearchResults::default();
        let mut seen = HashSet::new();
        for (pattern, query) in queries {
            self.execute(tenant_id, query, pattern, &mut seen, &mut out)
                .await?;
        }
        Ok(out)
    }

    /// Metrics exactly one segment deeper than `prefix`
    pub async fn search_next_level(
        &self,
        tenant_id: &str,
        prefix: &str,
    ) -> DiscoveryResult<SearchResults> {
        validate_tenant(tenant_id)?;
        checked_glob(prefix)?;
        let query = next_level_fragment(prefix)?;
        let mut out = SearchResults::default();
        let mut seen = HashSet::new();
        self.execute(tenant_id, query, prefix, &mut seen, &mut out)
            .await?;
        Ok(out)
    }

    /// Run one tenant-scoped query into `out`, skipping metrics already
    /// in `seen`
    async fn execute(
        &self,
        tenant_id: &str,
        name_query: QueryFragment,
        pattern: &str,
        seen: &mut HashSet<(String, String)>,
        out: &mut SearchResults,
    ) -> DiscoveryResult<()> {
        let index = self.targets.read_index();
        let request = SearchRequest {
            index: index.to_string(),
            routing: Some(tenant_id.to_string()),
            query: QueryFragment::all(vec![
                QueryFragment::term(fields::TENANT_ID, tenant_id),
                name_query,
            ]),
            size: self.max_results,
        };

        tracing::debug!(index = %index, tenant = %tenant_id, pattern = %pattern, "Searching metrics");

        let hits = self.backend.search(request).await?;
        if hits.is_truncated() {
            tracing::warn!(
                tenant = %tenant_id,
                pattern = %pattern,
                returned = hits.hits.len(),
                total = hits.total.unwrap_or_default(),
                "Search result truncated"
            );
            out.truncated = true;
        }

        for hit in hits.hits {
            let Some(result) = SearchResult::from_source(&hit.source) else {
                tracing::warn!(id = %hit.id, index = %hit.index, "Skipping hit without identity fields");
                continue;
            };
            if result.tenant_id != tenant_id {
                tracing::warn!(
                    id = %hit.id,
                    expected = %tenant_id,
                    found = %result.tenant_id,
                    "Dropping hit from another tenant"
                );
                continue;
            }
            if seen.insert((result.tenant_id.clone(), result.metric_name.clone())) {
                out.results.push(result);
            }
        }

        Ok(())
    }
}

fn validate_tenant(tenant_id: &str) -> DiscoveryResult<()> {
    if tenant_id.trim().is_empty() {
        return Err(DiscoveryError::InvalidArgument(
            "search requires a tenant id".to_string(),
        ));
    }
    Ok(())
}

/// Parse `pattern`, rejecting any that names the tenant field, whether
/// spelled out or assembled from escapes, braces and classes
fn checked_glob(pattern: &str) -> DiscoveryResult<Glob> {
    let lowered = pattern.to_lowercase();
    if TENANT_REFERENCES.iter().any(|r| lowered.contains(r)) {
        return Err(DiscoveryError::IllegalQuery(pattern.to_string()));
    }

    let glob = parse_glob(pattern)?;
    if TENANT_REFERENCES.iter().any(|r| glob.spells(r)) {
        return Err(DiscoveryError::IllegalQuery(pattern.to_string()));
    }
    Ok(glob)
}
