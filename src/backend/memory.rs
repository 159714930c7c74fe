//! In-memory backing store
//!
//! Indices are created on first write. Searching an index that does not
//! exist yields no hits. Aliases map one name onto several indices, the
//! way a read alias spans the old and new index during a reindex.
//!
//! Matching follows Elasticsearch keyword semantics:
//! - term: exact string equality
//! - wildcard: whole value, `*` any run, `?` one char, `\` escapes
//! - regexp: whole value
//!
//! A fresh store knows no aliases. [`MemoryBackend::with_read_alias`]
//! sets up the usual cluster layout instead, with the read name as an
//! alias over the write index, so that documents written through the
//! write name are found through the read name.
//!
//! Routing is treated as a hard partition: a search routed to `t1`
//! only sees documents written with routing `t1`.

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::backend::{
    BackendError, BulkSummary, DiscoveryBackend, Hit, IndexOperation, RefreshPolicy,
    SearchHits, SearchRequest,
};
use crate::query::QueryFragment;

/// In-process document store
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// index → (document id → document), ordered by id
    indices: HashMap<String, BTreeMap<String, StoredDocument>>,
    /// alias → indices
    aliases: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    routing: String,
    source: Map<String, Value>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store in which `read` is an alias over the `write` index. Equal
    /// names need no alias.
    pub fn with_read_alias(read: &str, write: &str) -> Self {
        let mut state = MemoryState::default();
        if read != write {
            state
                .aliases
                .insert(read.to_string(), vec![write.to_string()]);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    /// Point `alias` at `index` in addition to any indices it already covers
    pub async fn add_alias(&self, alias: &str, index: &str) {
        let mut state = self.state.write().await;
        let targets = state.aliases.entry(alias.to_string()).or_default();
        if !targets.iter().any(|t| t == index) {
            targets.push(index.to_string());
        }
    }

    /// Number of documents stored in `index`
    pub async fn document_count(&self, index: &str) -> usize {
        let state = self.state.read().await;
        state.indices.get(index).map(|docs| docs.len()).unwrap_or(0)
    }

    /// Source of one document
    pub async fn get(&self, index: &str, id: &str) -> Option<Map<String, Value>> {
        let state = self.state.read().await;
        state
            .indices
            .get(index)
            .and_then(|docs| docs.get(id))
            .map(|doc| doc.source.clone())
    }
}

impl MemoryState {
    fn resolve(&self, name: &str) -> Vec<String> {
        match self.aliases.get(name) {
            Some(targets) => targets.clone(),
            None => vec![name.to_string()],
        }
    }
}

#[async_trait]
impl DiscoveryBackend for MemoryBackend {
    async fn bulk(
        &self,
        ops: Vec<IndexOperation>,
        _refresh: RefreshPolicy,
    ) -> Result<BulkSummary, BackendError> {
        let total = ops.len();
        let mut state = self.state.write().await;

        for op in ops {
            state.indices.entry(op.index).or_default().insert(
                op.id,
                StoredDocument {
                    routing: op.routing,
                    source: op.source,
                },
            );
        }

        Ok(BulkSummary {
            total,
            failed: 0,
            first_error: None,
            transient: false,
        })
    }

    async fn search(&self, request: SearchRequest) -> Result<SearchHits, BackendError> {
        let matcher = Matcher::compile(&request.query)?;
        let state = self.state.read().await;

        let mut hits = Vec::new();
        for index in state.resolve(&request.index) {
            let Some(docs) = state.indices.get(&index) else {
                continue;
            };
            for (id, doc) in docs {
                if let Some(routing) = &request.routing {
                    if &doc.routing != routing {
                        continue;
                    }
                }
                if matcher.matches(&doc.source) {
                    hits.push(Hit {
                        index: index.clone(),
                        id: id.clone(),
                        source: doc.source.clone(),
                    });
                }
            }
        }

        let total = hits.len() as u64;
        hits.truncate(request.size);

        Ok(SearchHits {
            hits,
            total: Some(total),
        })
    }

    async fn ping(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// A query fragment with its patterns compiled once per search
enum Matcher {
    Term { field: String, value: String },
    Pattern { field: String, regex: Regex },
    All(Vec<Matcher>),
}

impl Matcher {
    fn compile(query: &QueryFragment) -> Result<Self, BackendError> {
        Ok(match query {
            QueryFragment::Term { field, value } => Matcher::Term {
                field: field.clone(),
                value: value.clone(),
            },
            QueryFragment::Wildcard { field, value } => Matcher::Pattern {
                field: field.clone(),
                regex: anchored(&wildcard_to_regex(value))?,
            },
            QueryFragment::Regexp { field, value } => Matcher::Pattern {
                field: field.clone(),
                regex: anchored(value)?,
            },
            QueryFragment::Bool { must } => Matcher::All(
                must.iter().map(Matcher::compile).collect::<Result<_, _>>()?,
            ),
        })
    }

    fn matches(&self, source: &Map<String, Value>) -> bool {
        match self {
            Matcher::Term { field, value } => field_str(source, field) == Some(value.as_str()),
            Matcher::Pattern { field, regex } => field_str(source, field)
                .map(|v| regex.is_match(v))
                .unwrap_or(false),
            Matcher::All(must) => must.iter().all(|m| m.matches(source)),
        }
    }
}

fn field_str<'a>(source: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    source.get(field).and_then(Value::as_str)
}

fn anchored(body: &str) -> Result<Regex, BackendError> {
    Regex::new(&format!("^(?s:{})$", body))
        .map_err(|e| BackendError::BadRequest(format!("invalid pattern '{}': {}", body, e)))
}

fn wildcard_to_regex(wildcard: &str) -> String {
    let mut out = String::new();
    let mut chars = wildcard.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push_str(&regex::escape(&escaped.to_string()));
                }
            }
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn op(index: &str, tenant: &str, metric: &str) -> IndexOperation {
        let mut source = Map::new();
        source.insert("tenantId".to_string(), json!(tenant));
        source.insert("metric_name".to_string(), json!(metric));
        IndexOperation {
            index: index.to_string(),
            id: format!("{}:{}", tenant, metric),
            routing: tenant.to_string(),
            source,
        }
    }

    fn request(index: &str, routing: Option<&str>, query: QueryFragment) -> SearchRequest {
        SearchRequest {
            index: index.to_string(),
            routing: routing.map(str::to_string),
            query,
            size: 100,
        }
    }

    async fn names(backend: &MemoryBackend, req: SearchRequest) -> Vec<String> {
        backend
            .search(req)
            .await
            .unwrap()
            .hits
            .into_iter()
            .map(|h| h.source["metric_name"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_bulk_upserts_by_id() {
        let backend = MemoryBackend::new();
        backend
            .bulk(vec![op("i", "t", "a.b"), op("i", "t", "a.b")], RefreshPolicy::None)
            .await
            .unwrap();
        assert_eq!(backend.document_count("i").await, 1);
        assert!(backend.get("i", "t:a.b").await.is_some());
    }

    #[tokio::test]
    async fn test_term_wildcard_regexp() {
        let backend = MemoryBackend::new();
        backend
            .bulk(
                vec![op("i", "t", "a.b.c"), op("i", "t", "a.x"), op("i", "t", "b.c")],
                RefreshPolicy::None,
            )
            .await
            .unwrap();

        let found = names(&backend, request("i", None, QueryFragment::term("metric_name", "a.x"))).await;
        assert_eq!(found, vec!["a.x"]);

        let found = names(&backend, request("i", None, QueryFragment::wildcard("metric_name", "a.*"))).await;
        assert_eq!(found, vec!["a.b.c", "a.x"]);

        let found = names(&backend, request("i", None, QueryFragment::regexp("metric_name", r"[ab]\.c"))).await;
        assert_eq!(found, vec!["b.c"]);
    }

    #[tokio::test]
    async fn test_wildcard_escape() {
        let backend = MemoryBackend::new();
        backend
            .bulk(vec![op("i", "t", "a*"), op("i", "t", "ab")], RefreshPolicy::None)
            .await
            .unwrap();
        let found = names(&backend, request("i", None, QueryFragment::wildcard("metric_name", r"a\*"))).await;
        assert_eq!(found, vec!["a*"]);
    }

    #[tokio::test]
    async fn test_routing_partitions() {
        let backend = MemoryBackend::new();
        backend
            .bulk(vec![op("i", "t1", "a"), op("i", "t2", "a")], RefreshPolicy::None)
            .await
            .unwrap();

        let hits = backend
            .search(request("i", Some("t1"), QueryFragment::wildcard("metric_name", "*")))
            .await
            .unwrap();
        assert_eq!(hits.hits.len(), 1);
        assert_eq!(hits.hits[0].source["tenantId"], "t1");
    }

    #[tokio::test]
    async fn test_alias_spans_indices() {
        let backend = MemoryBackend::new();
        backend
            .bulk(vec![op("old", "t", "a"), op("new", "t", "a")], RefreshPolicy::None)
            .await
            .unwrap();
        backend.add_alias("read", "old").await;
        backend.add_alias("read", "new").await;
        backend.add_alias("read", "new").await;

        let hits = backend
            .search(request("read", None, QueryFragment::term("metric_name", "a")))
            .await
            .unwrap();
        assert_eq!(hits.hits.len(), 2);
    }

    #[tokio::test]
    async fn test_read_alias_over_write_index() {
        let backend = MemoryBackend::with_read_alias("metrics_read", "metrics_write");
        backend
            .bulk(vec![op("metrics_write", "t", "a.b")], RefreshPolicy::None)
            .await
            .unwrap();

        let found = names(
            &backend,
            request("metrics_read", Some("t"), QueryFragment::term("metric_name", "a.b")),
        )
        .await;
        assert_eq!(found, vec!["a.b"]);

        let same = MemoryBackend::with_read_alias("metrics", "metrics");
        same.bulk(vec![op("metrics", "t", "a.b")], RefreshPolicy::None)
            .await
            .unwrap();
        assert_eq!(
            names(&same, request("metrics", None, QueryFragment::term("metric_name", "a.b"))).await,
            vec!["a.b"]
        );
    }

    #[tokio::test]
    async fn test_missing_index_is_empty() {
        let backend = MemoryBackend::new();
        let hits = backend
            .search(request("nope", None, QueryFragment::wildcard("metric_name", "*")))
            .await
            .unwrap();
        assert!(hits.hits.is_empty());
    }

    #[tokio::test]
    async fn test_size_cap_reports_total() {
        let backend = MemoryBackend::new();
        let ops = (0..5).map(|i| op("i", "t", &format!("m{}", i))).collect();
        backend.bulk(ops, RefreshPolicy::None).await.unwrap();

        let mut req = request("i", None, QueryFragment::wildcard("metric_name", "*"));
        req.size = 2;
        let hits = backend.search(req).await.unwrap();
        assert_eq!(hits.hits.len(), 2);
        assert_eq!(hits.total, Some(5));
        assert!(hits.is_truncated());
    }

    #[tokio::test]
    async fn test_invalid_regexp_is_bad_request() {
        let backend = MemoryBackend::new();
        let err = backend
            .search(request("i", None, QueryFragment::regexp("metric_name", "(")))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::BadRequest(_)));
    }

    #[test]
    fn test_wildcard_to_regex() {
        assert_eq!(wildcard_to_regex("a.*"), r"a\..*");
        assert_eq!(wildcard_to_regex("a?"), "a.");
        assert_eq!(wildcard_to_regex(r"a\?"), r"a\?");
    }
}
