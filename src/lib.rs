//! # Metric Discovery
//!
//! Tenant-scoped indexing and discovery of dotted metric names
//! (`one.two.three`) over a document search index, queried with
//! Graphite-style globs.
//!
//! ## Features
//!
//! - **Glob queries**: `*`, `?`, `[0-9]` classes and `{a,b}` alternation
//! - **Tree browsing**: names exactly one level below a prefix
//! - **Tenant isolation**: tenant term on every query plus tenant routing
//! - **Idempotent ingest**: documents keyed by `tenant:metric`
//! - **Online reindexing**: read and write index names swap at runtime
//!
//! ## Modules
//!
//! - [`glob`]: glob parser and query compiler
//! - [`query`]: backend-neutral query fragments
//! - [`discovery`]: document model, writer, reader and index targets
//! - [`backend`]: Elasticsearch and in-memory stores
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use metric_discovery::config::Config;
//! use metric_discovery::discovery::{DiscoveryIo, MetricDiscovery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let discovery = MetricDiscovery::from_config(&Config::load_default())?;
//!
//!     discovery
//!         .writer()
//!         .insert_metric("836986", "one.two.three.four", None)
//!         .await?;
//!
//!     for hit in discovery.search("836986", "one.{two,three}.*").await? {
//!         println!("{}", hit.metric_name);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod backend;
pub mod config;
pub mod discovery;
pub mod glob;
pub mod query;

// Re-export top-level types for convenience
pub use discovery::{
    Annotations, DiscoveryDocument, DiscoveryError, DiscoveryIo, DiscoveryResult, IndexReader,
    IndexTargets, IndexWriter, Locator, MetricDiscovery, SearchResult, SearchResults,
};

pub use glob::{enumerate_next_level, translate_query, GlobError};

pub use query::QueryFragment;

pub use backend::{BackendError, DiscoveryBackend, ElasticClient, MemoryBackend};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError};
