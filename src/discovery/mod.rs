//! Metric discovery
//!
//! Tenant-scoped indexing and glob search of dotted metric names.
//!
//! - **Types**: [`Locator`], [`DiscoveryDocument`], [`SearchResult`]
//! - **Targets**: live read/write index names, swappable at runtime
//! - **Writer**: bulk upsert routed by tenant
//! - **Reader**: single, batched and next-level glob search
//! - **Facade**: [`MetricDiscovery`] with an optional per-call deadline
//!
//! Writes follow the backing store's visibility rules: a document just
//! written may not show up in a search until the store refreshes,
//! unless the writer was configured with a refresh policy.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use metric_discovery::backend::MemoryBackend;
//! use metric_discovery::discovery::{
//!     DiscoveryIo, IndexTargets, MetricDiscovery, DEFAULT_READ_INDEX, DEFAULT_WRITE_INDEX,
//! };
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let (read, write) = (DEFAULT_READ_INDEX, DEFAULT_WRITE_INDEX);
//!     let discovery = MetricDiscovery::new(
//!         Arc::new(MemoryBackend::with_read_alias(read, write)),
//!         Arc::new(IndexTargets::new(read, write).unwrap()),
//!     );
//!     discovery.writer().insert_metric("tenant", "one.two.three", None).await.unwrap();
//!
//!     let hits = discovery.search("tenant", "one.*.three").await.unwrap();
//!     assert_eq!(hits[0].metric_name, "one.two.three");
//! });
//! ```

mod error;
mod io;
mod reader;
mod retry;
mod targets;
mod types;
mod writer;

pub use error::{DiscoveryError, DiscoveryResult};
pub use io::{DiscoveryIo, MetricDiscovery};
pub use reader::{IndexReader, DEFAULT_MAX_RESULTS};
pub use retry::{ExponentialBackoff, NoRetry, RetryPolicy};
pub use targets::{IndexTargets, DEFAULT_READ_INDEX, DEFAULT_WRITE_INDEX};
pub use types::{
    AnnotationValue, Annotations, DiscoveryDocument, Locator, SearchResult, SearchResults,
};
pub use writer::IndexWriter;
