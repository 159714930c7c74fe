//! Active read/write index names
//!
//! Both names live in [`ArcSwap`] cells: readers take a snapshot per
//! call without locking and a cutover swaps the pointer. A call that
//! loaded the old name before a swap may still finish against the old
//! index.

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::discovery::error::{DiscoveryError, DiscoveryResult};

/// Default read index (or alias)
pub const DEFAULT_READ_INDEX: &str = "metric_metadata_read";

/// Default write index (or alias)
pub const DEFAULT_WRITE_INDEX: &str = "metric_metadata_write";

/// Process-wide index targets shared by the writer and the reader
#[derive(Debug)]
pub struct IndexTargets {
    read: ArcSwap<String>,
    write: ArcSwap<String>,
    default_read: Arc<String>,
    default_write: Arc<String>,
}

impl IndexTargets {
    /// Create targets seeded from static configuration. The given names
    /// are also what [`reset`](Self::reset) restores.
    pub fn new(read_index: &str, write_index: &str) -> DiscoveryResult<Self> {
        validate_index_name(read_index)?;
        validate_index_name(write_index)?;

        let default_read = Arc::new(read_index.to_string());
        let default_write = Arc::new(write_index.to_string());

        Ok(Self {
            read: ArcSwap::new(default_read.clone()),
            write: ArcSwap::new(default_write.clone()),
            default_read,
            default_write,
        })
    }

    /// Index searches run against right now
    pub fn read_index(&self) -> Arc<String> {
        self.read.load_full()
    }

    /// Index writes go to right now
    pub fn write_index(&self) -> Arc<String> {
        self.write.load_full()
    }

    /// Point searches at `name`, returning the previous name
    pub fn set_read_index(&self, name: &str) -> DiscoveryResult<String> {
        validate_index_name(name)?;
        let previous = self.read.swap(Arc::new(name.to_string()));
        tracing::info!(from = %previous, to = %name, "Read index cutover");
        Ok(previous.to_string())
    }

    /// Point writes at `name`, returning the previous name
    pub fn set_write_index(&self, name: &str) -> DiscoveryResult<String> {
        validate_index_name(name)?;
        let previous = self.write.swap(Arc::new(name.to_string()));
        tracing::info!(from = %previous, to = %name, "Write index cutover");
        Ok(previous.to_string())
    }

    /// Restore the configured read index, returning the previous name
    pub fn reset_read_index(&self) -> String {
        let previous = self.read.swap(self.default_read.clone());
        tracing::info!(from = %previous, to = %self.default_read, "Read index reset");
        previous.to_string()
    }

    /// Restore the configured write index, returning the previous name
    pub fn reset_write_index(&self) -> String {
        let previous = self.write.swap(self.default_write.clone());
        tracing::info!(from = %previous, to = %self.default_write, "Write index reset");
        previous.to_string()
    }

    /// Restore both configured names
    pub fn reset(&self) {
        self.reset_read_index();
        self.reset_write_index();
    }

    /// Configured `(read, write)` names
    pub fn defaults(&self) -> (&str, &str) {
        (self.default_read.as_str(), self.default_write.as_str())
    }
}

impl Default for IndexTargets {
    fn default() -> Self {
        let default_read = Arc::new(DEFAULT_READ_INDEX.to_string());
        let default_write = Arc::new(DEFAULT_WRITE_INDEX.to_string());
        Self {
            read: ArcSwap::new(default_read.clone()),
            write: ArcSwap::new(default_write.clone()),
            default_read,
            default_write,
        }
    }
}

/// One name must address exactly one index or alias
fn validate_index_name(name: &str) -> DiscoveryResult<()> {
    if name.is_empty() {
        return Err(DiscoveryError::InvalidArgument(
            "index name must not be empty".to_string(),
        ));
    }
    if name.chars().any(|c| c.is_whitespace() || c == ',' || c == '*') {
        return Err(DiscoveryError::InvalidArgument(format!(
            "invalid index name '{}'",
            name
        )));
    }
    Ok(())
}
