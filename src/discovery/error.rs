//! Discovery error types
//!
//! Three failure families reach callers:
//! - invalid arguments (bad locator, bad glob, tenant-referencing query),
//!   always caught before any network call
//! - backend failures, surfaced as-is
//! - partial bulk failures, reported in aggregate

use std::time::Duration;
use thiserror::Error;

use crate::backend::BackendError;
use crate::glob::GlobError;

/// Errors that can occur in the discovery layer
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Malformed locator, annotation, tenant or index name
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed glob pattern
    #[error("Invalid pattern: {0}")]
    Glob(#[from] GlobError),

    /// Query tries to reach the tenant field directly
    #[error("Illegal query: {0}")]
    IllegalQuery(String),

    /// Backing store failed or could not be reached
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Some documents in a bulk write were rejected
    #[error(
        "Bulk write failed for {failed} of {total} documents: {}",
        .first_reason.as_deref().unwrap_or("no reason given")
    )]
    PartialBatchFailure {
        failed: usize,
        total: usize,
        first_reason: Option<String>,
        /// Every rejection was a throttle or server-side error
        transient: bool,
    },

    /// Caller-imposed deadline elapsed
    #[error("Deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

impl DiscoveryError {
    /// Caller mistakes; never worth retrying
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            DiscoveryError::InvalidArgument(_)
                | DiscoveryError::Glob(_)
                | DiscoveryError::IllegalQuery(_)
        )
    }

    /// Whether sending the same request again might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            DiscoveryError::Backend(e) => e.is_transient(),
            DiscoveryError::PartialBatchFailure { transient, .. } => *transient,
            DiscoveryError::DeadlineExceeded(_) => true,
            DiscoveryError::InvalidArgument(_)
            | DiscoveryError::Glob(_)
            | DiscoveryError::IllegalQuery(_) => false,
        }
    }
}

/// Result type alias for discovery operations
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DiscoveryError::PartialBatchFailure {
            failed: 2,
            total: 10,
            first_reason: Some("mapper_parsing_exception".to_string()),
            transient: false,
        };
        assert_eq!(
            err.to_string(),
            "Bulk write failed for 2 of 10 documents: mapper_parsing_exception"
        );

        let err = DiscoveryError::IllegalQuery("tenantId:x".to_string());
        assert_eq!(err.to_string(), "Illegal query: tenantId:x");
    }

    #[test]
    fn test_classification() {
        let err: DiscoveryError = GlobError::Empty.into();
        assert!(err.is_invalid_argument());
        assert!(!err.is_retryable());

        let err: DiscoveryError = BackendError::Timeout.into();
        assert!(!err.is_invalid_argument());
        assert!(err.is_retryable());

        let err = DiscoveryError::PartialBatchFailure {
            failed: 1,
            total: 1,
            first_reason: None,
            transient: true,
        };
        assert!(err.is_retryable());
        assert!(err.to_string().ends_with("no reason given"));

        let err = DiscoveryError::PartialBatchFailure {
            failed: 1,
            total: 1,
            first_reason: Some("mapper_parsing_exception".to_string()),
            transient: false,
        };
        assert!(!err.is_retryable());
    }
}
