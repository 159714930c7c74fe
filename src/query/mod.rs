//! Backend query model
//!
//! [`QueryFragment`] is what the glob compiler produces and what every
//! backend consumes. It has no dependency on a client so that pattern
//! semantics can be tested without a network.
//!
//! # Document fields
//!
//! ```text
//! {
//!   "tenantId":    "836986",
//!   "metric_name": "one.two.three00.fourA.five1",
//!   "unit":        "ms",          (optional)
//!   "type":        "number"       (optional)
//! }
//! ```

mod fragment;

pub use fragment::QueryFragment;

/// Field names of a discovery document
pub mod fields {
    pub const TENANT_ID: &str = "tenantId";
    pub const METRIC_NAME: &str = "metric_name";
    pub const UNIT: &str = "unit";
    pub const TYPE: &str = "type";
}
