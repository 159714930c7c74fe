//! Glob Compiler
//!
//! Translates Graphite-style metric globs into backend query fragments.
//! Pure and stateless; nothing here talks to a backend.
//!
//! - **AST**: [`Glob`] and its tokens
//! - **Parser**: pattern text → [`Glob`] (nom)
//! - **Compiler**: [`Glob`] → [`QueryFragment`](crate::query::QueryFragment),
//!   plus the "next level" enumeration regex
//!
//! # Examples
//!
//! ```rust
//! use metric_discovery::glob::{translate_query, next_level_matcher};
//! use metric_discovery::query::QueryFragment;
//!
//! let q = translate_query("one.two.*").unwrap();
//! assert_eq!(q, QueryFragment::wildcard("metric_name", "one.two.*"));
//!
//! let re = next_level_matcher("foo.bar.*").unwrap();
//! assert!(re.is_match("foo.bar.baz.qux"));
//! assert!(!re.is_match("foo.bar.baz"));
//! ```

mod ast;
mod compiler;
mod error;
mod parser;

pub use ast::{ClassItem, Glob, GlobToken};
pub use compiler::{
    compile, enumerate_next_level, next_level_fragment, next_level_matcher, translate_query,
};
pub use error::{GlobError, GlobResult};
pub use parser::parse_glob;
