//! Glob error types
//!
//! Every malformed pattern is rejected at compile time; nothing is
//! passed through to the backend unparsed.

use thiserror::Error;

/// Errors that can occur while compiling a glob pattern
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GlobError {
    /// Pattern was empty (or only whitespace)
    #[error("Empty glob pattern")]
    Empty,

    /// A `{` was never closed
    #[error("Unbalanced '{{' at position {position} in '{pattern}'")]
    UnclosedBrace { pattern: String, position: usize },

    /// A `[` was never closed
    #[error("Unbalanced '[' at position {position} in '{pattern}'")]
    UnclosedBracket { pattern: String, position: usize },

    /// A `}` or `]` with no matching opener
    #[error("Unexpected '{found}' at position {position} in '{pattern}'")]
    UnexpectedCloser {
        pattern: String,
        found: char,
        position: usize,
    },

    /// `[]` or `[!]`
    #[error("Empty character class at position {position} in '{pattern}'")]
    EmptyClass { pattern: String, position: usize },

    /// `[z-a]`
    #[error("Invalid range '{start}-{end}' in '{pattern}'")]
    InvalidRange {
        pattern: String,
        start: char,
        end: char,
    },

    /// Pattern ends with a lone backslash
    #[error("Trailing escape character in '{0}'")]
    TrailingEscape(String),

    /// Enumeration prefix has an empty dot segment (`foo..bar`, `foo.`)
    #[error("Empty segment in '{0}'")]
    EmptySegment(String),

    /// Anything the grammar does not accept
    #[error("Syntax error at position {position} in '{pattern}'")]
    Syntax { pattern: String, position: usize },
}

/// Result type for glob compilation
pub type GlobResult<T> = Result<T, GlobError>;
