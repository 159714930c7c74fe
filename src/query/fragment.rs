//! Query fragments
//!
//! The small subset of a document-store query language the discovery
//! layer needs: exact term, whole-value wildcard, whole-value regexp and
//! a boolean conjunction over those.

use serde_json::{json, Value};

/// A backend query, independent of any particular client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFragment {
    /// Field equals value exactly
    Term { field: String, value: String },
    /// Whole-value wildcard: `*` any run, `?` one char, `\` escapes
    Wildcard { field: String, value: String },
    /// Whole-value regular expression (implicitly anchored)
    Regexp { field: String, value: String },
    /// All of `must`
    Bool { must: Vec<QueryFragment> },
}

impl QueryFragment {
    pub fn term(field: &str, value: impl Into<String>) -> Self {
        QueryFragment::Term {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn wildcard(field: &str, value: impl Into<String>) -> Self {
        QueryFragment::Wildcard {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn regexp(field: &str, value: impl Into<String>) -> Self {
        QueryFragment::Regexp {
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Conjunction of all clauses
    pub fn all(must: Vec<QueryFragment>) -> Self {
        QueryFragment::Bool { must }
    }

    /// Render as Elasticsearch query DSL
    pub fn to_json(&self) -> Value {
        match self {
            QueryFragment::Term { field, value } => json!({ "term": { field: value } }),
            QueryFragment::Wildcard { field, value } => {
                json!({ "wildcard": { field: { "value": value } } })
            }
            // Optional operators (@ & ~ < > #) off, so only plain regex syntax applies
            QueryFragment::Regexp { field, value } => {
                json!({ "regexp": { field: { "value": value, "flags": "NONE" } } })
            }
            QueryFragment::Bool { must } => {
                let must: Vec<Value> = must.iter().map(QueryFragment::to_json).collect();
                json!({ "bool": { "must": must } })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_json() {
        let q = QueryFragment::term("metric_name", "a.b.c");
        assert_eq!(q.to_json(), json!({ "term": { "metric_name": "a.b.c" } }));
    }

    #[test]
    fn test_bool_json() {
        let q = QueryFragment::all(vec![
            QueryFragment::term("tenantId", "t1"),
            QueryFragment::wildcard("metric_name", "a.*"),
        ]);
        assert_eq!(
            q.to_json(),
            json!({
                "bool": {
                    "must": [
                        { "term": { "tenantId": "t1" } },
                        { "wildcard": { "metric_name": { "value": "a.*" } } }
                    ]
                }
            })
        );
    }

    #[test]
    fn test_regexp_disables_optional_operators() {
        let q = QueryFragment::regexp("metric_name", "a\\.(b|c)");
        assert_eq!(q.to_json()["regexp"]["metric_name"]["flags"], json!("NONE"));
    }
}
