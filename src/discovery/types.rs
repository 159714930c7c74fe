//! Discovery data model
//!
//! - [`Locator`]: tenant-scoped dotted metric name
//! - [`Annotations`]: scalar metadata stored next to the name
//! - [`DiscoveryDocument`]: what gets written, keyed `tenant:metric`
//! - [`SearchResult`]: one hit a search hands back
//! - [`SearchResults`]: every hit of one call, plus whether the cap cut it short

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;

use crate::discovery::error::{DiscoveryError, DiscoveryResult};
use crate::query::fields;

/// Tenant-scoped hierarchical metric identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    tenant_id: String,
    metric_name: String,
}

impl Locator {
    /// Create a locator. Tenant and metric name must be non-empty and the
    /// name must not contain empty dot segments.
    pub fn new(tenant_id: impl Into<String>, metric_name: impl Into<String>) -> DiscoveryResult<Self> {
        let tenant_id = tenant_id.into();
        let metric_name = metric_name.into();

        if tenant_id.trim().is_empty() {
            return Err(DiscoveryError::InvalidArgument(
                "locator has an empty tenant id".to_string(),
            ));
        }
        if metric_name.trim().is_empty() {
            return Err(DiscoveryError::InvalidArgument(format!(
                "locator for tenant '{}' has an empty metric name",
                tenant_id
            )));
        }
        if metric_name.split('.').any(str::is_empty) {
            return Err(DiscoveryError::InvalidArgument(format!(
                "metric name '{}' has an empty segment",
                metric_name
            )));
        }

        Ok(Self {
            tenant_id,
            metric_name,
        })
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    /// Dot-separated segments of the metric name
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.metric_name.split('.')
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.tenant_id, self.metric_name)
    }
}

/// A scalar annotation value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl AnnotationValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnotationValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            AnnotationValue::Bool(b) => Value::Bool(*b),
            AnnotationValue::Integer(i) => Value::from(*i),
            AnnotationValue::Float(f) => Value::from(*f),
            AnnotationValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<&str> for AnnotationValue {
    fn from(s: &str) -> Self {
        AnnotationValue::Text(s.to_string())
    }
}

impl From<String> for AnnotationValue {
    fn from(s: String) -> Self {
        AnnotationValue::Text(s)
    }
}

impl From<i64> for AnnotationValue {
    fn from(i: i64) -> Self {
        AnnotationValue::Integer(i)
    }
}

impl From<f64> for AnnotationValue {
    fn from(f: f64) -> Self {
        AnnotationValue::Float(f)
    }
}

impl From<bool> for AnnotationValue {
    fn from(b: bool) -> Self {
        AnnotationValue::Bool(b)
    }
}

/// Key → scalar metadata attached to a discovery document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotations(BTreeMap<String, AnnotationValue>);

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard pair written on ingest. A missing unit is left out
    /// rather than stored as null.
    pub fn for_metric(unit: Option<&str>, data_type: Option<&str>) -> Self {
        let mut annotations = Self::new();
        if let Some(unit) = unit {
            annotations.insert(fields::UNIT, unit);
        }
        if let Some(data_type) = data_type {
            annotations.insert(fields::TYPE, data_type);
        }
        annotations
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<AnnotationValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<AnnotationValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&AnnotationValue> {
        self.0.get(key)
    }

    pub fn unit(&self) -> Option<&str> {
        self.get(fields::UNIT).and_then(AnnotationValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnnotationValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The record written to the index for one locator
///
/// Identity is `tenant:metric`, so writing the same locator again
/// replaces the previous document.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryDocument {
    locator: Locator,
    annotations: Annotations,
}

impl DiscoveryDocument {
    /// Build a document from raw parts. A missing metric name is rejected
    /// so that a document without an identity never reaches the store.
    pub fn new(
        tenant_id: &str,
        metric_name: Option<&str>,
        annotations: Annotations,
    ) -> DiscoveryResult<Self> {
        let metric_name = metric_name.ok_or_else(|| {
            DiscoveryError::InvalidArgument(
                "trying to index a discovery document without a metric name".to_string(),
            )
        })?;
        Self::from_locator(Locator::new(tenant_id, metric_name)?, annotations)
    }

    /// Build a document for a validated locator
    pub fn from_locator(locator: Locator, annotations: Annotations) -> DiscoveryResult<Self> {
        for key in [fields::TENANT_ID, fields::METRIC_NAME] {
            if annotations.get(key).is_some() {
                return Err(DiscoveryError::InvalidArgument(format!(
                    "annotation key '{}' is reserved",
                    key
                )));
            }
        }

        Ok(Self {
            locator,
            annotations,
        })
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn tenant_id(&self) -> &str {
        self.locator.tenant_id()
    }

    pub fn metric_name(&self) -> &str {
        self.locator.metric_name()
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Deterministic document id
    pub fn document_id(&self) -> String {
        format!("{}:{}", self.tenant_id(), self.metric_name())
    }

    /// Routing key; colocates all documents of one tenant
    pub fn routing(&self) -> &str {
        self.tenant_id()
    }

    /// Stored document body
    pub fn source(&self) -> Map<String, Value> {
        let mut source = Map::new();
        source.insert(fields::TENANT_ID.to_string(), Value::from(self.tenant_id()));
        source.insert(
            fields::METRIC_NAME.to_string(),
            Value::from(self.metric_name()),
        );
        for (key, value) in self.annotations.iter() {
            source.insert(key.clone(), value.to_json());
        }
        source
    }
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchResult {
    pub tenant_id: String,
    pub metric_name: String,
    pub unit: Option<String>,
}

impl SearchResult {
    pub fn new(tenant_id: &str, metric_name: &str, unit: Option<&str>) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            metric_name: metric_name.to_string(),
            unit: unit.map(str::to_string),
        }
    }

    /// Rebuild from a stored document body. `None` if identity fields are
    /// missing.
    pub fn from_source(source: &Map<String, Value>) -> Option<Self> {
        let tenant_id = source.get(fields::TENANT_ID)?.as_str()?;
        let metric_name = source.get(fields::METRIC_NAME)?.as_str()?;
        let unit = source.get(fields::UNIT).and_then(Value::as_str);
        Some(Self::new(tenant_id, metric_name, unit))
    }
}

/// Hits of one search call
///
/// Dereferences to a slice of [`SearchResult`]. `truncated` is set when
/// the store matched more documents than the result cap let through, so
/// the list is not the complete match set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub results: Vec<SearchResult>,
    pub truncated: bool,
}

impl SearchResults {
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn into_vec(self) -> Vec<SearchResult> {
        self.results
    }
}

impl Deref for SearchResults {
    type Target = [SearchResult];

    fn deref(&self) -> &Self::Target {
        &self.results
    }
}

impl IntoIterator for SearchResults {
    type Item = SearchResult;
    type IntoIter = std::vec::IntoIter<SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a SearchResults {
    type Item = &'a SearchResult;
    type IntoIter = std::slice::Iter<'a, SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl PartialEq<Vec<SearchResult>> for SearchResults {
    fn eq(&self, other: &Vec<SearchResult>) -> bool {
        &self.results == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_locator_validation() {
        let locator = Locator::new("836986", "one.two.three").unwrap();
        assert_eq!(locator.tenant_id(), "836986");
        assert_eq!(locator.segments().count(), 3);
        assert_eq!(locator.to_string(), "836986.one.two.three");

        assert!(Locator::new("", "a.b").unwrap_err().is_invalid_argument());
        assert!(Locator::new("t", "").unwrap_err().is_invalid_argument());
        assert!(Locator::new("t", "a..b").unwrap_err().is_invalid_argument());
        assert!(Locator::new("t", "a.").is_err());
    }

    #[test]
    fn test_document_requires_metric_name() {
        let err = DiscoveryDocument::new("t", None, Annotations::new()).unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidArgument(_)));
    }

    #[test]
    fn test_document_identity() {
        let doc = DiscoveryDocument::new("t1", Some("a.b.c.m1"), Annotations::new()).unwrap();
        assert_eq!(doc.document_id(), "t1:a.b.c.m1");
        assert_eq!(doc.routing(), "t1");
    }

    #[test]
    fn test_document_source() {
        let doc = DiscoveryDocument::new(
            "t1",
            Some("a.b"),
            Annotations::for_metric(Some("ms"), Some("number")).with("rollup", true),
        )
        .unwrap();

        assert_eq!(
            Value::Object(doc.source()),
            json!({
                "tenantId": "t1",
                "metric_name": "a.b",
                "unit": "ms",
                "type": "number",
                "rollup": true
            })
        );
    }

    #[test]
    fn test_missing_unit_is_omitted() {
        let annotations = Annotations::for_metric(None, Some("number"));
        assert_eq!(annotations.len(), 1);
        assert!(annotations.unit().is_none());
    }

    #[test]
    fn test_reserved_annotation_keys() {
        let locator = Locator::new("t1", "a").unwrap();
        let err = DiscoveryDocument::from_locator(
            locator,
            Annotations::new().with("tenantId", "t2"),
        )
        .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_annotation_value_deserialization() {
        let annotations: Annotations =
            serde_json::from_value(json!({ "unit": "ms", "count": 3, "ratio": 0.5, "on": false }))
                .unwrap();
        assert_eq!(annotations.get("count"), Some(&AnnotationValue::Integer(3)));
        assert_eq!(annotations.get("ratio"), Some(&AnnotationValue::Float(0.5)));
        assert_eq!(annotations.get("on"), Some(&AnnotationValue::Bool(false)));
        assert_eq!(annotations.unit(), Some("ms"));
    }

    #[test]
    fn test_search_result_from_source() {
        let source = json!({ "tenantId": "t", "metric_name": "a.b", "unit": "ms" });
        let result = SearchResult::from_source(source.as_object().unwrap()).unwrap();
        assert_eq!(result, SearchResult::new("t", "a.b", Some("ms")));

        let source = json!({ "tenantId": "t" });
        assert!(SearchResult::from_source(source.as_object().unwrap()).is_none());
    }
}
