//! Ingest Routes
//!
//! - POST /api/v1/discovery - Index a batch of metric names

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{DiscoveryIngestRequest, DiscoveryIngestResponse, MetricDiscoveryRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::discovery::{Annotations, DiscoveryDocument, DiscoveryIo, DiscoveryResult};

/// POST /api/v1/discovery
///
/// The whole batch is validated first and written as one bulk request.
pub async fn ingest_discovery(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DiscoveryIngestRequest>,
) -> ApiResult<(StatusCode, Json<DiscoveryIngestResponse>)> {
    if req.metrics.is_empty() {
        return Err(ApiError::Validation("Empty batch".to_string()));
    }

    if req.metrics.len() > state.config.max_batch_size {
        return Err(ApiError::Validation(format!(
            "Batch size exceeds maximum of {} metrics",
            state.config.max_batch_size
        )));
    }

    let documents = req
        .metrics
        .into_iter()
        .map(to_document)
        .collect::<DiscoveryResult<Vec<_>>>()?;

    let indexed = state.discovery.insert_discovery(documents).await?;

    tracing::info!(indexed, "Indexed metric discovery batch");

    Ok((StatusCode::CREATED, Json(DiscoveryIngestResponse { indexed })))
}

fn to_document(req: MetricDiscoveryRequest) -> DiscoveryResult<DiscoveryDocument> {
    let mut annotations = Annotations::for_metric(req.unit.as_deref(), req.data_type.as_deref());
    if let Some(extra) = req.annotations {
        for (key, value) in extra.iter() {
            annotations.insert(key, value.clone());
        }
    }

    DiscoveryDocument::new(&req.tenant_id, req.metric_name.as_deref(), annotations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::AnnotationValue;

    fn request(metric_name: Option<&str>) -> MetricDiscoveryRequest {
        MetricDiscoveryRequest {
            tenant_id: "t".to_string(),
            metric_name: metric_name.map(str::to_string),
            unit: Some("ms".to_string()),
            data_type: Some("number".to_string()),
            annotations: Some(Annotations::new().with("rollup", "avg")),
        }
    }

    #[test]
    fn test_to_document_merges_annotations() {
        let doc = to_document(request(Some("a.b"))).unwrap();
        assert_eq!(doc.document_id(), "t:a.b");
        assert_eq!(doc.annotations().unit(), Some("ms"));
        assert_eq!(
            doc.annotations().get("rollup"),
            Some(&AnnotationValue::Text("avg".to_string()))
        );
        assert_eq!(doc.annotations().len(), 3);
    }

    #[test]
    fn test_to_document_requires_metric_name() {
        assert!(to_document(request(None)).unwrap_err().is_invalid_argument());
    }
}
