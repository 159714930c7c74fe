//! Search Routes
//!
//! - GET /api/v1/search?tenant=T&query=P - Single glob pattern
//! - POST /api/v1/search - Several patterns, de-duplicated union
//! - GET /api/v1/search/next-level?tenant=T&prefix=P - One level below a prefix

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{BatchSearchRequest, NextLevelParams, SearchParams, SearchResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::discovery::DiscoveryIo;

/// GET /api/v1/search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    let results = state.discovery.search(&params.tenant, &params.query).await?;
    Ok(Json(results.into()))
}

/// POST /api/v1/search
pub async fn search_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchSearchRequest>,
) -> ApiResult<Json<SearchResponse>> {
    if req.queries.is_empty() {
        return Err(ApiError::Validation("No queries given".to_string()));
    }

    let results = state
        .discovery
        .search_batch(&req.tenant, &req.queries)
        .await?;
    Ok(Json(results.into()))
}

/// GET /api/v1/search/next-level
pub async fn search_next_level(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NextLevelParams>,
) -> ApiResult<Json<SearchResponse>> {
    let results = state
        .discovery
        .search_next_level(&params.tenant, &params.prefix)
        .await?;
    Ok(Json(results.into()))
}
