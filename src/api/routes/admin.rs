//! Admin Routes
//!
//! Index cutover for reindexing without downtime.
//!
//! - GET /api/v1/admin/indices - Active and configured index names
//! - PUT /api/v1/admin/indices/read - Switch the read index
//! - PUT /api/v1/admin/indices/write - Switch the write index
//! - POST /api/v1/admin/indices/reset - Restore configured names

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{IndexTargetsResponse, SetIndexRequest, SetIndexResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /api/v1/admin/indices
pub async fn get_indices(State(state): State<Arc<AppState>>) -> Json<IndexTargetsResponse> {
    Json(current(&state))
}

/// PUT /api/v1/admin/indices/read
pub async fn set_read_index(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetIndexRequest>,
) -> ApiResult<Json<SetIndexResponse>> {
    let previous = state.discovery.targets().set_read_index(&req.name)?;
    Ok(Json(SetIndexResponse {
        previous,
        current: req.name,
    }))
}

/// PUT /api/v1/admin/indices/write
pub async fn set_write_index(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetIndexRequest>,
) -> ApiResult<Json<SetIndexResponse>> {
    let previous = state.discovery.targets().set_write_index(&req.name)?;
    Ok(Json(SetIndexResponse {
        previous,
        current: req.name,
    }))
}

/// POST /api/v1/admin/indices/reset
pub async fn reset_indices(State(state): State<Arc<AppState>>) -> Json<IndexTargetsResponse> {
    state.discovery.targets().reset();
    Json(current(&state))
}

fn current(state: &AppState) -> IndexTargetsResponse {
    let targets = state.discovery.targets();
    let (default_read, default_write) = targets.defaults();
    IndexTargetsResponse {
        read_index: targets.read_index().to_string(),
        write_index: targets.write_index().to_string(),
        default_read_index: default_read.to_string(),
        default_write_index: default_write.to_string(),
    }
}
