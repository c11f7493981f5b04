//! Request handlers backed by the embedded node.
//!
//! - `GET /healthz`: node state as JSON, 503 unless the node is running
//! - `GET /kv/{key}`: value bytes, 404 if absent
//! - `PUT /kv/{key}`: store body, 201 on insert, 204 on overwrite
//! - `DELETE /kv/{key}`: 204, 404 if absent
//!
//! Any key/value call against a node that is not running returns 503, so a
//! request racing node shutdown fails fast instead of hanging.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::node::{EmbeddedNode, NodeError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub node: Arc<EmbeddedNode>,
}

pub async fn healthz(State(state): State<AppState>) -> Response {
    let node_state = state.node.state();
    let status = if node_state.accepts_operations() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(json!({ "node": node_state.as_str() }))).into_response()
}

pub async fn get_key(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.node.get(&key) {
        Ok(Some(value)) => (StatusCode::OK, value).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => unavailable(e),
    }
}

pub async fn put_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Response {
    match state.node.put(key, body) {
        Ok(None) => StatusCode::CREATED.into_response(),
        Ok(Some(_)) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => unavailable(e),
    }
}

pub async fn delete_key(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.node.delete(&key) {
        Ok(Some(_)) => StatusCode::NO_CONTENT.into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => unavailable(e),
    }
}

fn unavailable(err: NodeError) -> Response {
    tracing::warn!(error = %err, "Rejecting request, node unavailable");
    (StatusCode::SERVICE_UNAVAILABLE, err.to_string()).into_response()
}
