use std::sync::Arc;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "started_at": state.started_at.to_rfc3339(),
        "corpus_size": state.orchestrator.store().len(),
        "top_k": state.orchestrator.config().top_k
    }))
}
