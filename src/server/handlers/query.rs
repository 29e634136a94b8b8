use std::sync::Arc;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::rag::Answer;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ContextEntry {
    pub title: String,
    pub source_url: String,
    pub score: f32,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub context: Vec<ContextEntry>,
}

impl From<Answer> for QueryResponse {
    fn from(answer: Answer) -> Self {
        Self {
            answer: answer.text,
            context: answer
                .context
                .into_iter()
                .map(|hit| ContextEntry {
                    title: hit.passage.title,
                    source_url: hit.passage.source_url,
                    score: hit.score,
                })
                .collect(),
        }
    }
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let answer = state.orchestrator.answer(&payload.query).await?;
    Ok(Json(answer.into()))
}
