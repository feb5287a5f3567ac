use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let engine = &state.engine;
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "vectorStore": engine.collection_info(),
        "providers": engine.available_providers(),
        "defaultProvider": engine.default_provider(),
    }))
}
