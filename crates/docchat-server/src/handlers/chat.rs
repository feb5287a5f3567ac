use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::{error, info};

use docchat_core::{ChatResponse, CollectionInfo, ContextResult};

use super::{ApiResponse, ApiResult};
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{ChatRequest, ContextRequest};

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatResponse> {
    let (message, options) = body(payload)?.validate()?;
    info!(
        provider = ?options.provider,
        chars = message.chars().count(),
        "chat request"
    );

    let response = state
        .engine
        .ask_question(&message, options)
        .await
        .inspect_err(|e| error!(error = %e, "chat request failed"))?;
    Ok(ApiResponse::ok(response))
}

pub async fn context(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ContextRequest>, JsonRejection>,
) -> ApiResult<ContextResult> {
    let (question, max_docs) = body(payload)?.validate()?;
    let result = state
        .engine
        .get_context_for_question(&question, max_docs)
        .await
        .inspect_err(|e| error!(error = %e, "context request failed"))?;
    Ok(ApiResponse::ok(result))
}

pub async fn collection(State(state): State<Arc<AppState>>) -> ApiResult<CollectionInfo> {
    Ok(ApiResponse::ok(state.engine.collection_info()))
}
