use std::sync::Arc;

use axum::extract::{Path, State};
use serde::Serialize;

use docchat_core::{ProviderKind, ProviderTestResult};

use super::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProviderList {
    pub providers: Vec<ProviderKind>,
    pub default: ProviderKind,
}

pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<ProviderList> {
    Ok(ApiResponse::ok(ProviderList {
        providers: state.engine.available_providers(),
        default: state.engine.default_provider(),
    }))
}

/// Smoke-test one provider; failures are reported in the body with status 200
pub async fn test_one(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<ProviderTestResult> {
    Ok(ApiResponse::ok(state.engine.test_provider(&name).await))
}

pub async fn test_all(State(state): State<Arc<AppState>>) -> ApiResult<Vec<ProviderTestResult>> {
    Ok(ApiResponse::ok(state.engine.test_all_providers().await))
}
