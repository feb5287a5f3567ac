pub mod chat;
pub mod health;
pub mod providers;

use axum::Json;
use serde::Serialize;

use crate::error::ApiError;

/// Success envelope shared by the `/api` routes
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
