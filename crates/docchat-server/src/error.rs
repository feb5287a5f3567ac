use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rate limit exceeded")]
    TooManyRequests { retry_after_secs: u64 },
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<docchat_core::Error> for ApiError {
    fn from(err: docchat_core::Error) -> Self {
        if err.is_client_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::TooManyRequests { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE.to_string())
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "success": false, "error": message }));
        let mut response = (status, body).into_response();
        if let ApiError::TooManyRequests { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_core::{Error, ProviderKind};

    #[test]
    fn test_core_error_mapping() {
        let missing = Error::ProviderNotAvailable {
            requested: "watsonx".to_string(),
            available: vec![ProviderKind::OpenAI],
        };
        assert!(matches!(ApiError::from(missing), ApiError::BadRequest(_)));
        assert!(matches!(
            ApiError::from(Error::Retrieval("down".to_string())),
            ApiError::Internal(_)
        ));
        assert!(matches!(
            ApiError::from(Error::generation(ProviderKind::OpenAI, "quota")),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::BadRequest("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        let limited = ApiError::TooManyRequests { retry_after_secs: 9 }.into_response();
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited.headers()[header::RETRY_AFTER], "9");
    }
}
