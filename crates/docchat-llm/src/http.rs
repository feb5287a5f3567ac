//! Shared HTTP plumbing for the provider clients

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::error;

use docchat_core::{Error, ProviderKind, Result};

/// Build a client with the per-call timeout applied
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Network(e.to_string()))
}

/// Map a transport failure to a core error
pub(crate) fn send_error(provider: ProviderKind, err: reqwest::Error) -> Error {
    error!(provider = %provider, error = %err, "request failed");
    if err.is_timeout() {
        Error::Timeout(format!("{} request timed out", provider.display_name()))
    } else {
        Error::Network(format!("{} request failed: {}", provider.display_name(), err))
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Turn a non-success response into an error carrying the API's message
pub(crate) async fn ensure_success(provider: ProviderKind, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let detail = error_detail(&body);
    error!(provider = %provider, %status, "API error");

    Err(status_error(provider, status, &detail))
}

pub(crate) fn status_error(provider: ProviderKind, status: StatusCode, detail: &str) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Authentication(format!(
            "{} rejected the credentials ({}): {}",
            provider.display_name(),
            status,
            detail
        )),
        _ => Error::generation(
            provider,
            format!("API request failed with status {}: {}", status, detail),
        ),
    }
}

/// Pull `error.message` out of a JSON error body, falling back to the raw text
pub(crate) fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_prefers_json_message() {
        let body = r#"{"error":{"message":"Rate limit reached","type":"rate_limit"}}"#;
        assert_eq!(error_detail(body), "Rate limit reached");
        assert_eq!(error_detail(" upstream down \n"), "upstream down");
    }

    #[test]
    fn test_status_error_classification() {
        let err = status_error(ProviderKind::OpenAI, StatusCode::UNAUTHORIZED, "bad key");
        assert!(matches!(err, Error::Authentication(_)));

        let err = status_error(ProviderKind::Google, StatusCode::TOO_MANY_REQUESTS, "quota");
        assert_eq!(
            err.to_string(),
            "Generation error (google): API request failed with status 429 Too Many Requests: quota"
        );
    }
}
