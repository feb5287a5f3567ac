//! Request bodies and their validation

use serde::Deserialize;

use docchat_core::{AskOptions, DEFAULT_MAX_CONTEXT_DOCS, ProviderKind};

use crate::error::ApiError;

pub const MAX_MESSAGE_CHARS: usize = 2000;
pub const MAX_CONTEXT_DOCS: i64 = 10;

/// Body of `POST /api/chat`. Fields stay optional so missing ones produce
/// a validation message instead of a deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: Option<String>,
    pub provider: Option<String>,
    pub max_context_docs: Option<i64>,
    pub include_context: Option<bool>,
}

/// Body of `POST /api/chat/context`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextRequest {
    pub question: Option<String>,
    pub max_docs: Option<i64>,
}

impl ChatRequest {
    pub fn validate(self) -> Result<(String, AskOptions), ApiError> {
        let message = validate_text("Message", self.message)?;
        let provider = self.provider.as_deref().map(validate_provider).transpose()?;
        let max_context_docs = validate_doc_count("maxContextDocs", self.max_context_docs)?;

        Ok((
            message,
            AskOptions {
                provider,
                max_context_docs,
                include_context: self.include_context.unwrap_or(false),
            },
        ))
    }
}

impl ContextRequest {
    pub fn validate(self) -> Result<(String, usize), ApiError> {
        let question = validate_text("Question", self.question)?;
        let max_docs = validate_doc_count("maxDocs", self.max_docs)?;
        Ok((question, max_docs))
    }
}

fn validate_text(field: &str, value: Option<String>) -> Result<String, ApiError> {
    let value = value.ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))?;
    let trimmed = value.trim();
    let length = trimmed.chars().count();
    if length == 0 || length > MAX_MESSAGE_CHARS {
        return Err(ApiError::BadRequest(format!(
            "{} must be between 1 and {} characters",
            field, MAX_MESSAGE_CHARS
        )));
    }
    Ok(trimmed.to_string())
}

/// Only the canonical lowercase names are accepted over HTTP
fn validate_provider(name: &str) -> Result<ProviderKind, ApiError> {
    ProviderKind::all()
        .into_iter()
        .find(|kind| kind.as_str() == name)
        .ok_or_else(|| {
            let names: Vec<&str> = ProviderKind::all().iter().map(|k| k.as_str()).collect();
            ApiError::BadRequest(format!("Provider must be one of: {}", names.join(", ")))
        })
}

fn validate_doc_count(field: &str, value: Option<i64>) -> Result<usize, ApiError> {
    match value {
        None => Ok(DEFAULT_MAX_CONTEXT_DOCS),
        Some(n) if (1..=MAX_CONTEXT_DOCS).contains(&n) => Ok(n as usize),
        Some(_) => Err(ApiError::BadRequest(format!(
            "{} must be between 1 and {}",
            field, MAX_CONTEXT_DOCS
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chat(body: serde_json::Value) -> Result<(String, AskOptions), ApiError> {
        serde_json::from_value::<ChatRequest>(body).unwrap().validate()
    }

    fn message_of(result: Result<(String, AskOptions), ApiError>) -> String {
        match result {
            Err(ApiError::BadRequest(msg)) => msg,
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_request_defaults() {
        let (message, options) = chat(json!({"message": "  How do I start tracing?  "})).unwrap();
        assert_eq!(message, "How do I start tracing?");
        assert_eq!(options, AskOptions::default());
    }

    #[test]
    fn test_valid_request_with_options() {
        let (_, options) = chat(json!({
            "message": "q",
            "provider": "anthropic",
            "maxContextDocs": 10,
            "includeContext": true
        }))
        .unwrap();
        assert_eq!(options.provider, Some(ProviderKind::Anthropic));
        assert_eq!(options.max_context_docs, 10);
        assert!(options.include_context);
    }

    #[test]
    fn test_message_bounds() {
        assert_eq!(message_of(chat(json!({}))), "Message is required");
        assert_eq!(
            message_of(chat(json!({"message": "   "}))),
            "Message must be between 1 and 2000 characters"
        );
        let long = "é".repeat(2001);
        assert!(chat(json!({"message": long})).is_err());
        let max = "é".repeat(2000);
        assert!(chat(json!({"message": max})).is_ok());
    }

    #[test]
    fn test_provider_must_be_canonical() {
        assert_eq!(
            message_of(chat(json!({"message": "q", "provider": "mistral"}))),
            "Provider must be one of: openai, anthropic, google, watsonx"
        );
        assert!(chat(json!({"message": "q", "provider": "claude"})).is_err());
    }

    #[test]
    fn test_context_doc_bounds() {
        assert!(chat(json!({"message": "q", "maxContextDocs": 0})).is_err());
        assert!(chat(json!({"message": "q", "maxContextDocs": 11})).is_err());
        assert!(chat(json!({"message": "q", "maxContextDocs": 1})).is_ok());

        let request: ContextRequest =
            serde_json::from_value(json!({"question": "q", "maxDocs": 3})).unwrap();
        assert_eq!(request.validate().unwrap(), ("q".to_string(), 3));
    }
}
