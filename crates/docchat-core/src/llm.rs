//! LLM provider trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

/// Supported chat-model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions
    OpenAI,
    /// Anthropic messages API
    Anthropic,
    /// Google Gemini
    Google,
    /// IBM watsonx.ai
    Watsonx,
}

impl ProviderKind {
    /// Identifier used in configuration and requests
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
            ProviderKind::Watsonx => "watsonx",
        }
    }

    /// Get the display name for this provider
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Google => "Google Gemini",
            ProviderKind::Watsonx => "IBM watsonx.ai",
        }
    }

    /// All providers, in registration order
    pub fn all() -> [ProviderKind; 4] {
        [
            ProviderKind::OpenAI,
            ProviderKind::Anthropic,
            ProviderKind::Google,
            ProviderKind::Watsonx,
        ]
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAI),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "google" | "gemini" => Ok(ProviderKind::Google),
            "watsonx" | "ibm" => Ok(ProviderKind::Watsonx),
            other => Err(Error::InvalidInput(format!(
                "Unknown provider '{}'. Expected one of: openai, anthropic, google, watsonx",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A role-tagged chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Generation parameters shared by every provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Result of a text generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    pub model_id: String,
    pub tokens_used: Option<u32>,
}

/// Trait for chat-model providers (OpenAI, Anthropic, Gemini, watsonx)
///
/// Implementations are constructed once at startup and shared read-only
/// across requests, so `generate` takes `&self`.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Which provider this client talks to
    fn kind(&self) -> ProviderKind;

    /// Get the model ID being used
    fn model_id(&self) -> &str;

    /// Send role-tagged messages and return the generated text
    async fn generate(&self, messages: &[ChatMessage]) -> Result<GenerationResult>;
}

/// Outcome of a provider smoke test. Failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderTestResult {
    pub provider: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderTestResult {
    pub fn ok(provider: impl Into<String>, response: String) -> Self {
        Self {
            provider: provider.into(),
            success: true,
            response: Some(response),
            error: None,
        }
    }

    pub fn failed(provider: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            provider: provider.into(),
            success: false,
            response: None,
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_from_str() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
        assert_eq!("Anthropic".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert_eq!("gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Google);
        assert_eq!(" WATSONX ".parse::<ProviderKind>().unwrap(), ProviderKind::Watsonx);
        assert!("mistral".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_provider_kind_serde_names() {
        let json = serde_json::to_string(&ProviderKind::all()).unwrap();
        assert_eq!(json, r#"["openai","anthropic","google","watsonx"]"#);

        let parsed: ProviderKind = serde_json::from_str("\"google\"").unwrap();
        assert_eq!(parsed, ProviderKind::Google);
    }

    #[test]
    fn test_provider_kind_display() {
        assert_eq!(ProviderKind::OpenAI.to_string(), "openai");
        assert_eq!(ProviderKind::Watsonx.display_name(), "IBM watsonx.ai");
    }

    #[test]
    fn test_chat_message_roles_serialize_lowercase() {
        let message = ChatMessage::user("hello");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "hello");
    }

    #[test]
    fn test_provider_test_result_skips_empty_fields() {
        let failed = ProviderTestResult::failed("openai", "not configured");
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "not configured");
        assert!(value.get("response").is_none());
    }
}
