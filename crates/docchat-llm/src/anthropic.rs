//! Anthropic messages API client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use docchat_core::{
    ChatMessage, Error, GenerationConfig, GenerationResult, LLMProvider, ProviderKind, Result,
    Role,
};

use crate::config::ApiKeyConfig;
use crate::http::{build_client, ensure_success, send_error};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for `POST {base_url}/messages`
pub struct AnthropicClient {
    config: ApiKeyConfig,
    generation: GenerationConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicClient {
    pub fn new(config: ApiKeyConfig, generation: GenerationConfig) -> Result<Self> {
        let client = build_client(generation.timeout)?;
        Ok(Self {
            config,
            generation,
            client,
        })
    }

    /// System messages move to the top-level `system` field
    pub(crate) fn build_request<'a>(&'a self, messages: &'a [ChatMessage]) -> MessagesRequest<'a> {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let messages = messages
            .iter()
            .filter_map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::System => return None,
                };
                Some(AnthropicMessage {
                    role,
                    content: &m.content,
                })
            })
            .collect();

        MessagesRequest {
            model: &self.config.model,
            max_tokens: self.generation.max_tokens,
            temperature: self.generation.temperature.min(1.0),
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            messages,
        }
    }

    pub(crate) fn parse_response(&self, response: MessagesResponse) -> Result<GenerationResult> {
        let text: String = response
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect();

        if text.trim().is_empty() {
            return Err(Error::generation(
                ProviderKind::Anthropic,
                "Empty response from Anthropic API",
            ));
        }

        Ok(GenerationResult {
            text,
            model_id: self.config.model.clone(),
            tokens_used: response.usage.map(|u| u.input_tokens + u.output_tokens),
        })
    }
}

#[async_trait]
impl LLMProvider for AnthropicClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<GenerationResult> {
        debug!(model = %self.config.model, messages = messages.len(), "calling Anthropic");

        let url = format!("{}/messages", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.build_request(messages))
            .send()
            .await
            .map_err(|e| send_error(ProviderKind::Anthropic, e))?;

        let body: MessagesResponse = ensure_success(ProviderKind::Anthropic, response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        self.parse_response(body)
    }
}
