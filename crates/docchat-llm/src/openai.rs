//! OpenAI chat completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use docchat_core::{
    ChatMessage, Error, GenerationConfig, GenerationResult, LLMProvider, ProviderKind, Result,
};

use crate::config::ApiKeyConfig;
use crate::http::{build_client, ensure_success, send_error};

/// Client for `POST {base_url}/chat/completions`
pub struct OpenAIClient {
    config: ApiKeyConfig,
    generation: GenerationConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

impl OpenAIClient {
    pub fn new(config: ApiKeyConfig, generation: GenerationConfig) -> Result<Self> {
        let client = build_client(generation.timeout)?;
        Ok(Self {
            config,
            generation,
            client,
        })
    }

    pub(crate) fn build_request<'a>(
        &'a self,
        messages: &'a [ChatMessage],
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.generation.temperature,
            max_tokens: self.generation.max_tokens,
        }
    }

    pub(crate) fn parse_response(&self, response: ChatCompletionResponse) -> Result<GenerationResult> {
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                Error::generation(ProviderKind::OpenAI, "Empty response from OpenAI API")
            })?;

        Ok(GenerationResult {
            text,
            model_id: self.config.model.clone(),
            tokens_used: response.usage.map(|u| u.total_tokens),
        })
    }
}

#[async_trait]
impl LLMProvider for OpenAIClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<GenerationResult> {
        debug!(model = %self.config.model, messages = messages.len(), "calling OpenAI");

        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&self.build_request(messages))
            .send()
            .await
            .map_err(|e| send_error(ProviderKind::OpenAI, e))?;

        let body: ChatCompletionResponse = ensure_success(ProviderKind::OpenAI, response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        self.parse_response(body)
    }
}
