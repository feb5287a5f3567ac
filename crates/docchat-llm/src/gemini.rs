//! Google Gemini `generateContent` client

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

pub struct GeminiClient {
    config: ApiKeyConfig,
    generation: GenerationConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u32>,
}

impl GeminiClient {
    pub fn new(config: ApiKeyConfig, generation: GenerationConfig) -> Result<Self> {
        let client = build_client(generation.timeout)?;
        Ok(Self {
            config,
            generation,
            client,
        })
    }

    pub(crate) fn build_request<'a>(
        &self,
        messages: &'a [ChatMessage],
    ) -> GenerateContentRequest<'a> {
        let system_parts: Vec<Part<'a>> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| Part { text: &m.content })
            .collect();

        let contents = messages
            .iter()
            .filter_map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                    Role::System => return None,
                };
                Some(Content {
                    role: Some(role),
                    parts: vec![Part { text: &m.content }],
                })
            })
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction: (!system_parts.is_empty()).then(|| Content {
                role: None,
                parts: system_parts,
            }),
            generation_config: GeminiGenerationConfig {
                temperature: self.generation.temperature,
                max_output_tokens: self.generation.max_tokens,
            },
        }
    }

    pub(crate) fn parse_response(
        &self,
        response: GenerateContentResponse,
    ) -> Result<GenerationResult> {
        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::generation(
                ProviderKind::Google,
                "Empty response from Gemini API",
            ));
        }

        Ok(GenerationResult {
            text,
            model_id: self.config.model.clone(),
            tokens_used: response.usage_metadata.and_then(|u| u.total_token_count),
        })
    }
}

#[async_trait]
impl LLMProvider for GeminiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<GenerationResult> {
        debug!(model = %self.config.model, messages = messages.len(), "calling Gemini");

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&self.build_request(messages))
            .send()
            .await
            .map_err(|e| send_error(ProviderKind::Google, e))?;

        let body: GenerateContentResponse = ensure_success(ProviderKind::Google, response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        self.parse_response(body)
    }
}
