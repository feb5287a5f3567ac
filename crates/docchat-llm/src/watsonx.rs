//! WatsonX AI client implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use docchat_core::{
    ChatMessage, Error, GenerationConfig, GenerationResult, LLMProvider, ProviderKind, Result,
    Role,
};

use crate::config::WatsonxConfig;
use crate::http::{build_client, ensure_success, send_error};

/// Tokens are refreshed this long before IAM says they expire
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// WatsonX AI client
///
/// The IAM access token is fetched on first use and cached until shortly
/// before it expires.
pub struct WatsonxClient {
    config: WatsonxConfig,
    generation: GenerationConfig,
    client: Client,
    token: RwLock<Option<CachedToken>>,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    apikey: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerationParams {
    decoding_method: &'static str,
    max_new_tokens: u32,
    min_new_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    repetition_penalty: f32,
    stop_sequences: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerationRequest {
    input: String,
    parameters: GenerationParams,
    model_id: String,
    project_id: String,
}

#[derive(Debug, Deserialize)]
struct GenerationResults {
    generated_text: String,
    #[serde(default)]
    generated_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerationData {
    results: Vec<GenerationResults>,
}

impl WatsonxClient {
    /// Create a new WatsonX client from configuration
    pub fn new(config: WatsonxConfig, generation: GenerationConfig) -> Result<Self> {
        let client = build_client(generation.timeout)?;
        Ok(Self {
            config,
            generation,
            client,
            token: RwLock::new(None),
        })
    }

    /// Render role-tagged messages into a single prompt for the text generation API
    pub(crate) fn render_prompt(messages: &[ChatMessage]) -> String {
        let mut prompt = String::new();
        for message in messages {
            let label = match message.role {
                Role::System => "System",
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            prompt.push_str(&format!("{}: {}\n\n", label, message.content));
        }
        prompt.push_str("Assistant:");
        prompt
    }

    pub(crate) fn build_request(&self, messages: &[ChatMessage]) -> GenerationRequest {
        let sampling = self.generation.temperature > 0.0;
        GenerationRequest {
            input: Self::render_prompt(messages),
            parameters: GenerationParams {
                decoding_method: if sampling { "sample" } else { "greedy" },
                max_new_tokens: self.generation.max_tokens,
                min_new_tokens: 1,
                temperature: sampling.then_some(self.generation.temperature),
                repetition_penalty: 1.1,
                stop_sequences: vec!["User:".to_string(), "System:".to_string()],
            },
            model_id: self.config.model.clone(),
            project_id: self.config.project_id.clone(),
        }
    }

    /// Join the generated text and strip the role label the model sometimes echoes
    pub(crate) fn parse_response(&self, data: GenerationData) -> Result<GenerationResult> {
        let tokens_used = data
            .results
            .iter()
            .filter_map(|r| r.generated_token_count)
            .reduce(|a, b| a + b);
        let answer: String = data
            .results
            .into_iter()
            .map(|r| r.generated_text)
            .collect();

        let mut cleaned = answer.trim();
        if let Some(rest) = cleaned.strip_prefix("Assistant:") {
            cleaned = rest.trim();
        }
        if let Some(pos) = cleaned.find("\nUser:") {
            cleaned = cleaned[..pos].trim();
        }

        if cleaned.is_empty() {
            return Err(Error::generation(
                ProviderKind::Watsonx,
                "Empty response from WatsonX API",
            ));
        }

        Ok(GenerationResult {
            text: cleaned.to_string(),
            model_id: self.config.model.clone(),
            tokens_used,
        })
    }

    /// Return a valid IAM access token, exchanging the API key when needed
    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        let mut guard = self.token.write().await;
        if let Some(token) = guard.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        debug!(iam_url = %self.config.iam_url, "requesting watsonx access token");
        let url = format!("https://{}/identity/token", self.config.iam_url);
        let response = self
            .client
            .post(&url)
            .form(&TokenRequest {
                grant_type: "urn:ibm:params:oauth:grant-type:apikey",
                apikey: &self.config.api_key,
            })
            .send()
            .await
            .map_err(|e| send_error(ProviderKind::Watsonx, e))?;

        if !response.status().is_success() {
            return Err(Error::Authentication(format!(
                "Authentication failed: {}",
                response.status()
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let lifetime = Duration::from_secs(token_response.expires_in)
            .saturating_sub(TOKEN_REFRESH_MARGIN);
        let token = CachedToken {
            value: token_response.access_token,
            expires_at: Instant::now() + lifetime,
        };
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }
}

#[async_trait]
impl LLMProvider for WatsonxClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Watsonx
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<GenerationResult> {
        let access_token = self.access_token().await?;
        debug!(model = %self.config.model, messages = messages.len(), "calling WatsonX");

        let url = format!(
            "{}/ml/v1/text/generation?version=2023-05-29",
            self.config.api_url
        );
        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .bearer_auth(access_token)
            .json(&self.build_request(messages))
            .send()
            .await
            .map_err(|e| send_error(ProviderKind::Watsonx, e))?;

        let data: GenerationData = ensure_success(ProviderKind::Watsonx, response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        self.parse_response(data)
    }
}
