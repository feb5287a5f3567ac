//! Chat-model provider clients for docchat
//!
//! This crate provides the OpenAI, Anthropic, Gemini and watsonx implementations of
//! the `LLMProvider` trait, and builds the provider registry from configuration.

mod anthropic;
mod config;
mod gemini;
mod http;
mod openai;
mod watsonx;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::{debug, info};

pub use anthropic::AnthropicClient;
pub use config::{ApiKeyConfig, LlmConfig, WatsonxConfig};
pub use gemini::GeminiClient;
pub use openai::OpenAIClient;
pub use watsonx::WatsonxClient;

// Re-export core types for convenience
pub use docchat_core::{
    ChatMessage, Error, GenerationConfig, GenerationResult, LLMProvider, ProviderKind,
    ProviderRegistry, ProviderTestResult, Result,
};

/// Construct a client for every provider whose credentials are configured.
///
/// Registration follows `ProviderKind::all()` order. Fails when nothing is
/// configured, so a process cannot start without a usable provider.
pub fn build_registry(config: &LlmConfig) -> Result<ProviderRegistry> {
    let generation = &config.generation;
    let mut providers: Vec<Arc<dyn LLMProvider>> = Vec::new();

    for kind in ProviderKind::all() {
        let provider = match kind {
            ProviderKind::OpenAI => match &config.openai {
                Some(c) => Some(shared(OpenAIClient::new(c.clone(), generation.clone())?)),
                None => None,
            },
            ProviderKind::Anthropic => match &config.anthropic {
                Some(c) => Some(shared(AnthropicClient::new(c.clone(), generation.clone())?)),
                None => None,
            },
            ProviderKind::Google => match &config.google {
                Some(c) => Some(shared(GeminiClient::new(c.clone(), generation.clone())?)),
                None => None,
            },
            ProviderKind::Watsonx => match &config.watsonx {
                Some(c) => Some(shared(WatsonxClient::new(c.clone(), generation.clone())?)),
                None => None,
            },
        };

        match provider {
            Some(provider) => {
                info!(provider = %kind, model = provider.model_id(), "registered LLM provider");
                providers.push(provider);
            }
            None => debug!(provider = %kind, "no credentials, provider skipped"),
        }
    }

    ProviderRegistry::new(providers, config.default_provider)
}

fn shared<P: LLMProvider + 'static>(provider: P) -> Arc<dyn LLMProvider> {
    Arc::new(provider)
}
