//! Registry of configured LLM providers

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::llm::{ChatMessage, LLMProvider, ProviderKind, ProviderTestResult};
use crate::{Error, Result};

/// Message sent by [`ProviderRegistry::test_provider`]
pub const SMOKE_TEST_MESSAGE: &str = "Hello! Please respond with 'OK' if you can read this.";

/// Holds the providers registered at startup.
///
/// Entries keep registration order. The registry is never mutated after
/// construction and is shared behind an `Arc`.
pub struct ProviderRegistry {
    providers: Vec<(ProviderKind, Arc<dyn LLMProvider>)>,
    default_provider: ProviderKind,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.available_providers())
            .field("default_provider", &self.default_provider)
            .finish()
    }
}

impl ProviderRegistry {
    /// Build a registry from already constructed clients.
    ///
    /// Fails when no provider is registered, when a provider is registered
    /// twice, or when `default_provider` names a provider that is absent.
    pub fn new(
        providers: Vec<Arc<dyn LLMProvider>>,
        default_provider: Option<ProviderKind>,
    ) -> Result<Self> {
        let mut entries: Vec<(ProviderKind, Arc<dyn LLMProvider>)> = Vec::new();
        for provider in providers {
            let kind = provider.kind();
            if entries.iter().any(|(k, _)| *k == kind) {
                return Err(Error::Configuration(format!(
                    "Provider '{}' registered more than once",
                    kind
                )));
            }
            entries.push((kind, provider));
        }

        let Some((first, _)) = entries.first() else {
            return Err(Error::Configuration(
                "No LLM providers configured. Set at least one of OPENAI_API_KEY, \
                 ANTHROPIC_API_KEY, GOOGLE_API_KEY or WATSONX_API_KEY"
                    .to_string(),
            ));
        };
        let first = *first;

        let default_provider = match default_provider {
            Some(kind) if entries.iter().any(|(k, _)| *k == kind) => kind,
            Some(kind) => {
                return Err(Error::Configuration(format!(
                    "Default provider '{}' is not configured",
                    kind
                )));
            }
            None => first,
        };

        info!(
            providers = ?entries.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            default = %default_provider,
            "LLM provider registry initialized"
        );

        Ok(Self {
            providers: entries,
            default_provider,
        })
    }

    /// The provider used when a request names none
    pub fn default_provider(&self) -> ProviderKind {
        self.default_provider
    }

    /// Registered provider names, in registration order
    pub fn available_providers(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|(kind, _)| *kind).collect()
    }

    /// Whether a provider is registered
    pub fn contains(&self, kind: ProviderKind) -> bool {
        self.providers.iter().any(|(k, _)| *k == kind)
    }

    /// Return the named provider, or the default one when `kind` is `None`
    pub fn get_provider(&self, kind: Option<ProviderKind>) -> Result<Arc<dyn LLMProvider>> {
        let kind = kind.unwrap_or(self.default_provider);
        self.providers
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, provider)| Arc::clone(provider))
            .ok_or_else(|| self.not_available(kind.as_str()))
    }

    /// Look a provider up by its raw name
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn LLMProvider>> {
        let kind = name
            .parse::<ProviderKind>()
            .map_err(|_| self.not_available(name))?;
        self.get_provider(Some(kind))
    }

    /// Send the smoke-test message to one provider.
    ///
    /// Every failure, including an unknown or unregistered name, is reported
    /// in the returned value.
    pub async fn test_provider(&self, name: &str) -> ProviderTestResult {
        let provider = match self.resolve(name) {
            Ok(provider) => provider,
            Err(e) => {
                warn!(provider = name, error = %e, "provider test skipped");
                return ProviderTestResult::failed(name, e);
            }
        };

        let label = provider.kind().as_str();
        match provider.generate(&[ChatMessage::user(SMOKE_TEST_MESSAGE)]).await {
            Ok(result) => ProviderTestResult::ok(label, result.text),
            Err(e) => {
                warn!(provider = label, error = %e, "provider test failed");
                ProviderTestResult::failed(label, e)
            }
        }
    }

    /// Smoke-test every registered provider concurrently
    pub async fn test_all_providers(&self) -> Vec<ProviderTestResult> {
        join_all(
            self.providers
                .iter()
                .map(|(kind, _)| self.test_provider(kind.as_str())),
        )
        .await
    }

    fn not_available(&self, requested: &str) -> Error {
        Error::ProviderNotAvailable {
            requested: requested.to_string(),
            available: self.available_providers(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::GenerationResult;
    use async_trait::async_trait;

    struct StaticProvider {
        kind: ProviderKind,
        reply: std::result::Result<String, String>,
    }

    #[async_trait]
    impl LLMProvider for StaticProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn model_id(&self) -> &str {
            "static-model"
        }

        async fn generate(&self, _messages: &[ChatMessage]) -> Result<GenerationResult> {
            match &self.reply {
                Ok(text) => Ok(GenerationResult {
                    text: text.clone(),
                    model_id: "static-model".to_string(),
                    tokens_used: None,
                }),
                Err(message) => Err(Error::generation(self.kind, message.clone())),
            }
        }
    }

    fn provider(kind: ProviderKind) -> Arc<dyn LLMProvider> {
        Arc::new(StaticProvider {
            kind,
            reply: Ok("OK".to_string()),
        })
    }

    #[test]
    fn test_empty_registry_is_configuration_error() {
        let err = ProviderRegistry::new(vec![], None).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_duplicate_provider_rejected() {
        let err = ProviderRegistry::new(
            vec![provider(ProviderKind::OpenAI), provider(ProviderKind::OpenAI)],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_default_must_be_registered() {
        let err = ProviderRegistry::new(
            vec![provider(ProviderKind::Anthropic)],
            Some(ProviderKind::OpenAI),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_default_falls_back_to_first_registered() {
        let registry = ProviderRegistry::new(
            vec![provider(ProviderKind::Google), provider(ProviderKind::Anthropic)],
            None,
        )
        .unwrap();
        assert_eq!(registry.default_provider(), ProviderKind::Google);
        assert_eq!(
            registry.available_providers(),
            vec![ProviderKind::Google, ProviderKind::Anthropic]
        );
        assert_eq!(registry.get_provider(None).unwrap().kind(), ProviderKind::Google);
    }

    #[test]
    fn test_get_provider_lists_available_on_miss() {
        let registry = ProviderRegistry::new(
            vec![provider(ProviderKind::Anthropic), provider(ProviderKind::Google)],
            Some(ProviderKind::Google),
        )
        .unwrap();

        let err = registry.get_provider(Some(ProviderKind::OpenAI)).err().unwrap();
        let message = err.to_string();
        assert!(message.contains("anthropic"));
        assert!(message.contains("google"));

        let err = registry.resolve("nonexistent-name").err().unwrap();
        match err {
            Error::ProviderNotAvailable {
                requested,
                available,
            } => {
                assert_eq!(requested, "nonexistent-name");
                assert_eq!(available, vec![ProviderKind::Anthropic, ProviderKind::Google]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_provider_test_for_missing_provider_is_data() {
        let registry =
            ProviderRegistry::new(vec![provider(ProviderKind::Anthropic)], None).unwrap();

        let result = registry.test_provider("openai").await;
        assert!(!result.success);
        assert!(result.response.is_none());
        let error = result.error.unwrap();
        assert!(error.contains("'openai' is not available"));
        assert!(error.contains("anthropic"));
    }

    #[tokio::test]
    async fn test_provider_test_reports_generation_failure() {
        let failing: Arc<dyn LLMProvider> = Arc::new(StaticProvider {
            kind: ProviderKind::Watsonx,
            reply: Err("quota exceeded".to_string()),
        });
        let registry = ProviderRegistry::new(vec![failing], None).unwrap();

        let result = registry.test_provider("watsonx").await;
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Generation error (watsonx): quota exceeded")
        );
    }

    #[tokio::test]
    async fn test_all_providers_keeps_registration_order() {
        let registry = ProviderRegistry::new(
            vec![provider(ProviderKind::Watsonx), provider(ProviderKind::OpenAI)],
            None,
        )
        .unwrap();

        let results = registry.test_all_providers().await;
        let names: Vec<_> = results.iter().map(|r| r.provider.as_str()).collect();
        assert_eq!(names, vec!["watsonx", "openai"]);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(results[0].response.as_deref(), Some("OK"));
    }
}
