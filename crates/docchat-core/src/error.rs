//! Error types for docchat

use thiserror::Error;

use crate::llm::ProviderKind;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the docchat system
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error(
        "Provider '{requested}' is not available. Available providers: {}",
        format_providers(.available)
    )]
    ProviderNotAvailable {
        requested: String,
        available: Vec<ProviderKind>,
    },

    #[error("Generation error ({provider}): {message}")]
    Generation {
        provider: ProviderKind,
        message: String,
    },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a generation failure reported by a provider
    pub fn generation(provider: ProviderKind, message: impl Into<String>) -> Self {
        Error::Generation {
            provider,
            message: message.into(),
        }
    }

    /// Whether the failure was caused by the caller rather than a backend
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::ProviderNotAvailable { .. } | Error::InvalidInput(_)
        )
    }
}

fn format_providers(available: &[ProviderKind]) -> String {
    if available.is_empty() {
        return "none".to_string();
    }
    available
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_not_available_lists_providers() {
        let err = Error::ProviderNotAvailable {
            requested: "nonexistent-name".to_string(),
            available: vec![ProviderKind::Anthropic, ProviderKind::Google],
        };
        assert_eq!(
            err.to_string(),
            "Provider 'nonexistent-name' is not available. Available providers: anthropic, google"
        );
        assert!(err.is_client_error());
    }

    #[test]
    fn test_provider_not_available_with_empty_registry() {
        let err = Error::ProviderNotAvailable {
            requested: "openai".to_string(),
            available: vec![],
        };
        assert!(err.to_string().ends_with("Available providers: none"));
    }

    #[test]
    fn test_generation_error_display() {
        let err = Error::generation(ProviderKind::OpenAI, "quota exceeded");
        assert_eq!(err.to_string(), "Generation error (openai): quota exceeded");
        assert!(!err.is_client_error());
    }
}
