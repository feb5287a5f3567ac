//! Provider configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use docchat_core::env::{parse_or, process_env, read, read_or};
use docchat_core::{Error, GenerationConfig, ProviderKind, Result};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_GOOGLE_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_WATSONX_MODEL: &str = "ibm/granite-3-3-8b-instruct";
pub const DEFAULT_WATSONX_API_URL: &str = "https://us-south.ml.cloud.ibm.com";
pub const DEFAULT_IAM_URL: &str = "iam.cloud.ibm.com";

/// Credentials and model for an API-key based provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

/// Configuration for the watsonx.ai client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatsonxConfig {
    pub api_key: String,
    pub project_id: String,
    pub iam_url: String,
    pub api_url: String,
    pub model: String,
}

impl WatsonxConfig {
    /// Create configuration with explicit values
    pub fn new(api_key: String, project_id: String) -> Self {
        Self {
            api_key,
            project_id,
            iam_url: DEFAULT_IAM_URL.to_string(),
            api_url: DEFAULT_WATSONX_API_URL.to_string(),
            model: DEFAULT_WATSONX_MODEL.to_string(),
        }
    }
}

/// Everything needed to build the provider registry
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub openai: Option<ApiKeyConfig>,
    pub anthropic: Option<ApiKeyConfig>,
    pub google: Option<ApiKeyConfig>,
    pub watsonx: Option<WatsonxConfig>,
    pub default_provider: Option<ProviderKind>,
    pub generation: GenerationConfig,
}

impl LlmConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(process_env)
    }

    /// Create configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai = api_key_config(
            &lookup,
            "OPENAI",
            DEFAULT_OPENAI_MODEL,
            DEFAULT_OPENAI_BASE_URL,
        )?;
        let anthropic = api_key_config(
            &lookup,
            "ANTHROPIC",
            DEFAULT_ANTHROPIC_MODEL,
            DEFAULT_ANTHROPIC_BASE_URL,
        )?;
        let google = api_key_config(
            &lookup,
            "GOOGLE",
            DEFAULT_GOOGLE_MODEL,
            DEFAULT_GOOGLE_BASE_URL,
        )?;

        let watsonx = match read(&lookup, "WATSONX_API_KEY") {
            Some(api_key) => {
                let project_id = read(&lookup, "WATSONX_PROJECT_ID").ok_or_else(|| {
                    Error::Configuration(
                        "WATSONX_API_KEY is set but WATSONX_PROJECT_ID is missing".to_string(),
                    )
                })?;
                let api_url = read_or(&lookup, "WATSONX_API_URL", DEFAULT_WATSONX_API_URL);
                validate_url("WATSONX_API_URL", &api_url)?;
                Some(WatsonxConfig {
                    api_key,
                    project_id,
                    iam_url: read_or(&lookup, "IAM_IBM_CLOUD_URL", DEFAULT_IAM_URL),
                    api_url,
                    model: read_or(&lookup, "WATSONX_MODEL", DEFAULT_WATSONX_MODEL),
                })
            }
            None => None,
        };

        let default_provider = read(&lookup, "DEFAULT_LLM_PROVIDER")
            .map(|name| {
                name.parse::<ProviderKind>()
                    .map_err(|e| Error::Configuration(format!("DEFAULT_LLM_PROVIDER: {}", e)))
            })
            .transpose()?;

        let defaults = GenerationConfig::default();
        let temperature: f32 = parse_or(&lookup, "LLM_TEMPERATURE", defaults.temperature)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(Error::Configuration(format!(
                "LLM_TEMPERATURE must be between 0 and 2, got {}",
                temperature
            )));
        }
        let generation = GenerationConfig {
            temperature,
            max_tokens: parse_or(&lookup, "LLM_MAX_TOKENS", defaults.max_tokens)?,
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "LLM_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )?),
        };

        Ok(Self {
            openai,
            anthropic,
            google,
            watsonx,
            default_provider,
            generation,
        })
    }

    /// Providers with credentials present, in registration order
    pub fn configured_providers(&self) -> Vec<ProviderKind> {
        ProviderKind::all()
            .into_iter()
            .filter(|kind| match kind {
                ProviderKind::OpenAI => self.openai.is_some(),
                ProviderKind::Anthropic => self.anthropic.is_some(),
                ProviderKind::Google => self.google.is_some(),
                ProviderKind::Watsonx => self.watsonx.is_some(),
            })
            .collect()
    }
}

fn api_key_config<F>(
    lookup: &F,
    prefix: &str,
    default_model: &str,
    default_base_url: &str,
) -> Result<Option<ApiKeyConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(api_key) = read(lookup, &format!("{}_API_KEY", prefix)) else {
        return Ok(None);
    };

    let base_url_key = format!("{}_BASE_URL", prefix);
    let base_url = read_or(lookup, &base_url_key, default_base_url)
        .trim_end_matches('/')
        .to_string();
    validate_url(&base_url_key, &base_url)?;

    Ok(Some(ApiKeyConfig {
        api_key,
        model: read_or(lookup, &format!("{}_MODEL", prefix), default_model),
        base_url,
    }))
}

fn validate_url(key: &str, value: &str) -> Result<()> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| Error::Configuration(format!("Invalid URL '{}' for {}: {}", value, key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<LlmConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LlmConfig::from_lookup(move |key| map.get(key).cloned())
    }

    #[test]
    fn test_only_credentialed_providers_are_configured() {
        let config = config_from(&[
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("GOOGLE_API_KEY", "g-key"),
            ("OPENAI_API_KEY", "  "),
        ])
        .unwrap();

        assert_eq!(
            config.configured_providers(),
            vec![ProviderKind::Anthropic, ProviderKind::Google]
        );
        let anthropic = config.anthropic.unwrap();
        assert_eq!(anthropic.model, DEFAULT_ANTHROPIC_MODEL);
        assert_eq!(anthropic.base_url, DEFAULT_ANTHROPIC_BASE_URL);
    }

    #[test]
    fn test_generation_defaults_and_overrides() {
        let config = config_from(&[
            ("OPENAI_API_KEY", "sk"),
            ("LLM_TEMPERATURE", "0.2"),
            ("LLM_MAX_TOKENS", "512"),
        ])
        .unwrap();

        assert_eq!(config.generation.temperature, 0.2);
        assert_eq!(config.generation.max_tokens, 512);
        assert_eq!(config.generation.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_values_are_configuration_errors() {
        assert!(config_from(&[("LLM_MAX_TOKENS", "lots")]).is_err());
        assert!(config_from(&[("LLM_TEMPERATURE", "3.5")]).is_err());
        assert!(config_from(&[("DEFAULT_LLM_PROVIDER", "mistral")]).is_err());
        assert!(config_from(&[("OPENAI_API_KEY", "sk"), ("OPENAI_BASE_URL", "not a url")]).is_err());
    }

    #[test]
    fn test_watsonx_requires_project_id() {
        let err = config_from(&[("WATSONX_API_KEY", "key")]).unwrap_err();
        assert!(err.to_string().contains("WATSONX_PROJECT_ID"));

        let config = config_from(&[
            ("WATSONX_API_KEY", "key"),
            ("WATSONX_PROJECT_ID", "project"),
            ("DEFAULT_LLM_PROVIDER", "watsonx"),
        ])
        .unwrap();
        assert_eq!(config.default_provider, Some(ProviderKind::Watsonx));
        assert_eq!(config.watsonx.unwrap().iam_url, DEFAULT_IAM_URL);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = config_from(&[
            ("OPENAI_API_KEY", "sk"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
        ])
        .unwrap();
        assert_eq!(config.openai.unwrap().base_url, "http://localhost:8080/v1");
    }
}
