//! Snapshot tests for the provider clients

#[cfg(test)]
mod snapshot_tests {
    use crate::anthropic::MessagesResponse;
    use crate::gemini::GenerateContentResponse;
    use crate::openai::ChatCompletionResponse;
    use crate::watsonx::GenerationData;
    use crate::{
        build_registry, AnthropicClient, ApiKeyConfig, ChatMessage, Error, GeminiClient,
        GenerationConfig, LLMProvider, LlmConfig, OpenAIClient, ProviderKind, WatsonxClient,
        WatsonxConfig,
    };
    use insta::{assert_json_snapshot, assert_yaml_snapshot};
    use serde_json::json;
    use std::time::Duration;

    fn generation() -> GenerationConfig {
        GenerationConfig {
            temperature: 0.5,
            max_tokens: 256,
            timeout: Duration::from_secs(5),
        }
    }

    fn api_key_config(model: &str) -> ApiKeyConfig {
        ApiKeyConfig {
            api_key: "test_key".to_string(),
            model: model.to_string(),
            base_url: "http://localhost:9999".to_string(),
        }
    }

    fn conversation() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("Answer briefly"),
            ChatMessage::user("What is a span"),
        ]
    }

    #[test]
    fn test_watsonx_config_snapshot() {
        let config = WatsonxConfig::new(
            "test_api_key_redacted".to_string(),
            "test_project_id".to_string(),
        );

        assert_yaml_snapshot!(config, @r###"
        api_key: test_api_key_redacted
        project_id: test_project_id
        iam_url: iam.cloud.ibm.com
        api_url: "https://us-south.ml.cloud.ibm.com"
        model: ibm/granite-3-3-8b-instruct
        "###);
    }

    #[test]
    fn test_openai_request_snapshot() {
        let client = OpenAIClient::new(api_key_config("gpt-4o-mini"), generation()).unwrap();
        let messages = conversation();

        assert_json_snapshot!(client.build_request(&messages), @r###"
        {
          "model": "gpt-4o-mini",
          "messages": [
            {
              "role": "system",
              "content": "Answer briefly"
            },
            {
              "role": "user",
              "content": "What is a span"
            }
          ],
          "temperature": 0.5,
          "max_tokens": 256
        }
        "###);
    }

    #[test]
    fn test_anthropic_request_moves_system_prompt() {
        let client = AnthropicClient::new(api_key_config("claude-test"), generation()).unwrap();
        let messages = conversation();

        let body = serde_json::to_value(client.build_request(&messages)).unwrap();
        assert_eq!(body["system"], "Answer briefly");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], 256);
    }

    #[test]
    fn test_gemini_request_uses_model_role_and_system_instruction() {
        let client = GeminiClient::new(api_key_config("gemini-test"), generation()).unwrap();
        let messages = vec![
            ChatMessage::system("Answer briefly"),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
            ChatMessage::user("What is a span"),
        ];

        let body = serde_json::to_value(client.build_request(&messages)).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Answer briefly");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"].as_array().unwrap().len(), 3);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
    }

    #[test]
    fn test_watsonx_prompt_rendering() {
        let prompt = WatsonxClient::render_prompt(&conversation());
        assert_eq!(
            prompt,
            "System: Answer briefly\n\nUser: What is a span\n\nAssistant:"
        );
    }

    #[test]
    fn test_watsonx_greedy_decoding_at_zero_temperature() {
        let config = WatsonxConfig::new("key".to_string(), "project".to_string());
        let generation = GenerationConfig {
            temperature: 0.0,
            ..generation()
        };
        let client = WatsonxClient::new(config, generation).unwrap();

        let body = serde_json::to_value(client.build_request(&conversation())).unwrap();
        assert_eq!(body["parameters"]["decoding_method"], "greedy");
        assert!(body["parameters"].get("temperature").is_none());
        assert_eq!(body["project_id"], "project");
    }

    #[test]
    fn test_response_parsing() {
        let openai = OpenAIClient::new(api_key_config("gpt-4o-mini"), generation()).unwrap();
        let parsed: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "A span is a unit of work."}}],
            "usage": {"total_tokens": 42}
        }))
        .unwrap();
        let result = openai.parse_response(parsed).unwrap();
        assert_eq!(result.text, "A span is a unit of work.");
        assert_eq!(result.tokens_used, Some(42));

        let anthropic = AnthropicClient::new(api_key_config("claude-test"), generation()).unwrap();
        let parsed: MessagesResponse = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "Hello"}, {"type": "text", "text": " there"}],
            "usage": {"input_tokens": 3, "output_tokens": 2}
        }))
        .unwrap();
        let result = anthropic.parse_response(parsed).unwrap();
        assert_eq!(result.text, "Hello there");
        assert_eq!(result.tokens_used, Some(5));

        let gemini = GeminiClient::new(api_key_config("gemini-test"), generation()).unwrap();
        let parsed: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "OK"}], "role": "model"}}],
            "usageMetadata": {"totalTokenCount": 7}
        }))
        .unwrap();
        let result = gemini.parse_response(parsed).unwrap();
        assert_eq!(result.text, "OK");
        assert_eq!(result.tokens_used, Some(7));

        let watsonx = WatsonxClient::new(
            WatsonxConfig::new("key".to_string(), "project".to_string()),
            generation(),
        )
        .unwrap();
        let parsed: GenerationData = serde_json::from_value(json!({
            "results": [{"generated_text": " Assistant: OK\nUser: again", "generated_token_count": 4}]
        }))
        .unwrap();
        let result = watsonx.parse_response(parsed).unwrap();
        assert_eq!(result.text, "OK");
        assert_eq!(result.tokens_used, Some(4));
    }

    #[test]
    fn test_empty_responses_are_generation_errors() {
        let openai = OpenAIClient::new(api_key_config("gpt-4o-mini"), generation()).unwrap();
        let parsed: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": []})).unwrap();
        let err = openai.parse_response(parsed).unwrap_err();
        assert!(matches!(
            err,
            Error::Generation {
                provider: ProviderKind::OpenAI,
                ..
            }
        ));

        let gemini = GeminiClient::new(api_key_config("gemini-test"), generation()).unwrap();
        let parsed: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(gemini.parse_response(parsed).is_err());
    }

    #[test]
    fn test_build_registry_registers_configured_providers_in_order() {
        let config = LlmConfig {
            openai: None,
            anthropic: Some(api_key_config("claude-test")),
            google: None,
            watsonx: Some(WatsonxConfig::new("key".to_string(), "project".to_string())),
            default_provider: Some(ProviderKind::Watsonx),
            generation: generation(),
        };

        let registry = build_registry(&config).unwrap();
        assert_eq!(
            registry.available_providers(),
            vec![ProviderKind::Anthropic, ProviderKind::Watsonx]
        );
        assert_eq!(registry.default_provider(), ProviderKind::Watsonx);
        assert_eq!(
            registry.get_provider(None).unwrap().model_id(),
            "ibm/granite-3-3-8b-instruct"
        );
    }

    #[test]
    fn test_build_registry_without_credentials_fails() {
        let config = LlmConfig {
            openai: None,
            anthropic: None,
            google: None,
            watsonx: None,
            default_provider: None,
            generation: generation(),
        };
        assert!(matches!(build_registry(&config), Err(Error::Configuration(_))));
    }
}
