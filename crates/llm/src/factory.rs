//! Backend construction from settings

use std::sync::Arc;
use std::time::Duration;

use lead_agent_config::{LlmConfig, LlmProvider};
use lead_agent_core::LanguageModel;

use crate::backend::{OpenAIBackend, OpenAIConfig};
use crate::offline::OfflineBackend;
use crate::retry::RetryPolicy;
use crate::LlmError;

/// Create the configured language model
pub fn create_language_model(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>, LlmError> {
    let retry = RetryPolicy::new(
        config.max_attempts,
        Duration::from_millis(config.initial_backoff_ms),
    );
    let api_key = config.api_key.clone().unwrap_or_default();

    let openai_config = match config.provider {
        LlmProvider::Offline => {
            tracing::info!("Using offline language model");
            return Ok(Arc::new(OfflineBackend::new()));
        }
        LlmProvider::OpenAI => OpenAIConfig {
            endpoint: config.endpoint.clone(),
            ..OpenAIConfig::openai(api_key, config.model.clone())
        },
        LlmProvider::Azure => OpenAIConfig::azure(
            config.endpoint.clone(),
            api_key,
            config.model.clone(),
            config.api_version.clone(),
        ),
    };

    let openai_config = OpenAIConfig {
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        timeout: Duration::from_secs(config.timeout_secs),
        retry,
        ..openai_config
    };

    tracing::info!(
        provider = ?config.provider,
        model = %openai_config.model,
        "Using chat-completion backend"
    );
    Ok(Arc::new(OpenAIBackend::new(openai_config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_by_default() {
        let llm = create_language_model(&LlmConfig::default()).unwrap();
        assert_eq!(llm.model_name(), "offline");
    }

    #[test]
    fn test_remote_requires_key() {
        let config = LlmConfig {
            provider: LlmProvider::OpenAI,
            api_key: None,
            ..Default::default()
        };
        assert!(create_language_model(&config).is_err());
    }

    #[test]
    fn test_azure_backend() {
        let config = LlmConfig {
            provider: LlmProvider::Azure,
            endpoint: "https://contoso.openai.azure.com".to_string(),
            api_key: Some("key".to_string()),
            model: "leads-gpt4".to_string(),
            ..Default::default()
        };
        let llm = create_language_model(&config).unwrap();
        assert_eq!(llm.model_name(), "leads-gpt4");
    }
}
