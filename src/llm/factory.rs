use anyhow::{bail, Result};

use super::client::{LlmClient, MockLlmClient};
use super::client_impl::{AnthropicClient, GeminiClient, OpenAIClient};
use crate::config::LlmConfig;

/// Create the LLM client described by `llm_config`.
///
/// The credential is looked up here but its absence is not an error yet;
/// hosted providers report it when the request is made.
pub fn create_client(llm_config: &LlmConfig, dry_run: bool) -> Result<Box<dyn LlmClient>> {
    if dry_run {
        return Ok(Box::new(MockLlmClient::new()));
    }

    let api_key = llm_config.resolve_api_key();
    let model = llm_config.model.clone();
    let max_tokens = llm_config.get_max_tokens();
    let timeout = llm_config.timeout_secs;
    let base_url = llm_config.base_url.clone();

    match llm_config.provider.as_str() {
        "gemini" => match base_url {
            Some(url) => Ok(Box::new(GeminiClient::with_base_url(
                api_key, model, url, max_tokens, timeout,
            )?)),
            None => Ok(Box::new(GeminiClient::new(
                api_key, model, max_tokens, timeout,
            )?)),
        },

        "anthropic" => match base_url {
            Some(url) => Ok(Box::new(AnthropicClient::with_base_url(
                api_key, model, url, max_tokens, timeout,
            )?)),
            None => Ok(Box::new(AnthropicClient::new(
                api_key, model, max_tokens, timeout,
            )?)),
        },

        "openai" => Ok(Box::new(OpenAIClient::new(
            api_key, model, max_tokens, timeout,
        )?)),

        "openai-compatible" => {
            let base_url = base_url.unwrap_or_else(|| "http://localhost:11434/v1".to_string());
            Ok(Box::new(OpenAIClient::with_base_url(
                api_key, model, base_url, max_tokens, timeout,
            )?))
        }

        unknown => bail!("Unknown LLM provider: {}", unknown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_create_mock_client_for_dry_run() {
        let mut config = Config::default();
        // Even an unknown provider is fine in dry-run mode
        config.llm.provider = "nope".to_string();
        create_client(&config.llm, true).unwrap();
    }

    #[test]
    fn test_create_each_known_provider() {
        let mut llm = Config::default().llm;
        for provider in ["gemini", "anthropic", "openai", "openai-compatible"] {
            llm.provider = provider.to_string();
            assert!(
                create_client(&llm, false).is_ok(),
                "provider {} should build",
                provider
            );
        }
    }

    #[test]
    fn test_missing_key_does_not_fail_construction() {
        let mut llm = Config::default().llm;
        llm.api_key_env = Some("SKILL2CMD_TEST_NONEXISTENT_KEY_FACTORY".to_string());
        assert!(create_client(&llm, false).is_ok());
    }

    #[test]
    fn test_unknown_provider() {
        let mut llm = Config::default().llm;
        llm.provider = "unknown_provider".to_string();
        let err = create_client(&llm, false).err().unwrap();
        assert!(err.to_string().contains("Unknown LLM provider"));
    }
}
