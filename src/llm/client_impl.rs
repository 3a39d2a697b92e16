use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::api_key::ApiKey;
use super::client::LlmClient;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

fn build_http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build HTTP client")
}

/// Fail before sending anything when a hosted provider has no credential.
fn require_key(api_key: &ApiKey, provider: &str) -> Result<()> {
    if api_key.is_absent() {
        bail!(
            "{} API key is not set; export the variable named by llm.api_key_env",
            provider
        );
    }
    Ok(())
}

/// Turn a non-2xx response into an error carrying status and body.
async fn check_status(response: Response, provider: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    bail!("{} API error {}: {}", provider, status, error_text);
}

// ============================================================================
// Gemini Client (Google Generative AI)
// ============================================================================

pub struct GeminiClient {
    api_key: ApiKey,
    model: String,
    base_url: String,
    max_tokens: u32,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn new(api_key: ApiKey, model: String, max_tokens: u32, timeout_secs: u64) -> Result<Self> {
        Self::with_base_url(
            api_key,
            model,
            GEMINI_BASE_URL.to_string(),
            max_tokens,
            timeout_secs,
        )
    }

    pub fn with_base_url(
        api_key: ApiKey,
        model: String,
        base_url: String,
        max_tokens: u32,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_tokens,
            client: build_http_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        require_key(&self.api_key, "Gemini")?;

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(GeminiGenerationConfig {
                max_output_tokens: self.max_tokens,
            }),
        };

        debug!("Calling Gemini API with model: {}", self.model);

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose())
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        let api_response: GeminiResponse = check_status(response, "Gemini")
            .await?
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        // A candidate may split its text across several parts.
        let text: String = api_response
            .candidates
            .first()
            .map(|c| c.content.parts.iter().map(|p| p.text.as_str()).collect())
            .context("No candidates in Gemini response")?;

        if text.is_empty() {
            bail!("Gemini response contained no text");
        }
        Ok(text)
    }
}

// ============================================================================
// Anthropic Client
// ============================================================================

pub struct AnthropicClient {
    api_key: ApiKey,
    model: String,
    base_url: String,
    max_tokens: u32,
    client: Client,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

impl AnthropicClient {
    pub fn new(api_key: ApiKey, model: String, max_tokens: u32, timeout_secs: u64) -> Result<Self> {
        Self::with_base_url(
            api_key,
            model,
            ANTHROPIC_BASE_URL.to_string(),
            max_tokens,
            timeout_secs,
        )
    }

    pub fn with_base_url(
        api_key: ApiKey,
        model: String,
        base_url: String,
        max_tokens: u32,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_tokens,
            client: build_http_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        require_key(&self.api_key, "Anthropic")?;

        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        debug!("Calling Anthropic API with model: {}", self.model);

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?;

        let api_response: AnthropicResponse = check_status(response, "Anthropic")
            .await?
            .json()
            .await
            .context("Failed to parse Anthropic API response")?;

        // Thinking and tool blocks may precede the answer
        let text: String = api_response
            .content
            .iter()
            .filter(|c| c.kind == "text")
            .map(|c| c.text.as_str())
            .collect();

        if text.is_empty() {
            bail!("Anthropic response contained no text");
        }
        Ok(text)
    }
}

// ============================================================================
// OpenAI Client (also serves OpenAI-compatible gateways and local servers)
// ============================================================================

pub struct OpenAIClient {
    api_key: ApiKey,
    model: String,
    base_url: String,
    max_tokens: u32,
    key_required: bool,
    client: Client,
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: ChatMessage,
}

impl OpenAIClient {
    pub fn new(api_key: ApiKey, model: String, max_tokens: u32, timeout_secs: u64) -> Result<Self> {
        let mut client = Self::with_base_url(
            api_key,
            model,
            OPENAI_BASE_URL.to_string(),
            max_tokens,
            timeout_secs,
        )?;
        client.key_required = true;
        Ok(client)
    }

    /// Custom endpoint; the key is optional and only sent when present.
    pub fn with_base_url(
        api_key: ApiKey,
        model: String,
        base_url: String,
        max_tokens: u32,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_tokens,
            key_required: false,
            client: build_http_client(timeout_secs)?,
        })
    }

    fn build_request(&self, prompt: &str) -> OpenAIRequest {
        // Newer OpenAI models reject max_tokens in favour of max_completion_tokens
        let (max_tokens, max_completion_tokens) = if self.model.starts_with("gpt-5") {
            (None, Some(self.max_tokens))
        } else {
            (Some(self.max_tokens), None)
        };

        OpenAIRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens,
            max_completion_tokens,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if self.key_required {
            require_key(&self.api_key, "OpenAI")?;
        }

        let request = self.build_request(prompt);

        debug!(
            "Calling OpenAI-compatible API at {} with model: {}",
            self.base_url, self.model
        );

        let mut req = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("content-type", "application/json")
            .json(&request);

        if !self.api_key.is_absent() {
            req = req.header("authorization", format!("Bearer {}", self.api_key.expose()));
        }

        let response = req
            .send()
            .await
            .context("Failed to send request to OpenAI API")?;

        let api_response: OpenAIResponse = check_status(response, "OpenAI")
            .await?
            .json()
            .await
            .context("Failed to parse OpenAI API response")?;

        api_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .context("No choices in OpenAI response")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_client_creation() {
        let client = GeminiClient::new(
            ApiKey::new("test_key"),
            "gemini-2.5-pro".to_string(),
            8192,
            120,
        )
        .unwrap();
        assert_eq!(client.api_key.expose(), "test_key");
        assert_eq!(client.model, "gemini-2.5-pro");
        assert_eq!(client.base_url, GEMINI_BASE_URL);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = AnthropicClient::with_base_url(
            ApiKey::new("k"),
            "claude".to_string(),
            "http://localhost:8080/v1/".to_string(),
            4096,
            120,
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_gemini_request_structure() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: "test".to_string(),
                }],
            }],
            generation_config: Some(GeminiGenerationConfig {
                max_output_tokens: 16384,
            }),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "test");
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 16384);
    }

    #[test]
    fn test_gemini_response_missing_text_defaults_empty() {
        let json = r#"{"candidates": [{"content": {"parts": [{}]}}]}"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.candidates[0].content.parts[0].text, "");
    }

    #[test]
    fn test_gemini_response_without_candidates() {
        let json = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(response.candidates.is_empty());
    }

    #[test]
    fn test_anthropic_response_parsing() {
        let json = r#"{"content": [{"type": "text", "text": "Hello, world!"}]}"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.content[0].kind, "text");
        assert_eq!(response.content[0].text, "Hello, world!");
    }

    #[test]
    fn test_openai_gpt5_uses_max_completion_tokens() {
        let client = OpenAIClient::new(ApiKey::new("k"), "gpt-5".to_string(), 4096, 120).unwrap();
        let json = serde_json::to_value(client.build_request("hi")).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert_eq!(json["max_completion_tokens"], 4096);
    }

    #[test]
    fn test_openai_older_model_uses_max_tokens() {
        let client = OpenAIClient::new(ApiKey::new("k"), "gpt-4o".to_string(), 2048, 120).unwrap();
        let json = serde_json::to_value(client.build_request("hi")).unwrap();
        assert_eq!(json["max_tokens"], 2048);
        assert!(json.get("max_completion_tokens").is_none());
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[tokio::test]
    async fn test_hosted_clients_fail_without_key_at_call_time() {
        let gemini =
            GeminiClient::new(ApiKey::default(), "gemini".to_string(), 1024, 5).unwrap();
        let err = gemini.complete("x").await.unwrap_err();
        assert!(err.to_string().contains("API key is not set"));

        let openai = OpenAIClient::new(ApiKey::default(), "gpt-4o".to_string(), 1024, 5).unwrap();
        assert!(openai.complete("x").await.is_err());
    }
}
