use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A single-shot text generation capability: one prompt in, one completion out.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

const DRY_RUN_RESPONSE: &str = r#"```toml
description = "Dry run: compiled skill command"
prompt = """
I am running a dry-run build of this command. No model was called, so this prompt
only confirms that the skill archive was read and packaged correctly.

Now, carry out the task according to the user's request below:
"""
```"#;

/// Offline client used for `--dry-run` and tests.
///
/// Returns a fixed response (fenced like a real model would) and counts calls
/// so callers can assert that no request was made.
pub struct MockLlmClient {
    response: std::result::Result<String, String>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::with_response(DRY_RUN_RESPONSE)
    }

    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: Ok(response.into()),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every call fails with `message`, as a transport error would.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep before answering, to exercise cancellation and timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared call counter; stays valid after the client is boxed and moved.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(message) => bail!("{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_default_response_has_anchor() {
        let client = MockLlmClient::new();
        let out = client.complete("anything").await.unwrap();
        assert!(out.contains("description ="));
        assert!(out.contains("prompt ="));
    }

    #[tokio::test]
    async fn test_mock_counts_calls() {
        let client = MockLlmClient::with_response("x");
        let counter = client.call_counter();
        client.complete("a").await.unwrap();
        client.complete("b").await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_mock_failing() {
        let client = MockLlmClient::failing("429 Too Many Requests");
        let err = client.complete("a").await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }
}
