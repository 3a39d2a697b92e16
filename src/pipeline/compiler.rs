use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::context::ContextBlob;
use super::normalizer::{extract_document, CompiledDocument};
use crate::error::{CompileError, Result};
use crate::llm::client::LlmClient;
use crate::llm::prompts;

/// Templating, the single model call, and response extraction as one step.
pub struct PromptCompiler {
    client: Box<dyn LlmClient>,
    timeout: Option<Duration>,
}

impl PromptCompiler {
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Give up on the model call after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send the templated prompt and return the raw response text.
    ///
    /// The request future is dropped, which aborts the HTTP call, as soon as
    /// `cancel` fires. Failures are never retried here.
    pub async fn invoke(&self, prompt: &str, cancel: &CancellationToken) -> Result<String> {
        let request = self.client.complete(prompt);

        let outcome = match self.timeout {
            Some(limit) => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CompileError::Cancelled),
                res = tokio::time::timeout(limit, request) => match res {
                    Ok(inner) => inner,
                    Err(_) => Err(anyhow::anyhow!(
                        "model request timed out after {}s",
                        limit.as_secs_f64()
                    )),
                },
            },
            None => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CompileError::Cancelled),
                res = request => res,
            },
        };

        outcome.map_err(CompileError::ModelInvocation)
    }

    pub async fn compile(
        &self,
        blob: &ContextBlob,
        cancel: &CancellationToken,
    ) -> Result<CompiledDocument> {
        let prompt = prompts::render_compile_prompt(blob.as_str());
        info!("Compiling skill with the model ({} prompt chars)", prompt.len());

        let raw = self.invoke(&prompt, cancel).await?;
        debug!("Model returned {} chars", raw.len());

        extract_document(&raw)
    }
}
