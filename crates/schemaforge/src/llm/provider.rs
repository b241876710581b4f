//! LLM provider trait and configuration.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// Configuration shared by all LLM providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model to use (e.g., "claude-sonnet-4-20250514").
    pub model: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Extra attempts after a failed call. Zero means call once and degrade.
    pub max_retries: u32,

    /// Base backoff between attempts in milliseconds, multiplied by the
    /// attempt number.
    pub retry_backoff_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            timeout_secs: 60,
            max_retries: 0,
            retry_backoff_ms: 500,
        }
    }
}

impl LlmConfig {
    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Enable capped retries with linear backoff.
    pub fn with_retries(mut self, max_retries: u32, backoff_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff_ms = backoff_ms;
        self
    }

    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Trait for LLM providers.
///
/// Implementations must be thread-safe (Send + Sync) so a single provider
/// can be shared by the classifier and the schema synthesizer.
pub trait LlmProvider: Send + Sync {
    /// Complete a prompt.
    ///
    /// # Arguments
    /// * `prompt` - The user prompt
    /// * `max_output_tokens` - Upper bound on generated tokens
    /// * `temperature` - Sampling temperature (0.0-1.0)
    ///
    /// # Returns
    /// The raw response text. No retries happen inside a provider.
    fn complete(&self, prompt: &str, max_output_tokens: usize, temperature: f64)
    -> Result<String>;

    /// Get the configuration for this provider.
    fn config(&self) -> &LlmConfig;

    /// Get the name of this provider (for logging/debugging).
    fn name(&self) -> &str;
}

/// Call a provider, retrying up to `config().max_retries` extra times.
///
/// Each region or content type is passed through here exactly once, so a
/// retried call never produces a second result.
pub fn complete_with_retry(
    provider: &dyn LlmProvider,
    prompt: &str,
    max_output_tokens: usize,
    temperature: f64,
) -> Result<String> {
    let config = provider.config();
    let mut attempt = 0;

    loop {
        match provider.complete(prompt, max_output_tokens, temperature) {
            Ok(text) => return Ok(text),
            Err(e) if attempt < config.max_retries => {
                attempt += 1;
                warn!(
                    provider = provider.name(),
                    attempt,
                    error = %e,
                    "LLM call failed, retrying"
                );
                thread::sleep(Duration::from_millis(
                    config.retry_backoff_ms * u64::from(attempt),
                ));
            }
            Err(e) => return Err(e),
        }
    }
}
