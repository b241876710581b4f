//! Mock LLM provider for testing and offline runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::{json, Value};

use crate::detection::Fields;
use crate::error::{ForgeError, Result};
use crate::schema::infer_field_table;

use super::prompts::{
    labelled_value, CONFIDENCE_LABEL, DETECTED_TYPE_LABEL, EXAMPLES_LABEL, PRE_FIELDS_LABEL,
};
use super::provider::{LlmConfig, LlmProvider};

enum Mode {
    /// Reflect the context embedded in the prompt.
    Echo,
    /// Pop canned responses, then fall back to echoing.
    Scripted(Mutex<VecDeque<String>>),
    /// Fail every call with this message.
    Failing(String),
}

/// Mock LLM provider that returns predictable responses.
///
/// In echo mode a classification prompt is answered with its own signature
/// pre-analysis, and a schema prompt with a field table inferred from its
/// examples.
pub struct MockProvider {
    config: LlmConfig,
    mode: Mode,
    calls: AtomicUsize,
}

impl MockProvider {
    /// Create an echoing mock provider.
    pub fn new() -> Self {
        Self::with_mode(Mode::Echo)
    }

    /// Answer calls with `responses` in order, echoing once they run out.
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue = responses.into_iter().map(Into::into).collect();
        Self::with_mode(Mode::Scripted(Mutex::new(queue)))
    }

    /// Fail every call with an `Llm` error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_mode(Mode::Failing(message.into()))
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: LlmConfig) -> Self {
        self.config = config;
        self
    }

    /// Number of `complete` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            config: LlmConfig::default().with_model("mock"),
            mode,
            calls: AtomicUsize::new(0),
        }
    }

    fn next_scripted(queue: &Mutex<VecDeque<String>>) -> Option<String> {
        queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for MockProvider {
    fn complete(&self, prompt: &str, _max_output_tokens: usize, _temperature: f64) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.mode {
            Mode::Failing(message) => Err(ForgeError::Llm(message.clone())),
            Mode::Scripted(queue) => {
                Ok(Self::next_scripted(queue).unwrap_or_else(|| echo(prompt)))
            }
            Mode::Echo => Ok(echo(prompt)),
        }
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn echo(prompt: &str) -> String {
    if let Some(content_type) = labelled_value(prompt, DETECTED_TYPE_LABEL) {
        let confidence = labelled_value(prompt, CONFIDENCE_LABEL)
            .and_then(|c| c.parse::<f64>().ok())
            .unwrap_or(0.0);
        let fields = labelled_value(prompt, PRE_FIELDS_LABEL)
            .and_then(|f| serde_json::from_str::<Value>(f).ok())
            .unwrap_or_else(|| json!({}));

        return json!({
            "type": content_type,
            "confidence": confidence,
            "fields": fields,
        })
        .to_string();
    }

    if let Some(examples) = labelled_value(prompt, EXAMPLES_LABEL) {
        let examples: Vec<Fields> = serde_json::from_str(examples).unwrap_or_default();
        return infer_field_table(&examples).to_string();
    }

    "{}".to_string()
}
