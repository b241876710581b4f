//! Content classifier.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::detection::{CandidateRegion, Fields, PreAnalysis, SignatureMatcher};
use crate::document::dom;
use crate::llm::{complete_with_retry, prompts, LlmProvider};

use super::json::extract_json_object;
use super::registry::TypeRegistry;
use super::result::{ClassificationResult, ACCEPTANCE_THRESHOLD, UNKNOWN_TYPE};

/// Configuration for classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Characters of region HTML shown to the LLM.
    pub html_excerpt_chars: usize,
    /// Characters of region text shown to the LLM.
    pub text_excerpt_chars: usize,
    /// Output token budget per call.
    pub max_output_tokens: usize,
    /// Sampling temperature.
    pub temperature: f64,
    /// Minimum confidence for a result to be kept by the pipeline.
    pub acceptance_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            html_excerpt_chars: 1500,
            text_excerpt_chars: 800,
            max_output_tokens: 800,
            temperature: 0.1,
            acceptance_threshold: ACCEPTANCE_THRESHOLD,
        }
    }
}

impl ClassifierConfig {
    /// Set the acceptance threshold.
    pub fn with_acceptance_threshold(mut self, threshold: f64) -> Self {
        self.acceptance_threshold = threshold;
        self
    }
}

/// Classifies candidate regions.
///
/// Without an LLM provider the signature pre-analysis is the verdict.
pub struct ContentClassifier {
    matcher: SignatureMatcher,
    provider: Option<Arc<dyn LlmProvider>>,
    registry: Arc<TypeRegistry>,
    config: ClassifierConfig,
}

impl ContentClassifier {
    /// Create a signature-only classifier.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_config(ClassifierConfig::default(), registry)
    }

    /// Create a classifier with custom configuration.
    pub fn with_config(config: ClassifierConfig, registry: Arc<TypeRegistry>) -> Self {
        Self {
            matcher: SignatureMatcher::new(),
            provider: None,
            registry,
            config,
        }
    }

    /// Attach an LLM provider.
    pub fn with_llm(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// The shared type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Whether an LLM provider is attached.
    pub fn has_llm(&self) -> bool {
        self.provider.is_some()
    }

    /// Whether a result clears the configured acceptance threshold.
    pub fn accepts(&self, result: &ClassificationResult) -> bool {
        result.confidence >= self.config.acceptance_threshold
    }

    /// Signature pre-analysis only.
    pub fn pre_analyze(&self, region: &CandidateRegion<'_>) -> PreAnalysis {
        self.matcher.match_region(region)
    }

    /// Classify a region. Never fails: any error degrades to [`UNKNOWN_TYPE`].
    pub fn classify(&self, region: &CandidateRegion<'_>, source_file: &str) -> ClassificationResult {
        let pre = self.pre_analyze(region);
        let html = region.html();

        let Some(provider) = &self.provider else {
            self.registry.register(&pre.content_type);
            return ClassificationResult::new(
                pre.content_type,
                pre.score,
                pre.fields,
                source_file,
                html,
            );
        };

        let prompt = prompts::classification_prompt(
            &pre,
            dom::truncate_chars(&html, self.config.html_excerpt_chars),
            dom::truncate_chars(region.text(), self.config.text_excerpt_chars),
            &self.registry.snapshot(),
            &prompts::structured_digest(region),
        );

        let response = match complete_with_retry(
            provider.as_ref(),
            &prompt,
            self.config.max_output_tokens,
            self.config.temperature,
        ) {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    file = source_file,
                    region = %region.label(),
                    provider = provider.name(),
                    error = %e,
                    "Classification failed"
                );
                return ClassificationResult::unknown(source_file, html);
            }
        };

        let Some(parsed) = extract_json_object(&response) else {
            warn!(
                file = source_file,
                region = %region.label(),
                "Unparseable classification response"
            );
            return ClassificationResult::unknown(source_file, html);
        };

        let result = self.from_response(parsed, source_file, html);
        debug!(
            file = source_file,
            content_type = %result.content_type,
            confidence = result.confidence,
            pre_type = %pre.content_type,
            "Region classified"
        );
        result
    }

    /// Build a result from a decoded response, defaulting missing keys.
    fn from_response(
        &self,
        mut parsed: Map<String, Value>,
        source_file: &str,
        html: String,
    ) -> ClassificationResult {
        let named_type = parsed
            .get("type")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        let confidence = parsed
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        let fields: Fields = match parsed.remove("fields") {
            Some(Value::Object(map)) => map.into_iter().collect(),
            _ => Fields::new(),
        };

        // Only types the provider named grow the vocabulary
        let content_type = match named_type {
            Some(content_type) => {
                self.registry.register(&content_type);
                content_type
            }
            None => UNKNOWN_TYPE.to_string(),
        };
        ClassificationResult::new(content_type, confidence, fields, source_file, html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{RegionFinder, GENERIC_CONTENT};
    use crate::document::Document;
    use crate::llm::MockProvider;
    use serde_json::json;

    const NAV: &str = r#"<html><body><nav>
        <a href="/">Home page</a><a href="/about">About our company</a>
        <a href="/contact">Contact the team</a><a href="/shop">Shop all products</a>
        <a href="/blog">Read the blog</a><a href="/help">Help center</a>
        <a href="/cart">Your cart</a><a href="/account">Account settings</a>
    </nav></body></html>"#;

    fn classify_nav(provider: MockProvider) -> (ClassificationResult, Arc<TypeRegistry>) {
        let doc = Document::parse("index.html", NAV);
        let regions = RegionFinder::new().find_regions(&doc);
        let registry = Arc::new(TypeRegistry::new());
        let classifier =
            ContentClassifier::new(Arc::clone(&registry)).with_llm(Arc::new(provider));
        (classifier.classify(&regions[0], "index.html"), registry)
    }

    #[test]
    fn test_llm_verdict_is_used_and_registered() {
        let provider = MockProvider::scripted([r#"Here you go: {"type":"navigation-menu","confidence":0.9,
            "fields":{"links":["Home","About","Contact","Shop","Blog","Help","Cart","Account"]}}"#]);
        let (result, registry) = classify_nav(provider);

        assert_eq!(result.content_type, "navigation-menu");
        assert!(result.looks_good());
        assert_eq!(result.fields["links"].as_array().unwrap().len(), 8);
        assert_eq!(result.source_file, "index.html");
        assert!(registry.contains("navigation-menu"));
    }

    #[test]
    fn test_provider_failure_degrades_to_unknown() {
        let (result, registry) = classify_nav(MockProvider::failing("connection reset"));

        assert_eq!(result.content_type, UNKNOWN_TYPE);
        assert_eq!(result.confidence, 0.0);
        assert!(result.fields.is_empty());
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_unparseable_response_degrades_to_unknown() {
        let (result, _) = classify_nav(MockProvider::scripted(["I think it's a menu."]));
        assert!(result.is_unknown());
    }

    #[test]
    fn test_missing_keys_are_defaulted() {
        let (result, _) = classify_nav(MockProvider::scripted([r#"{"type": "menu"}"#]));
        assert_eq!(result.content_type, "menu");
        assert_eq!(result.confidence, 0.0);
        assert!(result.fields.is_empty());

        let (result, _) = classify_nav(MockProvider::scripted([r#"{"confidence": 4}"#]));
        assert_eq!(result.content_type, UNKNOWN_TYPE);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_missing_type_is_not_registered() {
        let doc = Document::parse("index.html", NAV);
        let regions = RegionFinder::new().find_regions(&doc);
        let registry = Arc::new(TypeRegistry::with_types(["article"]));
        let provider = MockProvider::scripted([r#"{"confidence":0.8,"fields":{"links":["Home"]}}"#]);
        let classifier =
            ContentClassifier::new(Arc::clone(&registry)).with_llm(Arc::new(provider));

        let result = classifier.classify(&regions[0], "index.html");

        assert_eq!(result.content_type, UNKNOWN_TYPE);
        assert!(!registry.contains(UNKNOWN_TYPE));
        assert_eq!(registry.snapshot(), vec!["article".to_string()]);
    }

    #[test]
    fn test_signature_only_mode() {
        let doc = Document::parse("index.html", NAV);
        let regions = RegionFinder::new().find_regions(&doc);
        let classifier = ContentClassifier::new(Arc::new(TypeRegistry::new()));

        let result = classifier.classify(&regions[0], "index.html");
        assert!(!classifier.has_llm());
        assert_eq!(result.content_type, "navigation-menu");
        assert_ne!(result.content_type, GENERIC_CONTENT);
        assert!(classifier.accepts(&result));
        assert_eq!(result.fields["link"], json!("/"));
    }

    #[test]
    fn test_echo_provider_reflects_signature() {
        let registry = Arc::new(TypeRegistry::new());
        registry.register("recipe-card");
        let doc = Document::parse("index.html", NAV);
        let regions = RegionFinder::new().find_regions(&doc);

        let provider = Arc::new(MockProvider::new());
        let classifier = ContentClassifier::new(registry).with_llm(provider.clone());
        let result = classifier.classify(&regions[0], "index.html");

        assert_eq!(provider.calls(), 1);
        assert_eq!(result.content_type, "navigation-menu");
    }
}
