//! Schema synthesis from classified examples.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::classify::{extract_json_object, value_text, ClassificationResult};
use crate::detection::Fields;
use crate::llm::{complete_with_retry, prompts, LlmProvider};

use super::component::ComponentSchema;
use super::field::{FieldType, SchemaField};
use super::validation::{normalize_field_name, validate};

/// Strings longer than this are treated as multiline text.
const MULTILINE_CHARS: usize = 100;

/// Field names that hold long-form content.
const LONG_FORM_FIELDS: &[&str] = &["content", "description", "body", "instructions", "ingredients"];

/// Name fragments that indicate an uploaded asset.
const FILE_HINTS: &[&str] = &["image", "img", "photo", "logo", "thumbnail", "icon", "background"];

/// Configuration for schema synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizerConfig {
    /// Examples embedded in the prompt.
    pub max_examples: usize,
    /// Output token budget per call.
    pub max_output_tokens: usize,
    /// Sampling temperature.
    pub temperature: f64,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            max_examples: 5,
            max_output_tokens: 1000,
            temperature: 0.1,
        }
    }
}

/// Turns classified examples of one type into a validated schema.
///
/// Without an LLM provider the field table is inferred from the examples.
pub struct SchemaSynthesizer {
    provider: Option<Arc<dyn LlmProvider>>,
    config: SynthesizerConfig,
}

impl SchemaSynthesizer {
    /// Create an offline synthesizer.
    pub fn new() -> Self {
        Self::with_config(SynthesizerConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(config: SynthesizerConfig) -> Self {
        Self {
            provider: None,
            config,
        }
    }

    /// Attach an LLM provider.
    pub fn with_llm(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &SynthesizerConfig {
        &self.config
    }

    /// Synthesize a schema, or `None` when the result fails validation.
    pub fn synthesize(
        &self,
        content_type: &str,
        examples: &[ClassificationResult],
    ) -> Option<ComponentSchema> {
        let samples: Vec<Fields> = examples
            .iter()
            .take(self.config.max_examples)
            .map(|r| r.fields.clone())
            .collect();

        let table = self.propose_fields(content_type, &samples);
        let schema = build_schema(content_type, &table);

        let violations = validate(&schema);
        if violations.is_empty() {
            debug!(content_type, fields = schema.fields.len(), "Schema accepted");
            Some(schema)
        } else {
            let reasons: Vec<String> = violations.iter().map(ToString::to_string).collect();
            warn!(
                content_type,
                reasons = %reasons.join("; "),
                "Schema rejected"
            );
            None
        }
    }

    /// Proposed field table (`name -> spec`). Empty when the call fails or
    /// the response has no usable `fields` object.
    pub fn propose_fields(&self, content_type: &str, samples: &[Fields]) -> Map<String, Value> {
        let Some(provider) = &self.provider else {
            return field_table(infer_field_table(samples));
        };

        let refs: Vec<&Fields> = samples.iter().collect();
        let prompt = prompts::schema_prompt(content_type, &refs);

        match complete_with_retry(
            provider.as_ref(),
            &prompt,
            self.config.max_output_tokens,
            self.config.temperature,
        ) {
            Ok(response) => match extract_json_object(&response) {
                Some(parsed) => field_table(Value::Object(parsed)),
                None => {
                    warn!(content_type, "Unparseable schema response");
                    Map::new()
                }
            },
            Err(e) => {
                warn!(content_type, error = %e, "Schema generation failed");
                Map::new()
            }
        }
    }
}

impl Default for SchemaSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

fn field_table(response: Value) -> Map<String, Value> {
    match response {
        Value::Object(mut map) => match map.remove("fields") {
            Some(Value::Object(fields)) => fields,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

/// Build a schema from a field table, normalizing names and coercing types.
///
/// Entries whose name normalizes to nothing, or to a name already taken,
/// are dropped.
pub fn build_schema(content_type: &str, table: &Map<String, Value>) -> ComponentSchema {
    let mut fields: Vec<SchemaField> = Vec::with_capacity(table.len());

    for (raw_name, spec) in table {
        let name = normalize_field_name(raw_name);
        if name.is_empty() || fields.iter().any(|f| f.name == name) {
            debug!(content_type, field = %raw_name, "Dropping field");
            continue;
        }

        let field = match spec {
            Value::Object(spec) => {
                let field_type = spec
                    .get("type")
                    .and_then(Value::as_str)
                    .map(FieldType::coerce)
                    .unwrap_or_default();
                let options: Vec<String> = spec
                    .get("enum_values")
                    .and_then(Value::as_array)
                    .map(|values| values.iter().map(value_text).filter(|v| !v.is_empty()).collect())
                    .unwrap_or_default();

                SchemaField::new(name, field_type)
                    .with_required(flag(spec, "required"))
                    .with_multiline(flag(spec, "multiline"))
                    .with_options(options)
            }
            Value::String(type_name) => SchemaField::new(name, FieldType::coerce(type_name)),
            _ => SchemaField::new(name, FieldType::Text),
        };
        fields.push(field);
    }

    ComponentSchema::new(content_type, fields)
}

fn flag(spec: &Map<String, Value>, key: &str) -> bool {
    match spec.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Infer a field table (`{"fields": {...}}`) directly from example values.
///
/// Fields present in every example are required; asset-like names become
/// files; long or list-valued text is multiline.
pub fn infer_field_table(examples: &[Fields]) -> Value {
    #[derive(Default)]
    struct Observed<'a> {
        count: usize,
        sample: Option<&'a Value>,
        multiline: bool,
    }

    let mut observed: IndexMap<&str, Observed<'_>> = IndexMap::new();
    for example in examples {
        for (name, value) in example {
            let entry = observed.entry(name.as_str()).or_default();
            entry.count += 1;
            if entry.sample.is_none() && !value.is_null() {
                entry.sample = Some(value);
            }
            entry.multiline |= match value {
                Value::String(s) => s.chars().count() > MULTILINE_CHARS || s.contains('\n'),
                Value::Array(_) => true,
                _ => false,
            };
        }
    }

    let mut fields = Map::new();
    for (name, seen) in observed {
        let lower = name.to_lowercase();
        let field_type = match seen.sample {
            _ if FILE_HINTS.iter().any(|hint| lower.contains(hint)) => FieldType::File,
            Some(Value::Bool(_)) => FieldType::Boolean,
            Some(Value::Number(_)) => FieldType::Number,
            _ if lower.contains("date") || lower.contains("published") => FieldType::Date,
            _ => FieldType::Text,
        };
        let multiline = field_type == FieldType::Text
            && (seen.multiline || LONG_FORM_FIELDS.contains(&lower.as_str()));

        fields.insert(
            name.to_string(),
            json!({
                "type": field_type.as_str(),
                "required": !examples.is_empty() && seen.count == examples.len(),
                "multiline": multiline,
            }),
        );
    }

    json!({ "fields": fields })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockProvider;

    fn example(pairs: &[(&str, Value)]) -> ClassificationResult {
        let fields: Fields = pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        ClassificationResult::new("teaser-component", 0.8, fields, "a.html", "")
    }

    fn teasers() -> Vec<ClassificationResult> {
        (0..3)
            .map(|i| {
                example(&[
                    ("title", json!(format!("Teaser {}", i))),
                    ("description", json!("Short blurb")),
                    ("image", json!("/t.jpg")),
                    ("link", json!("/go")),
                ])
            })
            .collect()
    }

    #[test]
    fn test_offline_synthesis_from_examples() {
        let schema = SchemaSynthesizer::new()
            .synthesize("teaser-component", &teasers())
            .unwrap();

        assert_eq!(schema.field_names(), vec!["title", "description", "image", "link"]);
        assert_eq!(schema.field("image").unwrap().field_type, FieldType::File);
        assert!(schema.field("title").unwrap().required);
        assert!(schema.field("description").unwrap().multiline);
    }

    #[test]
    fn test_llm_table_is_normalized_and_coerced() {
        let provider = MockProvider::scripted([r#"```json
{"fields": {
  "Headline Text": {"type": "string", "required": true},
  "hero-image": {"type": "image"},
  "size": {"type": "text", "enum_values": ["S", "L"]},
  "headline_text": {"type": "text"}
}}
```"#]);
        let synthesizer = SchemaSynthesizer::new().with_llm(Arc::new(provider));
        let schema = synthesizer.synthesize("banner-component", &teasers()).unwrap();

        assert_eq!(schema.field_names(), vec!["headline_text", "hero_image", "size"]);
        assert_eq!(schema.fields[0].field_type, FieldType::Text);
        assert!(schema.fields[0].required);
        assert_eq!(schema.fields[0].display_name, "Headline Text");
        assert_eq!(schema.fields[1].field_type, FieldType::File);
        assert_eq!(schema.fields[2].options, Some(vec!["S".to_string(), "L".to_string()]));
    }

    #[test]
    fn test_failed_call_yields_no_schema() {
        let synthesizer =
            SchemaSynthesizer::new().with_llm(Arc::new(MockProvider::failing("timeout")));
        assert!(synthesizer.synthesize("teaser-component", &teasers()).is_none());
    }

    #[test]
    fn test_unparseable_response_yields_no_schema() {
        let synthesizer =
            SchemaSynthesizer::new().with_llm(Arc::new(MockProvider::scripted(["no idea"])));
        assert!(synthesizer.synthesize("teaser-component", &teasers()).is_none());
    }

    #[test]
    fn test_prompt_limited_to_max_examples() {
        let provider = Arc::new(MockProvider::new());
        let synthesizer = SchemaSynthesizer::new().with_llm(provider.clone());
        let many: Vec<ClassificationResult> = (0..12).flat_map(|_| teasers()).collect();

        let schema = synthesizer.synthesize("teaser-component", &many).unwrap();
        assert_eq!(provider.calls(), 1);
        assert_eq!(schema.fields.len(), 4);
    }

    #[test]
    fn test_infer_required_only_when_always_present() {
        let mut a = Fields::new();
        a.insert("title".into(), json!("A"));
        a.insert("price".into(), json!(9.5));
        let mut b = Fields::new();
        b.insert("title".into(), json!("B"));
        b.insert("published_date".into(), json!("2024-05-01"));

        let table = infer_field_table(&[a, b]);
        assert_eq!(table["fields"]["title"]["required"], json!(true));
        assert_eq!(table["fields"]["price"]["required"], json!(false));
        assert_eq!(table["fields"]["price"]["type"], json!("number"));
        assert_eq!(table["fields"]["published_date"]["type"], json!("date"));
    }

    #[test]
    fn test_non_object_specs() {
        let mut table = Map::new();
        table.insert("count".into(), json!("integer"));
        table.insert("notes".into(), json!(42));
        table.insert("!!!".into(), json!({"type": "text"}));

        let schema = build_schema("misc", &table);
        assert_eq!(schema.field_names(), vec!["count", "notes"]);
        assert_eq!(schema.fields[0].field_type, FieldType::Number);
        assert_eq!(schema.fields[1].field_type, FieldType::Text);
    }
}
