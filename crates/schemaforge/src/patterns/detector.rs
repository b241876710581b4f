//! Groups classified instances by type and scores how reusable each type is.
//!
//! The reusability score sums three tiered contributions and is clamped to
//! [0, 1]:
//!
//! - instances: +0.3 at 5 or more, +0.2 at 3 or more, +0.1 at 2 or more
//! - structure: +0.4 x (common fields / mean fields per instance), ratio capped at 1
//! - spread: +0.3 at 3 or more distinct files, +0.2 at 2

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::classify::{value_text, ClassificationResult};

use super::fingerprint::{fingerprint, value_kind};
use super::types::{ComponentTemplate, FieldPattern, FieldRole, ReusablePattern, Variant};

/// Tolerance for comparing summed tier weights against the threshold.
const SCORE_EPSILON: f64 = 1e-9;

/// Configuration for pattern detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Presence ratio for a field to be common.
    pub common_field_ratio: f64,
    /// Non-empty ratio for a common field to be required.
    pub required_ratio: f64,
    /// Distinct-value ratio above which a field is variable.
    pub variability_ratio: f64,
    /// Score needed for promotion.
    pub promotion_threshold: f64,
    /// Instances needed before a type is analyzed at all.
    pub min_instances: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            common_field_ratio: 0.7,
            required_ratio: 0.8,
            variability_ratio: 0.7,
            promotion_threshold: 0.7,
            min_instances: 2,
        }
    }
}

/// Detects reusable component patterns across a run's results.
pub struct PatternDetector {
    config: PatternConfig,
}

impl PatternDetector {
    /// Create a detector with default configuration.
    pub fn new() -> Self {
        Self::with_config(PatternConfig::default())
    }

    /// Create a detector with custom configuration.
    pub fn with_config(config: PatternConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    /// Promoted patterns only, keyed by content type in first-seen order.
    pub fn detect(&self, results: &[ClassificationResult]) -> IndexMap<String, ReusablePattern> {
        let promoted: IndexMap<String, ReusablePattern> = self
            .analyze(results)
            .into_iter()
            .filter(|(_, pattern)| self.is_promoted(pattern))
            .collect();

        info!(promoted = promoted.len(), "Pattern detection finished");
        promoted
    }

    /// Whether a pattern clears the promotion threshold.
    pub fn is_promoted(&self, pattern: &ReusablePattern) -> bool {
        pattern.reusability_score + SCORE_EPSILON >= self.config.promotion_threshold
    }

    /// Every type with enough instances, promoted or not.
    pub fn analyze(&self, results: &[ClassificationResult]) -> IndexMap<String, ReusablePattern> {
        let mut by_type: IndexMap<&str, Vec<&ClassificationResult>> = IndexMap::new();
        for result in results {
            by_type.entry(result.content_type.as_str()).or_default().push(result);
        }

        let min_instances = self.config.min_instances.max(2);
        by_type
            .into_iter()
            .filter(|(_, instances)| instances.len() >= min_instances)
            .map(|(content_type, instances)| {
                let pattern = self.analyze_type(content_type, &instances);
                debug!(
                    content_type,
                    instances = pattern.instances_count,
                    score = pattern.reusability_score,
                    "Pattern analyzed"
                );
                (content_type.to_string(), pattern)
            })
            .collect()
    }

    /// Analyze the instances of one content type.
    pub fn analyze_type(
        &self,
        content_type: &str,
        instances: &[&ClassificationResult],
    ) -> ReusablePattern {
        let n = instances.len();

        // Field presence and kind tags, in first-seen order
        let mut presence: IndexMap<&str, usize> = IndexMap::new();
        let mut variations: IndexMap<String, Vec<String>> = IndexMap::new();
        for instance in instances {
            for (name, value) in &instance.fields {
                *presence.entry(name.as_str()).or_default() += 1;
                let kinds = variations.entry(name.clone()).or_default();
                let kind = value_kind(value).to_string();
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
        for kinds in variations.values_mut() {
            kinds.sort();
        }

        let threshold = n as f64 * self.config.common_field_ratio;
        let common_fields: Vec<String> = presence
            .iter()
            .filter(|(_, count)| **count as f64 >= threshold)
            .map(|(name, _)| name.to_string())
            .collect();

        let total_fields: usize = instances.iter().map(|i| i.fields.len()).sum();
        let mean_fields = total_fields as f64 / n.max(1) as f64;
        let distinct_files = instances
            .iter()
            .map(|i| i.source_file.as_str())
            .collect::<HashSet<_>>()
            .len();

        let fields = common_fields
            .iter()
            .map(|name| (name.clone(), self.field_pattern(name, instances)))
            .collect();

        let template = ComponentTemplate {
            component_name: component_name(content_type, instances),
            description: describe(content_type, instances, &presence),
            fields,
            variants: self.variants(instances),
        };

        ReusablePattern {
            content_type: content_type.to_string(),
            instances_count: n,
            reusability_score: reusability_score(n, common_fields.len(), mean_fields, distinct_files),
            common_fields,
            field_variations: variations,
            template,
            usage_contexts: instances.iter().map(|i| i.source_file.clone()).collect(),
        }
    }

    fn field_pattern(&self, field_name: &str, instances: &[&ClassificationResult]) -> FieldPattern {
        let values: Vec<&Value> = instances
            .iter()
            .filter_map(|i| i.fields.get(field_name))
            .filter(|v| is_present(v))
            .collect();
        let texts: Vec<String> = values.iter().map(|v| value_text(v)).collect();

        let required = values.len() as f64 >= instances.len() as f64 * self.config.required_ratio;
        let typical_length = if texts.is_empty() {
            0
        } else {
            texts.iter().map(|t| t.chars().count()).sum::<usize>() / texts.len()
        };
        let is_variable = self.is_variable(&texts);

        let component_role = match field_name {
            "links" | "menu_items" | "navigation" => Some(FieldRole::Navigation {
                average_items: if values.is_empty() {
                    0.0
                } else {
                    values
                        .iter()
                        .map(|v| v.as_array().map_or(1, Vec::len))
                        .sum::<usize>() as f64
                        / values.len() as f64
                },
            }),
            "title" | "heading" | "name" => Some(FieldRole::Heading {
                is_unique_content: is_variable,
            }),
            "description" | "content" | "body" => Some(FieldRole::RichText {
                is_content_heavy: texts.iter().any(|t| t.chars().count() > 200),
            }),
            _ => None,
        };

        FieldPattern {
            field_name: field_name.to_string(),
            required,
            data_type: dominant_kind(&values),
            typical_length,
            is_variable,
            component_role,
        }
    }

    fn is_variable(&self, texts: &[String]) -> bool {
        if texts.len() < 2 {
            return false;
        }
        let unique = texts.iter().collect::<HashSet<_>>().len();
        unique as f64 / texts.len() as f64 > self.config.variability_ratio
    }

    fn variants(&self, instances: &[&ClassificationResult]) -> Vec<Variant> {
        let mut groups: IndexMap<Vec<String>, Vec<&ClassificationResult>> = IndexMap::new();
        for instance in instances {
            groups.entry(fingerprint(&instance.fields)).or_default().push(instance);
        }

        groups
            .into_values()
            .filter(|group| group.len() >= 2)
            .enumerate()
            .map(|(i, group)| Variant {
                variant_name: format!("variant_{}", i + 1),
                instances: group.len(),
                distinguishing_features: distinguishing_features(&group),
                usage_context: group.iter().take(3).map(|r| r.source_file.clone()).collect(),
            })
            .collect()
    }
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Tiered reusability score, clamped to [0, 1].
pub fn reusability_score(
    instances: usize,
    common_fields: usize,
    mean_fields: f64,
    distinct_files: usize,
) -> f64 {
    let mut score = match instances {
        n if n >= 5 => 0.3,
        n if n >= 3 => 0.2,
        n if n >= 2 => 0.1,
        _ => 0.0,
    };

    if mean_fields > 0.0 {
        let ratio = (common_fields as f64 / mean_fields).min(1.0);
        score += ratio * 0.4;
    }

    score += match distinct_files {
        n if n >= 3 => 0.3,
        2 => 0.2,
        _ => 0.0,
    };

    score.clamp(0.0, 1.0)
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Most frequent kind tag; ties go to the first seen. `str` when empty.
fn dominant_kind(values: &[&Value]) -> String {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for value in values {
        *counts.entry(value_kind(value)).or_default() += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (kind, count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((kind, count));
        }
    }
    best.map_or("str", |(kind, _)| kind).to_string()
}

/// Keys and values of an instance, lowercased, for substring checks.
fn haystack(result: &ClassificationResult) -> String {
    serde_json::to_string(&result.fields)
        .unwrap_or_default()
        .to_lowercase()
}

fn list_len(result: &ClassificationResult, field: &str) -> usize {
    result
        .fields
        .get(field)
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

fn component_name(content_type: &str, instances: &[&ClassificationResult]) -> String {
    let Some(sample) = instances.first() else {
        return format!("{}_content_component", content_type);
    };
    let text = haystack(sample);

    let suffix = if list_len(sample, "links") > 5 {
        "menu"
    } else if sample.fields.contains_key("price") || text.contains("price") || text.contains("cost") {
        "pricing"
    } else if sample.fields.contains_key("image") || text.contains("photo") {
        "media"
    } else {
        "content"
    };
    format!("{}_{}_component", content_type, suffix)
}

fn describe(
    content_type: &str,
    instances: &[&ClassificationResult],
    presence: &IndexMap<&str, usize>,
) -> String {
    let files: IndexSet<&str> = instances.iter().map(|i| i.source_file.as_str()).collect();
    let fields: Vec<&str> = presence.keys().take(3).copied().collect();
    let contexts: Vec<&str> = files.iter().take(2).copied().collect();

    format!(
        "Reusable {} component used across {} pages. Contains {} and appears in contexts like {}.",
        content_type,
        files.len(),
        fields.join(", "),
        contexts.join(", ")
    )
}

fn distinguishing_features(group: &[&ClassificationResult]) -> Vec<String> {
    let mut features = Vec::new();

    if group.first().is_some_and(|sample| sample.fields.contains_key("links")) {
        let avg_links =
            group.iter().map(|r| list_len(r, "links")).sum::<usize>() as f64 / group.len() as f64;
        if avg_links > 10.0 {
            features.push("large_navigation_menu".to_string());
        } else if avg_links < 3.0 {
            features.push("minimal_links".to_string());
        }
    }

    if group.iter().any(|r| haystack(r).contains("price")) {
        features.push("includes_pricing".to_string());
    }

    if group.iter().any(|r| r.fields.contains_key("image")) {
        features.push("media_rich".to_string());
    }

    if features.is_empty() {
        features.push("standard_variant".to_string());
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Fields;
    use serde_json::json;

    fn result(content_type: &str, file: &str, pairs: &[(&str, Value)]) -> ClassificationResult {
        let fields: Fields = pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        ClassificationResult::new(content_type, 0.9, fields, file, "")
    }

    fn teaser(i: usize, file: &str) -> ClassificationResult {
        result(
            "teaser-component",
            file,
            &[
                ("title", json!(format!("Teaser number {}", i))),
                ("description", json!("A short description")),
                ("image", json!(format!("/img/{}.jpg", i))),
                ("link", json!("/more")),
            ],
        )
    }

    #[test]
    fn test_teasers_across_three_files_are_promoted() {
        let files = ["a.html", "b.html", "c.html", "a.html", "b.html"];
        let results: Vec<_> = files.iter().enumerate().map(|(i, f)| teaser(i, f)).collect();

        let promoted = PatternDetector::new().detect(&results);
        let pattern = &promoted["teaser-component"];

        assert!((pattern.reusability_score - 1.0).abs() < 1e-9);
        assert_eq!(pattern.common_fields, vec!["title", "description", "image", "link"]);
        assert_eq!(pattern.instances_count, 5);
        assert_eq!(pattern.template.component_name, "teaser-component_media_component");
        assert!(pattern.template.fields["title"].required);
        assert!(pattern.template.fields["title"].is_variable);
        assert!(!pattern.template.fields["link"].is_variable);
    }

    #[test]
    fn test_single_instance_never_promoted() {
        let results = vec![teaser(0, "a.html")];
        assert!(PatternDetector::new().detect(&results).is_empty());
        assert!(PatternDetector::new().analyze(&results).is_empty());
    }

    #[test]
    fn test_low_score_analyzed_but_not_promoted() {
        let results = vec![
            result("quote", "a.html", &[("text", json!("x"))]),
            result("quote", "a.html", &[("author", json!("y"))]),
        ];
        let detector = PatternDetector::new();

        let analyzed = detector.analyze(&results);
        assert!(analyzed["quote"].reusability_score < 0.7);
        assert!(analyzed["quote"].common_fields.is_empty());
        assert!(detector.detect(&results).is_empty());
    }

    #[test]
    fn test_score_tiers() {
        assert!((reusability_score(2, 0, 0.0, 1) - 0.1).abs() < 1e-9);
        assert!((reusability_score(3, 2, 4.0, 2) - 0.6).abs() < 1e-9);
        assert!((reusability_score(1000, 4, 4.0, 1) - 0.7).abs() < 1e-9);
        assert!((reusability_score(10, 10, 2.0, 10) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_variants_and_features() {
        let nav = |file: &str, n: usize| {
            result(
                "navigation-menu",
                file,
                &[("links", json!(vec!["x"; n])), ("brand", json!("Shop"))],
            )
        };
        let results = vec![nav("a.html", 12), nav("b.html", 12), nav("c.html", 2)];

        let pattern = &PatternDetector::new().analyze(&results)["navigation-menu"];
        assert_eq!(pattern.template.component_name, "navigation-menu_menu_component");
        assert_eq!(pattern.template.variants.len(), 1);

        let variant = &pattern.template.variants[0];
        assert_eq!(variant.variant_name, "variant_1");
        assert_eq!(variant.instances, 2);
        assert_eq!(variant.distinguishing_features, vec!["large_navigation_menu"]);
        assert_eq!(variant.usage_context, vec!["a.html", "b.html"]);

        match &pattern.template.fields["links"].component_role {
            Some(FieldRole::Navigation { average_items }) => {
                assert!((average_items - 26.0 / 3.0).abs() < 1e-9)
            }
            other => panic!("unexpected role {:?}", other),
        }
    }

    #[test]
    fn test_pricing_and_standard_features() {
        let priced = vec![
            result("card", "a.html", &[("label", json!("Price: $5"))]),
            result("card", "b.html", &[("label", json!("Price: $6"))]),
        ];
        let pattern = &PatternDetector::new().analyze(&priced)["card"];
        assert_eq!(pattern.template.component_name, "card_pricing_component");
        assert_eq!(
            pattern.template.variants[0].distinguishing_features,
            vec!["includes_pricing"]
        );

        let plain = vec![
            result("card", "a.html", &[("label", json!("Hello"))]),
            result("card", "b.html", &[("label", json!("World"))]),
        ];
        let pattern = &PatternDetector::new().analyze(&plain)["card"];
        assert_eq!(pattern.template.component_name, "card_content_component");
        assert_eq!(
            pattern.template.variants[0].distinguishing_features,
            vec!["standard_variant"]
        );
    }

    #[test]
    fn test_field_variations_sorted() {
        let results = vec![
            result("x", "a.html", &[("value", json!("1"))]),
            result("x", "b.html", &[("value", json!(1))]),
        ];
        let pattern = &PatternDetector::new().analyze(&results)["x"];
        assert_eq!(pattern.field_variations["value"], vec!["number", "str"]);
        assert_eq!(pattern.template.fields["value"].data_type, "str");
    }
}
