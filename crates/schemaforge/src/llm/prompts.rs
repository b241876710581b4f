//! Prompt templates for LLM interactions.
//!
//! Machine-readable context (pre-analysis, examples) is embedded on single
//! labelled lines as compact JSON so that offline providers can read it back.

use serde_json::Value;

use crate::detection::{CandidateRegion, Fields, PreAnalysis};
use crate::document::dom;

pub(crate) const DETECTED_TYPE_LABEL: &str = "Detected Type:";
pub(crate) const CONFIDENCE_LABEL: &str = "Confidence:";
pub(crate) const PRE_FIELDS_LABEL: &str = "Pre-extracted Fields:";
pub(crate) const CONTENT_TYPE_LABEL: &str = "Content Type:";
pub(crate) const EXAMPLES_LABEL: &str = "Examples:";

/// System prompt shared by every provider.
pub fn system_prompt() -> &'static str {
    "You are a content modelling assistant helping migrate websites into a \
     headless CMS. You identify reusable content components in HTML and \
     describe their fields. Always answer with a single JSON object and \
     nothing else."
}

/// Build a prompt asking for a region's content type and fields.
pub fn classification_prompt(
    pre: &PreAnalysis,
    html_excerpt: &str,
    text_excerpt: &str,
    known_types: &[String],
    digest: &str,
) -> String {
    format!(
        r#"Identify the type of content component in this HTML section.

## Rule-based Pre-analysis
{} {}
{} {:.2}
{} {}

## Structure
{}

## HTML
{}

## Text
{}

## Known Content Types
{}

## Task
Pick the most specific content type. Reuse a known type when it fits; invent
a new kebab-case type name (e.g. "recipe-card") only when none does. Extract
the component's fields using snake_case names.

Respond with JSON in this exact format:
{{
  "type": "teaser-component",
  "confidence": 0.85,
  "fields": {{
    "title": "Weekly Deals",
    "description": "Save on fresh produce this week",
    "image": "/img/deals.jpg",
    "link": "/deals"
  }}
}}"#,
        DETECTED_TYPE_LABEL,
        pre.content_type,
        CONFIDENCE_LABEL,
        pre.score,
        PRE_FIELDS_LABEL,
        compact(&pre.fields),
        digest,
        html_excerpt,
        text_excerpt,
        known_types.join(", "),
    )
}

/// Build a prompt asking for a field table covering the given examples.
pub fn schema_prompt(content_type: &str, examples: &[&Fields]) -> String {
    format!(
        r#"Design a CMS schema for a content component.

{} {}
{} {}

## Task
Create a schema that covers the important fields in the examples:
- Field types must be one of: text, file, number, boolean, date
- Mark fields present in every example as required
- Mark long text fields as multiline
- List enum values only for fields with a small fixed set of options
- Field names are lowercase snake_case

Respond with JSON in this exact format:
{{
  "fields": {{
    "title": {{"type": "text", "required": true, "multiline": false}},
    "description": {{"type": "text", "required": false, "multiline": true}},
    "size": {{"type": "text", "required": false, "multiline": false, "enum_values": ["small", "large"]}}
  }}
}}"#,
        CONTENT_TYPE_LABEL,
        content_type,
        EXAMPLES_LABEL,
        compact(&examples),
    )
}

/// Short structural summary of a region: headings, links, media, lists.
pub fn structured_digest(region: &CandidateRegion<'_>) -> String {
    let element = region.element();
    let headings = dom::texts(element, &dom::HEADINGS);
    let links: Vec<String> = dom::texts(element, &dom::LINKS).into_iter().take(5).collect();
    let items: Vec<String> = dom::texts(element, &dom::LIST_ITEMS).into_iter().take(5).collect();
    let images = element.select(&dom::IMAGES).count();
    let forms = element.select(&dom::FORMS).count();

    format!(
        "- Element: {}\n- Headings: {}\n- Links: {}\n- Images: {}\n- Forms: {}\n- List items: {}",
        region.label(),
        or_none(&headings),
        or_none(&links),
        images,
        forms,
        or_none(&items),
    )
}

/// Text following `label` on its line, if the prompt has such a line.
pub(crate) fn labelled_value<'a>(prompt: &'a str, label: &str) -> Option<&'a str> {
    prompt
        .lines()
        .find_map(|line| line.trim_start().strip_prefix(label))
        .map(str::trim)
}

fn compact<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| Value::Null.to_string())
}

fn or_none(values: &[String]) -> String {
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(" | ")
    }
}
