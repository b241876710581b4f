//! Rule-based pre-classification of candidate regions.
//!
//! Each [`Signature`] describes one content type through any subset of
//! selectors, text patterns, word-count bounds and structural predicates.
//! Scores are additive and capped at 1.0:
//!
//! | Check                          | Weight            |
//! |--------------------------------|-------------------|
//! | any selector matches           | 0.3               |
//! | each matching text pattern     | 0.2 (max 0.4)     |
//! | min words / max words          | 0.1 each          |
//! | image, background, inputs, min images | 0.2 each   |
//! | link, headings, paragraphs, list | 0.1 each        |
//!
//! Structural predicates extract their field from markup as they match, so
//! the pre-analysis doubles as a first pass of field extraction.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::document::dom;

use super::region::CandidateRegion;

/// Type reported when no signature clears the floor.
pub const GENERIC_CONTENT: &str = "generic-content";

/// Field name to extracted value, in extraction order.
pub type Fields = IndexMap<String, Value>;

/// A signature must score strictly above this to be chosen.
const SCORE_FLOOR: f64 = 0.4;

static BACKGROUND_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"url\(\s*['"]?([^'")]+)['"]?\s*\)"#).unwrap());

/// Structural checks a signature may ask for.
#[derive(Debug, Clone, Default)]
pub struct StructuralPredicates {
    pub has_image: bool,
    pub has_background_image: bool,
    pub has_link: bool,
    pub has_headings: bool,
    pub has_paragraphs: bool,
    pub has_list: bool,
    pub min_images: Option<usize>,
    pub has_inputs: bool,
}

/// A named rule set for one content type.
#[derive(Debug)]
pub struct Signature {
    /// Content type name, e.g. `teaser-component`.
    pub name: &'static str,
    selectors: Vec<Selector>,
    text_patterns: Vec<Regex>,
    /// Lower word-count bound.
    pub min_words: Option<usize>,
    /// Upper word-count bound.
    pub max_words: Option<usize>,
    /// Structural predicates.
    pub predicates: StructuralPredicates,
    /// Field name used for extracted list items.
    list_field: &'static str,
    /// Fields an instance of this type is expected to carry.
    pub expected_fields: &'static [&'static str],
}

impl Signature {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            selectors: Vec::new(),
            text_patterns: Vec::new(),
            min_words: None,
            max_words: None,
            predicates: StructuralPredicates::default(),
            list_field: "items",
            expected_fields: &[],
        }
    }

    fn selectors(mut self, css: &[&str]) -> Self {
        self.selectors = css.iter().map(|c| Selector::parse(c).unwrap()).collect();
        self
    }

    fn patterns(mut self, patterns: &[&str]) -> Self {
        self.text_patterns = patterns
            .iter()
            .map(|p| Regex::new(&format!("(?i){}", p)).unwrap())
            .collect();
        self
    }

    fn words(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_words = min;
        self.max_words = max;
        self
    }

    fn structure(mut self, predicates: StructuralPredicates) -> Self {
        self.predicates = predicates;
        self
    }

    fn list_field(mut self, field: &'static str) -> Self {
        self.list_field = field;
        self
    }

    fn expects(mut self, fields: &'static [&'static str]) -> Self {
        self.expected_fields = fields;
        self
    }

    /// Score a region against this signature, extracting fields on the way.
    ///
    /// Weights are summed in tenths so equal totals compare equal.
    pub fn score(&self, region: &CandidateRegion<'_>) -> (f64, Fields) {
        let element = region.element();
        let mut tenths: u32 = 0;
        let mut fields = Fields::new();

        if self.selectors.iter().any(|s| s.matches(&element)) {
            tenths += 3;
        }

        let pattern_hits = self
            .text_patterns
            .iter()
            .filter(|p| p.is_match(region.text()))
            .count();
        tenths += 2 * pattern_hits.min(2) as u32;

        let words = region.word_count();
        if self.min_words.is_some_and(|min| words >= min) {
            tenths += 1;
        }
        if self.max_words.is_some_and(|max| words <= max) {
            tenths += 1;
        }

        let p = &self.predicates;

        if p.has_image {
            if let Some(img) = dom::first(element, &dom::IMAGES) {
                tenths += 2;
                let src = img.value().attr("src").unwrap_or_default();
                fields.insert("image".into(), json!(src));
            }
        }

        if p.has_background_image {
            if let Some(url) = background_image(region) {
                tenths += 2;
                if let Some(url) = url {
                    fields.insert("background_image".into(), json!(url));
                }
            }
        }

        if p.has_link {
            if let Some(link) = dom::first(element, &dom::LINKS) {
                tenths += 1;
                let href = link.value().attr("href").unwrap_or_default();
                fields.insert("link".into(), json!(href));
            }
        }

        if p.has_headings {
            if let Some(heading) = dom::first(element, &dom::HEADINGS) {
                tenths += 1;
                fields.insert("title".into(), json!(dom::text(heading)));
            }
        }

        if p.has_paragraphs {
            let paragraphs = dom::texts(element, &dom::PARAGRAPHS);
            if paragraphs.len() >= 2 {
                tenths += 1;
                let content = paragraphs.iter().take(3).cloned().collect::<Vec<_>>().join(" ");
                fields.insert("content".into(), json!(content));
            }
        }

        if p.has_list && dom::first(element, &dom::LISTS).is_some() {
            tenths += 1;
            let items: Vec<String> = dom::texts(element, &dom::LIST_ITEMS)
                .into_iter()
                .take(10)
                .collect();
            fields.insert(self.list_field.into(), json!(items));
        }

        if let Some(min_images) = p.min_images {
            let images: Vec<&str> = element
                .select(&dom::IMAGES)
                .map(|img| img.value().attr("src").unwrap_or_default())
                .collect();
            if images.len() >= min_images {
                tenths += 2;
                let srcs: Vec<&str> = images.into_iter().take(5).collect();
                fields.insert("images".into(), json!(srcs));
            }
        }

        if p.has_inputs {
            let inputs: Vec<Value> = element
                .select(&dom::FORM_INPUTS)
                .map(|input| {
                    let attrs = input.value();
                    json!({
                        "type": attrs.attr("type").unwrap_or(attrs.name()),
                        "name": attrs.attr("name").unwrap_or_default(),
                        "placeholder": attrs.attr("placeholder").unwrap_or_default(),
                    })
                })
                .collect();
            if !inputs.is_empty() {
                tenths += 2;
                fields.insert("fields".into(), Value::Array(inputs));
            }
        }

        // Common fields every signature contributes
        if !fields.contains_key("title") {
            if let Some(title) = dom::first_text(element, &dom::TOP_HEADINGS) {
                fields.insert("title".into(), json!(title));
            }
        }
        if !fields.contains_key("description") {
            let description = dom::first_text(element, &dom::PARAGRAPHS)
                .unwrap_or_else(|| region.text().to_string());
            fields.insert(
                "description".into(),
                json!(dom::truncate_chars(&description, 200)),
            );
        }

        (f64::from(tenths.min(10)) / 10.0, fields)
    }
}

/// Background image declared on the region or a descendant.
///
/// Outer `None`: no `background-image` declaration at all. Inner `None`: a
/// declaration without a parsable `url(...)`.
fn background_image(region: &CandidateRegion<'_>) -> Option<Option<String>> {
    let element = region.element();
    let own = element.value().attr("style");
    let nested = element
        .select(&dom::STYLED)
        .filter_map(|e| e.value().attr("style"));

    own.into_iter()
        .chain(nested)
        .find(|style| style.contains("background-image"))
        .map(|style| {
            BACKGROUND_URL
                .captures(style)
                .map(|caps| caps[1].trim().to_string())
        })
}

/// Result of signature pre-analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreAnalysis {
    /// Best-guess type, or [`GENERIC_CONTENT`].
    pub content_type: String,
    /// Score of the best signature (0.0-1.0).
    pub score: f64,
    /// Fields extracted while scoring.
    pub fields: Fields,
}

impl PreAnalysis {
    /// True when a named signature won.
    pub fn is_specific(&self) -> bool {
        self.content_type != GENERIC_CONTENT
    }
}

static SIGNATURES: Lazy<Vec<Signature>> = Lazy::new(|| {
    vec![
        Signature::new("headline-component")
            .selectors(&["h1", "h2", ".headline", "[class*=\"title\"]", "header h1", "header h2"])
            .patterns(&[r"\b(headline|title|breaking|news)\b"])
            .words(Some(2), Some(15))
            .expects(&["headline_text"]),
        Signature::new("teaser-component")
            .selectors(&[".teaser", "[class*=\"teaser\"]", ".preview", "[class*=\"preview\"]"])
            .patterns(&[r"\b(read more|continue|learn more|discover)\b"])
            .words(Some(20), Some(100))
            .structure(StructuralPredicates {
                has_image: true,
                has_link: true,
                ..Default::default()
            })
            .expects(&["title", "description", "image", "link"]),
        Signature::new("banner-component")
            .selectors(&[
                ".banner",
                "[class*=\"banner\"]",
                ".hero",
                "[class*=\"hero\"]",
                ".promo",
                ".mini-banner",
                "[class*=\"minibanner\"]",
            ])
            .patterns(&[r"\b(special|offer|limited|exclusive|promotion|delivery fee|add.*more)\b"])
            .expects(&["title", "call_to_action"]),
        Signature::new("article-component")
            .selectors(&["article", ".article", "[class*=\"story\"]", ".content"])
            .patterns(&[r"\b(published|author|by|date|article)\b"])
            .words(Some(100), None)
            .structure(StructuralPredicates {
                has_headings: true,
                has_paragraphs: true,
                ..Default::default()
            })
            .expects(&["title", "content", "author", "publish_date"]),
        Signature::new("recipe-component")
            .selectors(&[".recipe", "[class*=\"recipe\"]", "[data-recipe]"])
            .patterns(&[r"\b(ingredients|prep time|cook time|serves|recipe)\b"])
            .words(Some(50), None)
            .structure(StructuralPredicates {
                has_list: true,
                ..Default::default()
            })
            .list_field("ingredients")
            .expects(&["title", "ingredients", "prep_time", "instructions"]),
        Signature::new("gallery-component")
            .selectors(&[".gallery", "[class*=\"gallery\"]", ".carousel", ".slideshow"])
            .structure(StructuralPredicates {
                min_images: Some(3),
                ..Default::default()
            })
            .expects(&["images", "captions"]),
        Signature::new("card-component")
            .selectors(&[
                ".card",
                "[class*=\"card\"]",
                ".tile",
                "[class*=\"tile\"]",
                ".offer-tile",
                "[class*=\"offer\"]",
            ])
            .structure(StructuralPredicates {
                has_image: true,
                ..Default::default()
            })
            .expects(&["title", "image", "description"]),
        Signature::new("promotional-tile")
            .selectors(&[".offer-tile", "[class*=\"offer\"]", "[data-bi-placement]"])
            .patterns(&[r"\b(offer|special|deal|promotion|save|discount)\b"])
            .structure(StructuralPredicates {
                has_background_image: true,
                ..Default::default()
            })
            .expects(&["title", "image", "offer_text"]),
        Signature::new("quote-component")
            .selectors(&["blockquote", ".quote", "[class*=\"quote\"]", ".testimonial"])
            .patterns(&[r#"["“].+["”]"#, r"\b(said|says|quote|testimonial)\b"])
            .expects(&["quote_text", "author"]),
        Signature::new("list-component")
            .selectors(&["ul", "ol", ".list", "[class*=\"list\"]"])
            .structure(StructuralPredicates {
                has_list: true,
                ..Default::default()
            })
            .expects(&["items"]),
        Signature::new("form-component")
            .selectors(&["form", ".form", "[class*=\"form\"]"])
            .structure(StructuralPredicates {
                has_inputs: true,
                ..Default::default()
            })
            .expects(&["fields", "action", "method"]),
        Signature::new("membership-info")
            .selectors(&["[id*=\"warehouse\"]", "[class*=\"warehouse\"]", "[class*=\"member\"]"])
            .patterns(&[r"\b(member|membership|executive|gold star|warehouse|hours)\b"])
            .words(Some(10), None)
            .expects(&["location", "hours", "member_type"]),
        Signature::new("navigation-menu")
            .selectors(&["nav", ".navbar", "[class*=\"navbar\"]", "[role=\"navigation\"]"])
            .patterns(&[r"\b(home|about|contact|shop|help|account|products|services)\b"])
            .structure(StructuralPredicates {
                has_link: true,
                ..Default::default()
            })
            .expects(&["links", "brand"]),
    ]
});

/// Scores regions against the fixed signature table.
pub struct SignatureMatcher {
    signatures: &'static [Signature],
}

impl SignatureMatcher {
    /// Create a matcher over the built-in signature table.
    pub fn new() -> Self {
        Self {
            signatures: SIGNATURES.as_slice(),
        }
    }

    /// The signature table, in tie-break order.
    pub fn signatures(&self) -> &'static [Signature] {
        self.signatures
    }

    /// Look up a signature by type name.
    pub fn signature(&self, name: &str) -> Option<&'static Signature> {
        self.signatures.iter().find(|s| s.name == name)
    }

    /// Pre-classify a region.
    ///
    /// The strictly highest score above the floor wins; ties keep the earlier
    /// signature in table order. When nothing clears the floor the result is
    /// [`GENERIC_CONTENT`] with the best score and fields seen.
    pub fn match_region(&self, region: &CandidateRegion<'_>) -> PreAnalysis {
        let mut winner: Option<(&'static str, f64, Fields)> = None;
        let mut best_any: Option<(f64, Fields)> = None;

        for signature in self.signatures {
            let (score, fields) = signature.score(region);

            let beats_winner = winner.as_ref().is_none_or(|(_, best, _)| score > *best);
            if score > SCORE_FLOOR && beats_winner {
                winner = Some((signature.name, score, fields.clone()));
            }

            if best_any.as_ref().is_none_or(|(best, _)| score > *best) {
                best_any = Some((score, fields));
            }
        }

        let analysis = match (winner, best_any) {
            (Some((name, score, fields)), _) => PreAnalysis {
                content_type: name.to_string(),
                score,
                fields,
            },
            (None, Some((score, fields))) => PreAnalysis {
                content_type: GENERIC_CONTENT.to_string(),
                score,
                fields,
            },
            (None, None) => PreAnalysis {
                content_type: GENERIC_CONTENT.to_string(),
                score: 0.0,
                fields: Fields::new(),
            },
        };

        debug!(
            region = %region.label(),
            content_type = %analysis.content_type,
            score = analysis.score,
            "Signature pre-analysis"
        );
        analysis
    }
}

impl Default for SignatureMatcher {
    fn default() -> Self {
        Self::new()
    }
}
