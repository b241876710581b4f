//! Direct markup lookups for fields the classifier left empty.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::dom;

use super::region::CandidateRegion;

/// Measurement vocabulary that marks a list as an ingredient list.
static MEASUREMENT_UNITS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(cups?|tbsp|tsp|oz|lbs?|grams?|kg|ml|liters?|litres?|pinch|teaspoons?|tablespoons?)\b")
        .unwrap()
});

/// Default length of the text fallback.
const TEXT_FALLBACK_CHARS: usize = 200;

/// Canonical lookup a field name maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Heading,
    Paragraphs,
    Image,
    Link,
    Ingredients,
    Text,
}

impl Lookup {
    fn for_field(field_name: &str) -> Self {
        match field_name.trim().to_lowercase().as_str() {
            "title" | "heading" | "headline" | "headline_text" | "name" => Lookup::Heading,
            "description" | "content" | "body" | "text" | "summary" => Lookup::Paragraphs,
            "image" | "img" | "photo" | "picture" | "thumbnail" => Lookup::Image,
            "link" | "url" | "href" | "cta_link" => Lookup::Link,
            "ingredients" => Lookup::Ingredients,
            _ => Lookup::Text,
        }
    }
}

/// Best-effort field values read straight from a region's markup.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldExtractor;

impl FieldExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Value for `field_name`, or an empty string when the markup has none.
    ///
    /// Unmapped names fall back to the first 200 characters of the region
    /// text.
    pub fn fallback_value(&self, region: &CandidateRegion<'_>, field_name: &str) -> String {
        let element = region.element();

        match Lookup::for_field(field_name) {
            Lookup::Heading => dom::first_text(element, &dom::HEADINGS).unwrap_or_default(),
            Lookup::Paragraphs => dom::texts(element, &dom::PARAGRAPHS).join(" "),
            Lookup::Image => dom::first_attr(element, &dom::IMAGES, "src").unwrap_or_default(),
            Lookup::Link => dom::first_attr(element, &dom::LINKS, "href").unwrap_or_default(),
            Lookup::Ingredients => ingredient_lines(region).join("\n"),
            Lookup::Text => dom::truncate_chars(region.text(), TEXT_FALLBACK_CHARS).to_string(),
        }
    }
}

/// List items from every list that mentions a measurement unit.
fn ingredient_lines(region: &CandidateRegion<'_>) -> Vec<String> {
    region
        .element()
        .select(&dom::LISTS)
        .filter(|list| MEASUREMENT_UNITS.is_match(&dom::text(*list)))
        .flat_map(|list| dom::texts(list, &dom::LIST_ITEMS))
        .collect()
}
