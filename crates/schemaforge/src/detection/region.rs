//! Candidate region discovery.
//!
//! Three passes over a parsed document, each feeding one bounded,
//! identity-deduplicated list:
//!
//! 1. Top-level structural elements (nav, form, header, footer, aside and
//!    their ARIA equivalents) that pass the content-plausibility predicate.
//! 2. Nested components inside main-content containers, found through a table
//!    of semantic patterns plus a generic "content block" predicate.
//! 3. A loose scan of every `div` when the first two passes found too little.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{dom, Document};

// =============================================================================
// LAZY STATIC PATTERNS
// =============================================================================

static STRUCTURAL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "nav, form, header, footer, aside, .component, .widget, \
         [role=\"navigation\"], [role=\"banner\"], [role=\"search\"], \
         [role=\"contentinfo\"], [role=\"complementary\"]",
    )
    .unwrap()
});

static CONTAINERS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "main, article, section, [role=\"main\"], [id*=\"content\"], [class*=\"content\"]",
    )
    .unwrap()
});

static DIVS: Lazy<Selector> = Lazy::new(|| Selector::parse("div").unwrap());

/// Semantic component families looked for inside main-content containers.
static SEMANTIC_PATTERNS: Lazy<Vec<(&'static str, Selector)>> = Lazy::new(|| {
    [
        ("headline", "h1, h2, [class*=\"headline\"]"),
        ("article", "article, [class*=\"article\"], [class*=\"story\"]"),
        ("recipe", "[class*=\"recipe\"], [data-recipe], [itemtype*=\"Recipe\"]"),
        ("member", "[class*=\"member\"], [id*=\"member\"], [class*=\"warehouse\"]"),
        ("banner", "[class*=\"banner\"], [class*=\"hero\"], [class*=\"promo\"]"),
        ("card", "[class*=\"card\"], [class*=\"tile\"], [class*=\"teaser\"]"),
        ("list", "ul, ol, [class*=\"list\"]"),
    ]
    .into_iter()
    .map(|(family, css)| (family, Selector::parse(css).unwrap()))
    .collect()
});

/// Site-chrome label at the start of a text.
static BOILERPLATE_LEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(?:menu|navigation|footer|copyright|login|log in|sign in)\b|©)").unwrap()
});

/// Legal boilerplate anywhere in the text.
static BOILERPLATE_ANYWHERE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(cookie policy|privacy policy|all rights reserved)\b").unwrap()
});

/// Child tags that count as semantic structure for a content block.
const SEMANTIC_CHILD_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "ul", "ol", "dl", "img", "picture", "figure",
    "a", "blockquote", "table", "form", "button", "video", "time", "address",
];

/// Configuration for the region finder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinderConfig {
    /// Hard cap on the number of regions returned.
    pub max_regions: usize,
    /// Cap on nested components taken from a single container.
    pub max_nested_per_container: usize,
    /// The div fallback runs while fewer regions than this were found.
    pub fallback_below: usize,
    /// Minimum text length for a container to be searched.
    pub min_container_chars: usize,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            max_regions: 20,
            max_nested_per_container: 15,
            fallback_below: 5,
            min_container_chars: 200,
        }
    }
}

/// Which pass discovered a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionOrigin {
    /// Top-level structural element.
    Structural,
    /// Component nested inside a main-content container.
    Nested,
    /// Standalone div from the fallback scan.
    Fallback,
    /// Re-parsed from markup captured earlier in the run.
    Captured,
}

/// A subtree of a parsed document considered for classification.
///
/// Borrows from the [`Document`]; it lives only as long as one processing
/// pass over that document.
#[derive(Debug, Clone)]
pub struct CandidateRegion<'a> {
    element: ElementRef<'a>,
    origin: RegionOrigin,
    text: String,
}

impl<'a> CandidateRegion<'a> {
    /// Wrap an element as a region.
    pub fn new(element: ElementRef<'a>, origin: RegionOrigin) -> Self {
        Self {
            text: dom::text(element),
            element,
            origin,
        }
    }

    /// The underlying element.
    pub fn element(&self) -> ElementRef<'a> {
        self.element
    }

    /// Which pass found this region.
    pub fn origin(&self) -> RegionOrigin {
        self.origin
    }

    /// Lowercased tag name.
    pub fn tag(&self) -> String {
        dom::tag(self.element)
    }

    /// Class list.
    pub fn classes(&self) -> Vec<&'a str> {
        self.element.value().classes().collect()
    }

    /// `id` attribute, if any.
    pub fn id_attr(&self) -> Option<&'a str> {
        self.element.value().id()
    }

    /// Rendered text (whitespace-normalized).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Word count of the rendered text.
    pub fn word_count(&self) -> usize {
        dom::word_count(&self.text)
    }

    /// Outer HTML of the region.
    pub fn html(&self) -> String {
        self.element.html()
    }

    /// Immediate element children.
    pub fn structural_children(&self) -> Vec<ElementRef<'a>> {
        dom::child_elements(self.element).collect()
    }

    /// Short human-readable label, e.g. `div#main.card.featured`.
    pub fn label(&self) -> String {
        let mut label = self.tag();
        if let Some(id) = self.id_attr() {
            label.push('#');
            label.push_str(id);
        }
        for class in self.classes().iter().take(3) {
            label.push('.');
            label.push_str(class);
        }
        label
    }
}

/// Finds candidate content regions in a document.
pub struct RegionFinder {
    config: FinderConfig,
}

impl RegionFinder {
    /// Create a finder with default configuration.
    pub fn new() -> Self {
        Self::with_config(FinderConfig::default())
    }

    /// Create a finder with custom configuration.
    pub fn with_config(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find candidate regions.
    ///
    /// Deterministic for a fixed document, at most `max_regions` long, no
    /// node appears twice, and discovery order is preserved.
    pub fn find_regions<'a>(&self, document: &'a Document) -> Vec<CandidateRegion<'a>> {
        let mut collector = Collector::new(self.config.max_regions);
        let html = document.html();

        // Pass 1: structural elements
        for element in html.select(&STRUCTURAL) {
            if collector.is_full() {
                break;
            }
            let text = dom::text(element);
            if is_plausible_content(&text) {
                collector.push(element, RegionOrigin::Structural, text);
            }
        }

        // Pass 2: nested components inside main-content containers
        for container in html.select(&CONTAINERS) {
            if collector.is_full() {
                break;
            }
            if dom::char_len(&dom::text(container)) <= self.config.min_container_chars {
                continue;
            }
            self.collect_nested(container, &mut collector);
        }

        // Pass 3: loose div scan
        if collector.len() < self.config.fallback_below {
            for div in html.select(&DIVS) {
                if collector.is_full() {
                    break;
                }
                let text = dom::text(div);
                if is_standalone_content(&text) {
                    collector.push(div, RegionOrigin::Fallback, text);
                }
            }
        }

        debug!(
            file = document.file_name(),
            regions = collector.len(),
            "Region discovery finished"
        );
        collector.into_regions()
    }

    /// Collect nested components of one container, capped per container.
    fn collect_nested<'a>(&self, container: ElementRef<'a>, collector: &mut Collector<'a>) {
        let mut taken = 0;

        for element in container.descendants().filter_map(ElementRef::wrap) {
            if taken >= self.config.max_nested_per_container || collector.is_full() {
                break;
            }
            if element == container {
                continue;
            }

            let matches_pattern = SEMANTIC_PATTERNS
                .iter()
                .any(|(_, selector)| selector.matches(&element));
            let is_div = dom::tag(element) == "div";
            if !matches_pattern && !is_div {
                continue;
            }

            let text = dom::text(element);
            let accepted = (matches_pattern && is_plausible_component(&text))
                || (is_div && is_content_block(element, &text));

            if accepted && collector.push(element, RegionOrigin::Nested, text) {
                taken += 1;
            }
        }
    }
}

impl Default for RegionFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Semantic family names the nested pass looks for.
pub fn semantic_families() -> Vec<&'static str> {
    SEMANTIC_PATTERNS.iter().map(|(family, _)| *family).collect()
}

/// Bounded region list deduplicated by node identity.
struct Collector<'a> {
    regions: Vec<CandidateRegion<'a>>,
    cap: usize,
}

impl<'a> Collector<'a> {
    fn new(cap: usize) -> Self {
        Self {
            regions: Vec::with_capacity(cap),
            cap,
        }
    }

    fn len(&self) -> usize {
        self.regions.len()
    }

    fn is_full(&self) -> bool {
        self.regions.len() >= self.cap
    }

    /// Add a region unless the list is full or the node is already present.
    fn push(&mut self, element: ElementRef<'a>, origin: RegionOrigin, text: String) -> bool {
        if self.is_full() || self.regions.iter().any(|r| r.element == element) {
            return false;
        }
        self.regions.push(CandidateRegion {
            element,
            origin,
            text,
        });
        true
    }

    fn into_regions(self) -> Vec<CandidateRegion<'a>> {
        self.regions
    }
}

// =============================================================================
// PLAUSIBILITY PREDICATES
// =============================================================================

/// Texts this short that open with a chrome label are mostly that label.
const CHROME_LABEL_MAX_WORDS: usize = 5;

/// True when the text is mostly a site-chrome label or carries legal boilerplate.
///
/// A leading label only counts on short texts, so "Login to see member
/// prices..." stays content while "Sign in to your account" does not.
pub fn is_boilerplate(text: &str) -> bool {
    let lower = text.to_lowercase();
    let chrome_label = dom::word_count(&lower) <= CHROME_LABEL_MAX_WORDS
        && BOILERPLATE_LEAD.is_match(&lower);
    chrome_label || BOILERPLATE_ANYWHERE.is_match(&lower)
}

/// Structural elements: 50..=3000 chars, at least 10 words, no boilerplate.
fn is_plausible_content(text: &str) -> bool {
    let len = dom::char_len(text);
    (50..=3000).contains(&len) && dom::word_count(text) >= 10 && !is_boilerplate(text)
}

/// Semantic-pattern matches inside a container: short headlines are welcome.
fn is_plausible_component(text: &str) -> bool {
    let len = dom::char_len(text);
    (15..=3000).contains(&len) && dom::word_count(text) >= 2 && !is_boilerplate(text)
}

/// Generic content block: a div with bounded text and real structure.
fn is_content_block(element: ElementRef<'_>, text: &str) -> bool {
    let len = dom::char_len(text);
    let words = dom::word_count(text);
    if !(50..=1500).contains(&len) || !(8..=300).contains(&words) || is_boilerplate(text) {
        return false;
    }

    let semantic_children = dom::child_elements(element)
        .filter(|child| SEMANTIC_CHILD_TAGS.contains(&child.value().name()))
        .count();
    semantic_children >= 2
}

/// Fallback scan: 100..=3000 chars, at least 15 words, no boilerplate.
fn is_standalone_content(text: &str) -> bool {
    let len = dom::char_len(text);
    (100..=3000).contains(&len) && dom::word_count(text) >= 15 && !is_boilerplate(text)
}
