//! Small helpers over `scraper` element references.
//!
//! Every region-level heuristic reads markup through these functions so that
//! text normalization (whitespace collapsing, skipping script/style bodies) is
//! the same everywhere.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Node, Selector};

// =============================================================================
// SHARED SELECTORS
// =============================================================================

pub static HEADINGS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());
pub static TOP_HEADINGS: Lazy<Selector> = Lazy::new(|| Selector::parse("h1, h2, h3").unwrap());
pub static PARAGRAPHS: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
pub static IMAGES: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
pub static LINKS: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
pub static LISTS: Lazy<Selector> = Lazy::new(|| Selector::parse("ul, ol").unwrap());
pub static LIST_ITEMS: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());
pub static FORMS: Lazy<Selector> = Lazy::new(|| Selector::parse("form").unwrap());
pub static FORM_INPUTS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input, select, textarea").unwrap());
pub static STYLED: Lazy<Selector> = Lazy::new(|| Selector::parse("[style]").unwrap());

/// Elements whose text is never rendered.
const SILENT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Rendered text of an element: text nodes joined with single spaces.
pub fn text(element: ElementRef<'_>) -> String {
    let mut words: Vec<&str> = Vec::new();
    let mut stack: Vec<_> = element.children().rev().collect();

    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(t) => words.extend(t.split_whitespace()),
            Node::Element(e) if SILENT_TAGS.contains(&e.name()) => {}
            Node::Element(_) => stack.extend(node.children().rev()),
            _ => {}
        }
    }

    words.join(" ")
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of characters (not bytes).
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Truncate to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// First descendant matching `selector`.
pub fn first<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    element.select(selector).next()
}

/// Text of the first descendant matching `selector` with non-empty text.
pub fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .map(text)
        .find(|t| !t.is_empty())
}

/// Attribute of the first descendant matching `selector`.
pub fn first_attr(element: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    first(element, selector)
        .and_then(|e| e.value().attr(attr))
        .map(|v| v.trim().to_string())
}

/// Non-empty texts of every descendant matching `selector`, in document order.
pub fn texts(element: ElementRef<'_>, selector: &Selector) -> Vec<String> {
    element
        .select(selector)
        .map(text)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Direct element children.
pub fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

/// Lowercased tag name.
pub fn tag(element: ElementRef<'_>) -> String {
    element.value().name().to_ascii_lowercase()
}

/// True when the `class` or `id` attribute contains `needle` (case-insensitive).
pub fn class_or_id_contains(element: ElementRef<'_>, needle: &str) -> bool {
    let value = element.value();
    let needle = needle.to_ascii_lowercase();
    value
        .attr("class")
        .is_some_and(|c| c.to_ascii_lowercase().contains(&needle))
        || value
            .attr("id")
            .is_some_and(|i| i.to_ascii_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn root_of(html: &Html) -> ElementRef<'_> {
        html.root_element()
    }

    #[test]
    fn test_text_skips_scripts_and_collapses_whitespace() {
        let html = Html::parse_fragment(
            "<div>  Hello\n\n <b>big</b> world<script>var x = 1;</script><style>p{}</style></div>",
        );
        assert_eq!(text(root_of(&html)), "Hello big world");
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_first_helpers() {
        let html = Html::parse_fragment(
            r#"<div><h3></h3><h2>Title</h2><img src=" a.png "><a href="/x">x</a></div>"#,
        );
        let root = root_of(&html);
        assert_eq!(first_text(root, &HEADINGS).as_deref(), Some("Title"));
        assert_eq!(first_attr(root, &IMAGES, "src").as_deref(), Some("a.png"));
        assert_eq!(first_attr(root, &LINKS, "href").as_deref(), Some("/x"));
        assert!(first_attr(root, &PARAGRAPHS, "class").is_none());
    }

    #[test]
    fn test_class_or_id_contains() {
        let html = Html::parse_fragment(r#"<div id="MainContent" class="x"></div>"#);
        let div = html
            .select(&Selector::parse("div").unwrap())
            .next()
            .unwrap();
        assert!(class_or_id_contains(div, "content"));
        assert!(!class_or_id_contains(div, "banner"));
    }
}
