//! Fuzz target for region discovery and signature matching.
//!
//! Builds markup from structured input so the fuzzer reaches the nested and
//! fallback passes instead of only generating unparseable noise.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use schemaforge::{Document, FieldExtractor, RegionFinder, SignatureMatcher};

#[derive(Debug, Arbitrary)]
enum Block {
    Nav(Vec<String>),
    Card { class: String, heading: String, body: String },
    Div(String),
    List(Vec<String>),
    Raw(String),
}

#[derive(Debug, Arbitrary)]
struct Page {
    container: bool,
    blocks: Vec<Block>,
}

fn render(page: &Page) -> String {
    let mut html = String::from("<html><body>");
    if page.container {
        html.push_str("<main>");
    }
    for block in page.blocks.iter().take(500) {
        match block {
            Block::Nav(links) => {
                html.push_str("<nav>");
                for link in links.iter().take(50) {
                    html.push_str(&format!("<a href=\"/{0}\">{0}</a>", link));
                }
                html.push_str("</nav>");
            }
            Block::Card { class, heading, body } => html.push_str(&format!(
                "<div class=\"{}\"><h2>{}</h2><p>{}</p></div>",
                class, heading, body
            )),
            Block::Div(text) => html.push_str(&format!("<div>{}</div>", text)),
            Block::List(items) => {
                html.push_str("<ul>");
                for item in items.iter().take(50) {
                    html.push_str(&format!("<li>{}</li>", item));
                }
                html.push_str("</ul>");
            }
            Block::Raw(raw) => html.push_str(raw),
        }
    }
    if page.container {
        html.push_str("</main>");
    }
    html.push_str("</body></html>");
    html
}

fuzz_target!(|page: Page| {
    let html = render(&page);
    if html.len() > 200_000 {
        return;
    }

    let doc = Document::parse("fuzz.html", &html);
    let regions = RegionFinder::new().find_regions(&doc);
    assert!(regions.len() <= 20);

    let matcher = SignatureMatcher::new();
    let extractor = FieldExtractor::new();
    for region in &regions {
        let pre = matcher.match_region(region);
        assert!((0.0..=1.0).contains(&pre.score));
        let _ = extractor.fallback_value(region, "title");
        let _ = extractor.fallback_value(region, "ingredients");
    }
});
