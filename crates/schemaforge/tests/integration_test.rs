//! End-to-end tests for the migration pipeline.

use std::fs;
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use schemaforge::classify::UNKNOWN_TYPE;
use schemaforge::detection::Fields;
use schemaforge::schema::build_schema;
use schemaforge::{
    report, ClassificationResult, Collection, ContentClassifier, Document, DocumentStore,
    ForgeError, JsonFileStore, MemoryStore, MigrationConfig, Migrator, MockProvider,
    PatternDetector, RegionFinder, Result, SignatureMatcher, TypeRegistry,
};

const NAV_PAGE: &str = r#"<html><body><nav>
    <a href="/">Home page</a><a href="/about">About our company</a>
    <a href="/contact">Contact the team</a><a href="/shop">Shop all products</a>
    <a href="/blog">Read the blog</a><a href="/help">Help center</a>
    <a href="/cart">Your cart</a><a href="/account">Account settings</a>
</nav></body></html>"#;

const TEASER_PAGE: &str = r#"<html><body><main>
    <div class="teaser-card">
      <h3>Spring garden guide</h3>
      <img src="/img/garden.jpg" alt="garden">
      <p>Everything you need to plan raised beds, choose seeds that suit your climate,
         keep the soil healthy through the warm months and harvest vegetables at their best
         this season, with tips from our gardeners and a printable planting calendar.</p>
      <a href="/garden">Read more</a>
    </div>
</main></body></html>"#;

/// Helper to create a folder of pages.
fn create_pages(pages: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (name, markup) in pages {
        fs::write(dir.path().join(name), markup).expect("Failed to write page");
    }
    dir
}

fn teaser_pages() -> TempDir {
    create_pages(&[
        ("garden.html", TEASER_PAGE),
        ("kitchen.html", TEASER_PAGE),
        ("outdoors.html", TEASER_PAGE),
    ])
}

fn teaser_fields() -> Fields {
    let mut fields = Fields::new();
    fields.insert("title".to_string(), json!("Spring garden guide"));
    fields.insert("description".to_string(), json!("Everything you need to plan raised beds."));
    fields.insert("image".to_string(), json!("/img/garden.jpg"));
    fields.insert("link".to_string(), json!("/garden"));
    fields
}

/// Store whose writes always fail.
struct UnavailableStore;

impl DocumentStore for UnavailableStore {
    fn insert(&self, _: Collection, _: Value) -> Result<()> {
        Err(ForgeError::Store("connection refused".to_string()))
    }

    fn find_all(&self, _: Collection) -> Result<Vec<Value>> {
        Ok(Vec::new())
    }

    fn find_by(&self, _: Collection, _: &str, _: &Value) -> Result<Vec<Value>> {
        Ok(Vec::new())
    }

    fn upsert(&self, _: Collection, _: Value) -> Result<()> {
        Err(ForgeError::Store("connection refused".to_string()))
    }

    fn clear(&self, _: Collection) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_scenario_navigation_page() {
    let doc = Document::parse("index.html", NAV_PAGE);
    let regions = RegionFinder::new().find_regions(&doc);
    assert_eq!(regions.len(), 1);

    let pre = SignatureMatcher::new().match_region(&regions[0]);
    assert_eq!(pre.content_type, "navigation-menu");
    assert!(pre.score >= 0.4);

    let provider = MockProvider::scripted([r#"{"type":"navigation-menu","confidence":0.9,"fields":{"links":["Home","About","Contact","Shop","Blog","Help","Cart","Account"]}}"#]);
    let classifier =
        ContentClassifier::new(Arc::new(TypeRegistry::new())).with_llm(Arc::new(provider));
    let result = classifier.classify(&regions[0], "index.html");

    assert!(result.looks_good());
    assert_eq!(result.content_type, "navigation-menu");
    assert_eq!(result.fields["links"].as_array().map(Vec::len), Some(8));
}

#[test]
fn test_scenario_teaser_promotion() {
    let results: Vec<ClassificationResult> = ["a.html", "b.html", "c.html", "a.html", "b.html"]
        .iter()
        .map(|file| {
            ClassificationResult::new("teaser-component", 0.8, teaser_fields(), *file, "<div></div>")
        })
        .collect();

    let promoted = PatternDetector::new().detect(&results);
    let pattern = &promoted["teaser-component"];

    assert_eq!(pattern.instances_count, 5);
    assert!((pattern.reusability_score - 1.0).abs() < 1e-9);
    assert_eq!(pattern.common_fields, vec!["title", "description", "image", "link"]);
}

#[test]
fn test_scenario_llm_failure() {
    let doc = Document::parse("index.html", NAV_PAGE);
    let regions = RegionFinder::new().find_regions(&doc);
    let classifier = ContentClassifier::new(Arc::new(TypeRegistry::new()))
        .with_llm(Arc::new(MockProvider::failing("rate limited")));

    let result = classifier.classify(&regions[0], "index.html");
    assert_eq!(result.content_type, UNKNOWN_TYPE);
    assert_eq!(result.confidence, 0.0);
    assert!(result.fields.is_empty());
}

#[test]
fn test_cms_format_preserves_fields() {
    let table = json!({
        "title": {"type": "text", "required": true},
        "summary": {"type": "text", "required": false, "multiline": true},
        "hero_image": {"type": "image", "required": true},
        "published": {"type": "datetime"}
    });
    let schema = build_schema("article-component", table.as_object().unwrap());
    let cms = schema.to_cms_format();

    assert_eq!(cms.schema.len(), 4);
    for (field, cms_field) in schema.fields.iter().zip(&cms.schema) {
        assert_eq!(field.required, cms_field.mandatory);
    }
    assert_eq!(cms.options.title, "title");
}

// =============================================================================
// Full migration runs
// =============================================================================

#[test]
fn test_full_migration_with_memory_store() {
    let dir = teaser_pages();
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(MockProvider::new());
    let migrator = Migrator::new(MigrationConfig::default(), store.clone())
        .with_shared_llm(provider.clone());

    let result = migrator.migrate(dir.path()).expect("Migration failed");

    assert_eq!(result.summary.pages_analyzed, 3);
    assert_eq!(result.summary.results_accepted, 3);
    assert!(result.schemas.contains_key("teaser-component"));
    assert_eq!(result.summary.content_extracted, 3);
    assert!(result.patterns.contains_key("teaser-component"));
    assert!(provider.calls() >= 4);

    let extracted = &result.extracted[0];
    assert_eq!(extracted.field_data["image"], "/img/garden.jpg");
    assert_eq!(extracted.field_data["link"], "/garden");

    assert_eq!(store.count(Collection::PageInfo).unwrap(), 3);
    assert_eq!(store.count(Collection::ExtractedData).unwrap(), 3);

    let types = store
        .find_by(Collection::ComponentTypes, "type", &json!("teaser-component"))
        .unwrap();
    assert_eq!(types.len(), 1);
    assert_eq!(types[0]["reusable"], json!(true));
    assert_eq!(types[0]["schema_uid"], json!("teaser-component_component"));
    assert_eq!(types[0]["source_files"].as_array().map(Vec::len), Some(3));
}

#[test]
fn test_full_migration_with_json_file_store() {
    let dir = teaser_pages();
    let workspace = TempDir::new().unwrap();
    let store_dir = workspace.path().join("store");
    let out_dir = workspace.path().join("out");

    let store = JsonFileStore::open(&store_dir).unwrap();
    let migrator = Migrator::new(MigrationConfig::default(), Arc::new(store));
    let result = migrator.migrate(dir.path()).unwrap();
    let paths = report::write_artifacts(&result, &out_dir).unwrap();

    for path in paths.all() {
        assert!(path.exists());
    }

    let reopened = JsonFileStore::open(&store_dir).unwrap();
    assert_eq!(reopened.count(Collection::PageInfo).unwrap(), 3);
    assert_eq!(
        reopened.count(Collection::ComponentSchemas).unwrap(),
        result.summary.schemas_created
    );
    assert!(store_dir.join("page_types.json").exists());

    let report: Value =
        serde_json::from_str(&fs::read_to_string(&paths.report).unwrap()).unwrap();
    assert_eq!(report["summary"]["pages_analyzed"], json!(3));
}

#[test]
fn test_rerun_upserts_pages() {
    let dir = teaser_pages();
    let store = Arc::new(MemoryStore::new());

    Migrator::new(MigrationConfig::default(), store.clone())
        .migrate(dir.path())
        .unwrap();
    Migrator::new(MigrationConfig::default(), store.clone())
        .migrate(dir.path())
        .unwrap();

    assert_eq!(store.count(Collection::PageInfo).unwrap(), 3);
    assert_eq!(store.count(Collection::ComponentTypes).unwrap(), 1);
}

#[test]
fn test_store_failure_is_fatal() {
    let dir = teaser_pages();
    let migrator = Migrator::new(MigrationConfig::default(), Arc::new(UnavailableStore));

    let result = migrator.migrate(dir.path());
    assert!(matches!(result, Err(ForgeError::Store(_))));
}

#[test]
fn test_folder_without_pages() {
    let dir = create_pages(&[("readme.md", "# not a page")]);
    let migrator = Migrator::new(MigrationConfig::default(), Arc::new(MemoryStore::new()));

    assert!(matches!(migrator.migrate(dir.path()), Err(ForgeError::EmptyData(_))));
}

#[test]
fn test_pages_without_components_still_recorded() {
    let dir = create_pages(&[("blank.html", "<html><body><p>Hi</p></body></html>")]);
    let store = Arc::new(MemoryStore::new());
    let result = Migrator::new(MigrationConfig::default(), store.clone())
        .migrate(dir.path())
        .unwrap();

    assert_eq!(result.summary.results_accepted, 0);
    assert!(result.schemas.is_empty());
    assert_eq!(store.count(Collection::PageInfo).unwrap(), 1);
}
