//! Migration orchestrator: runs the detection pipeline over a folder of pages.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::classify::{ClassificationResult, ClassifierConfig, ContentClassifier, TypeRegistry};
use crate::detection::{CandidateRegion, FieldExtractor, FinderConfig, RegionFinder, RegionOrigin};
use crate::document::{dom, Document};
use crate::error::{ForgeError, Result};
use crate::llm::{LlmConfig, LlmProvider};
use crate::patterns::{PatternConfig, PatternDetector, ReusablePattern};
use crate::schema::{title_case, CmsComponent, ComponentSchema, SchemaSynthesizer, SynthesizerConfig};
use crate::store::{Collection, DocumentStore};

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for a migration run.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Region finder configuration.
    pub finder: FinderConfig,
    /// Classifier configuration.
    pub classifier: ClassifierConfig,
    /// Schema synthesizer configuration.
    pub synthesizer: SynthesizerConfig,
    /// Pattern detector configuration.
    pub patterns: PatternConfig,
    /// Settings used when building an LLM provider for the run.
    pub llm: LlmConfig,
    /// Extension of input files, without the dot.
    pub extension: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            finder: FinderConfig::default(),
            classifier: ClassifierConfig::default(),
            synthesizer: SynthesizerConfig::default(),
            patterns: PatternConfig::default(),
            llm: LlmConfig::default(),
            extension: "html".to_string(),
        }
    }
}

impl MigrationConfig {
    /// Set the minimum confidence for a classification to be kept.
    pub fn with_min_confidence(mut self, threshold: f64) -> Self {
        self.classifier = self.classifier.with_acceptance_threshold(threshold);
        self
    }

    /// Set the LLM settings.
    pub fn with_llm_config(mut self, llm: LlmConfig) -> Self {
        self.llm = llm;
        self
    }

    /// Set the input file extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }
}

// ============================================================================
// Run artifacts
// ============================================================================

/// Analysis record for one source page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page_name: String,
    pub file_size: u64,
    /// Distinct content types accepted on this page, in discovery order.
    pub content_types_found: Vec<String>,
    pub total_components: usize,
    pub analyzed_at: DateTime<Utc>,
}

impl PageInfo {
    fn new(page_name: impl Into<String>, file_size: u64, results: &[ClassificationResult]) -> Self {
        let mut content_types_found: Vec<String> = Vec::new();
        for result in results {
            if !content_types_found.contains(&result.content_type) {
                content_types_found.push(result.content_type.clone());
            }
        }

        Self {
            page_name: page_name.into(),
            file_size,
            content_types_found,
            total_components: results.len(),
            analyzed_at: Utc::now(),
        }
    }
}

/// Field values of one accepted component, shaped by its type's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub component_type: String,
    pub source_file: String,
    pub confidence: f64,
    pub field_data: IndexMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl ExtractedContent {
    /// Document form for the store.
    pub fn to_document(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuild a classification result, for pattern analysis over stored data.
    pub fn to_result(&self) -> ClassificationResult {
        let fields = self
            .field_data
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();

        ClassificationResult::new(
            self.component_type.clone(),
            self.confidence,
            fields,
            self.source_file.clone(),
            String::new(),
        )
    }
}

/// Registry document for a content type with an accepted schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentTypeRecord {
    #[serde(rename = "type")]
    pub content_type: String,
    pub display_name: String,
    pub schema_uid: String,
    pub instances: usize,
    pub source_files: Vec<String>,
    pub reusable: bool,
    pub reusability_score: f64,
    pub updated_at: DateTime<Utc>,
}

/// Counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationSummary {
    pub elapsed_secs: f64,
    pub pages_analyzed: usize,
    pub regions_found: usize,
    pub results_accepted: usize,
    pub schemas_created: usize,
    pub content_extracted: usize,
    pub patterns_promoted: usize,
    /// Content types with an accepted schema.
    pub content_types: Vec<String>,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    pub summary: MigrationSummary,
    pub page_info: Vec<PageInfo>,
    /// Accepted schemas by content type.
    pub schemas: IndexMap<String, ComponentSchema>,
    pub extracted: Vec<ExtractedContent>,
    /// Promoted reusable patterns by content type.
    pub patterns: IndexMap<String, ReusablePattern>,
    /// Accepted classification results.
    pub results: Vec<ClassificationResult>,
}

impl MigrationResult {
    /// CMS component definitions for the promoted patterns.
    pub fn cms_components(&self) -> Vec<CmsComponent> {
        self.patterns.values().map(ReusablePattern::to_cms_component).collect()
    }

    /// Schemas keyed by content type, in CMS format.
    pub fn cms_schemas(&self) -> IndexMap<String, CmsComponent> {
        self.schemas
            .iter()
            .map(|(content_type, schema)| (content_type.clone(), schema.to_cms_format()))
            .collect()
    }
}

// ============================================================================
// Migrator
// ============================================================================

/// Sequences region finding, classification, schema synthesis and pattern
/// detection over a folder of HTML pages, persisting as it goes.
///
/// Pages are processed one at a time. Load, LLM and schema failures degrade
/// locally; any store failure aborts the run.
pub struct Migrator {
    config: MigrationConfig,
    store: Arc<dyn DocumentStore>,
    registry: Arc<TypeRegistry>,
    finder: RegionFinder,
    classifier: ContentClassifier,
    synthesizer: SchemaSynthesizer,
    extractor: FieldExtractor,
    detector: PatternDetector,
}

impl Migrator {
    /// Create a migrator without an LLM provider.
    ///
    /// Without a provider, signature pre-analysis is the verdict and schemas
    /// are inferred from the extracted fields.
    pub fn new(config: MigrationConfig, store: Arc<dyn DocumentStore>) -> Self {
        let registry = Arc::new(TypeRegistry::new());

        Self {
            finder: RegionFinder::with_config(config.finder.clone()),
            classifier: ContentClassifier::with_config(config.classifier.clone(), registry.clone()),
            synthesizer: SchemaSynthesizer::with_config(config.synthesizer.clone()),
            extractor: FieldExtractor::new(),
            detector: PatternDetector::with_config(config.patterns.clone()),
            registry,
            store,
            config,
        }
    }

    /// Use an LLM provider for classification and schema synthesis.
    pub fn with_llm(self, provider: impl LlmProvider + 'static) -> Self {
        self.with_shared_llm(Arc::new(provider))
    }

    /// Use a provider that is shared with the caller.
    pub fn with_shared_llm(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.classifier = self.classifier.with_llm(provider.clone());
        self.synthesizer = self.synthesizer.with_llm(provider);
        self
    }

    /// Run configuration.
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Content types known so far.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The backing store.
    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// Migrate every page in `dir`.
    pub fn migrate(&self, dir: impl AsRef<Path>) -> Result<MigrationResult> {
        let started = Instant::now();
        let dir = dir.as_ref();
        let files = self.collect_files(dir)?;

        self.load_known_types()?;
        info!(
            dir = %dir.display(),
            pages = files.len(),
            store = self.store.name(),
            llm = self.classifier.has_llm(),
            "Starting migration"
        );

        // Pass 1: regions and classification, one page at a time.
        let mut results: Vec<ClassificationResult> = Vec::new();
        let mut page_info = Vec::with_capacity(files.len());
        let mut regions_found = 0;

        for path in &files {
            let (page, page_results, regions) = self.analyze_page(path);
            self.store.upsert(Collection::PageInfo, serde_json::to_value(&page)?)?;

            regions_found += regions;
            results.extend(page_results);
            page_info.push(page);
        }

        // Pass 2: one schema per content type.
        let schemas = self.synthesize_schemas(&results)?;

        // Pass 3: content records for every result whose type has a schema.
        let extracted: Vec<ExtractedContent> = results
            .iter()
            .filter_map(|result| {
                schemas
                    .get(&result.content_type)
                    .map(|schema| self.extract_content(result, schema))
            })
            .collect();
        let documents = extracted
            .iter()
            .map(ExtractedContent::to_document)
            .collect::<Result<Vec<_>>>()?;
        self.store.insert_many(Collection::ExtractedData, documents)?;

        // Pass 4: reusability across pages.
        let analyzed = self.detector.analyze(&results);
        self.record_types(&schemas, &results, &analyzed)?;
        let patterns: IndexMap<String, ReusablePattern> = analyzed
            .into_iter()
            .filter(|(_, pattern)| self.detector.is_promoted(pattern))
            .collect();

        let summary = MigrationSummary {
            elapsed_secs: started.elapsed().as_secs_f64(),
            pages_analyzed: page_info.len(),
            regions_found,
            results_accepted: results.len(),
            schemas_created: schemas.len(),
            content_extracted: extracted.len(),
            patterns_promoted: patterns.len(),
            content_types: schemas.keys().cloned().collect(),
        };

        info!(
            pages = summary.pages_analyzed,
            accepted = summary.results_accepted,
            schemas = summary.schemas_created,
            patterns = summary.patterns_promoted,
            "Migration finished"
        );

        Ok(MigrationResult {
            summary,
            page_info,
            schemas,
            extracted,
            patterns,
            results,
        })
    }

    /// Input files in `dir`, sorted by name.
    fn collect_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(dir).map_err(|e| ForgeError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.config.extension))
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(ForgeError::EmptyData(format!(
                "no .{} files in '{}'",
                self.config.extension,
                dir.display()
            )));
        }
        Ok(files)
    }

    /// Seed the registry with types persisted by earlier runs.
    fn load_known_types(&self) -> Result<()> {
        for doc in self.store.find_all(Collection::ComponentTypes)? {
            if let Some(content_type) = doc.get("type").and_then(Value::as_str) {
                self.registry.register(content_type);
            }
        }
        Ok(())
    }

    /// Classify every region of one page. Returns the page record, the
    /// accepted results and the number of regions found.
    fn analyze_page(&self, path: &Path) -> (PageInfo, Vec<ClassificationResult>, usize) {
        let page_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let document = match Document::load(path) {
            Ok(document) => document,
            Err(e) => {
                warn!(page = %page_name, error = %e, "Failed to load page, treating as empty");
                let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                return (PageInfo::new(page_name, size, &[]), Vec::new(), 0);
            }
        };

        let regions = self.finder.find_regions(&document);
        let accepted: Vec<ClassificationResult> = regions
            .iter()
            .map(|region| self.classifier.classify(region, &page_name))
            .filter(|result| self.classifier.accepts(result))
            .collect();

        debug!(
            page = %page_name,
            regions = regions.len(),
            accepted = accepted.len(),
            "Page analyzed"
        );

        let page = PageInfo::new(page_name, document.source().size_bytes, &accepted);
        (page, accepted, regions.len())
    }

    fn synthesize_schemas(
        &self,
        results: &[ClassificationResult],
    ) -> Result<IndexMap<String, ComponentSchema>> {
        let mut by_type: IndexMap<&str, Vec<ClassificationResult>> = IndexMap::new();
        for result in results.iter().filter(|r| !r.is_unknown()) {
            by_type.entry(result.content_type.as_str()).or_default().push(result.clone());
        }

        let mut schemas = IndexMap::new();
        for (content_type, examples) in by_type {
            let Some(schema) = self.synthesizer.synthesize(content_type, &examples) else {
                continue;
            };
            self.store.upsert(
                Collection::ComponentSchemas,
                serde_json::to_value(schema.to_cms_format())?,
            )?;
            schemas.insert(content_type.to_string(), schema);
        }
        Ok(schemas)
    }

    /// Fill schema fields from the classifier, falling back to the markup
    /// captured for the region.
    fn extract_content(
        &self,
        result: &ClassificationResult,
        schema: &ComponentSchema,
    ) -> ExtractedContent {
        let fragment = Document::fragment(result.source_file.as_str(), &result.html_snippet);
        let root = fragment.html().root_element();
        let element = dom::child_elements(root).next().unwrap_or(root);
        let region = CandidateRegion::new(element, RegionOrigin::Captured);

        let field_data = schema
            .fields
            .iter()
            .map(|field| {
                let value = result
                    .field_text(&field.name)
                    .unwrap_or_else(|| self.extractor.fallback_value(&region, &field.name));
                (field.name.clone(), value)
            })
            .collect();

        ExtractedContent {
            component_type: result.content_type.clone(),
            source_file: result.source_file.clone(),
            confidence: result.confidence,
            field_data,
            created_at: Utc::now(),
        }
    }

    /// Upsert a registry document for every type with an accepted schema.
    fn record_types(
        &self,
        schemas: &IndexMap<String, ComponentSchema>,
        results: &[ClassificationResult],
        analyzed: &IndexMap<String, ReusablePattern>,
    ) -> Result<()> {
        for (content_type, schema) in schemas {
            let instances: Vec<&ClassificationResult> = results
                .iter()
                .filter(|r| &r.content_type == content_type)
                .collect();

            let mut source_files: Vec<String> =
                instances.iter().map(|r| r.source_file.clone()).collect();
            source_files.sort();
            source_files.dedup();

            let pattern = analyzed.get(content_type);
            let record = ComponentTypeRecord {
                content_type: content_type.clone(),
                display_name: title_case(content_type),
                schema_uid: schema.uid(),
                instances: instances.len(),
                source_files,
                reusable: pattern.is_some_and(|p| self.detector.is_promoted(p)),
                reusability_score: pattern.map_or(0.0, |p| p.reusability_score),
                updated_at: Utc::now(),
            };
            self.store.upsert(Collection::ComponentTypes, serde_json::to_value(&record)?)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Fields;
    use crate::llm::MockProvider;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    const TEASER: &str = r#"<html><body><main>
        <div class="teaser-card">
          <h3>Spring garden guide</h3>
          <img src="/img/garden.jpg" alt="garden">
          <p>Everything you need to plan raised beds, choose seeds that suit your climate,
             keep the soil healthy through the warm months and harvest vegetables at their best
             this season, with tips from our gardeners and a printable planting calendar.</p>
          <a href="/garden">Read more</a>
        </div>
        </main></body></html>"#;

    fn pages(names: &[&str], markup: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            fs::write(dir.path().join(name), markup).unwrap();
        }
        dir
    }

    #[test]
    fn test_empty_folder_is_empty_data() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "not html").unwrap();

        let migrator = Migrator::new(MigrationConfig::default(), Arc::new(MemoryStore::new()));
        assert!(matches!(migrator.migrate(dir.path()), Err(ForgeError::EmptyData(_))));
    }

    #[test]
    fn test_missing_folder_is_io_error() {
        let migrator = Migrator::new(MigrationConfig::default(), Arc::new(MemoryStore::new()));
        let result = migrator.migrate("/definitely/not/here");
        assert!(matches!(result, Err(ForgeError::Io { .. })));
    }

    #[test]
    fn test_unreadable_page_still_recorded() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.html"), [0xff, 0xfe, 0x00, 0x41]).unwrap();

        let store = Arc::new(MemoryStore::new());
        let migrator = Migrator::new(MigrationConfig::default(), store.clone());
        let result = migrator.migrate(dir.path()).unwrap();

        assert_eq!(result.summary.pages_analyzed, 1);
        assert_eq!(result.page_info[0].total_components, 0);
        assert_eq!(result.page_info[0].file_size, 4);
        assert_eq!(store.count(Collection::PageInfo).unwrap(), 1);
    }

    #[test]
    fn test_offline_run_extracts_and_persists() {
        let dir = pages(&["a.html", "b.html", "c.html"], TEASER);
        let store = Arc::new(MemoryStore::new());
        let migrator = Migrator::new(MigrationConfig::default(), store.clone());

        let result = migrator.migrate(dir.path()).unwrap();

        assert_eq!(result.summary.pages_analyzed, 3);
        assert!(result.summary.results_accepted >= 3);
        assert_eq!(result.summary.content_extracted, result.extracted.len());
        assert_eq!(store.count(Collection::PageInfo).unwrap(), 3);
        assert_eq!(
            store.count(Collection::ComponentSchemas).unwrap(),
            result.summary.schemas_created
        );
        assert_eq!(
            store.count(Collection::ComponentTypes).unwrap(),
            result.summary.schemas_created
        );
        assert_eq!(
            store.count(Collection::ExtractedData).unwrap(),
            result.summary.content_extracted
        );
    }

    /// Counts single and batched inserts on top of a memory store.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        inserts: std::sync::atomic::AtomicUsize,
        batches: std::sync::atomic::AtomicUsize,
    }

    impl DocumentStore for CountingStore {
        fn insert(&self, collection: Collection, document: Value) -> Result<()> {
            self.inserts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.insert(collection, document)
        }

        fn insert_many(&self, collection: Collection, documents: Vec<Value>) -> Result<()> {
            self.batches.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.insert_many(collection, documents)
        }

        fn find_all(&self, collection: Collection) -> Result<Vec<Value>> {
            self.inner.find_all(collection)
        }

        fn find_by(&self, collection: Collection, field: &str, value: &Value) -> Result<Vec<Value>> {
            self.inner.find_by(collection, field, value)
        }

        fn upsert(&self, collection: Collection, document: Value) -> Result<()> {
            self.inner.upsert(collection, document)
        }

        fn clear(&self, collection: Collection) -> Result<()> {
            self.inner.clear(collection)
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_extracted_records_written_in_one_batch() {
        use std::sync::atomic::Ordering;

        let dir = pages(&["a.html", "b.html", "c.html", "d.html"], TEASER);
        let store = Arc::new(CountingStore::default());
        let result = Migrator::new(MigrationConfig::default(), store.clone())
            .migrate(dir.path())
            .unwrap();

        assert_eq!(result.summary.content_extracted, 4);
        assert_eq!(store.batches.load(Ordering::SeqCst), 1);
        assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
        assert_eq!(store.count(Collection::ExtractedData).unwrap(), 4);
    }

    #[test]
    fn test_extract_content_falls_back_to_markup() {
        let migrator = Migrator::new(MigrationConfig::default(), Arc::new(MemoryStore::new()));
        let mut fields = Fields::new();
        fields.insert("title".to_string(), json!("From the classifier"));
        fields.insert("link".to_string(), json!(""));

        let result = ClassificationResult::new(
            "teaser-component",
            0.8,
            fields,
            "a.html",
            r#"<div><h2>Heading</h2><a href="/more">More</a><img src="/x.png"></div>"#,
        );
        let table = json!({
            "title": {"type": "text", "required": true},
            "link": {"type": "text"},
            "image": {"type": "file"}
        });
        let schema = crate::schema::build_schema(
            "teaser-component",
            table.as_object().unwrap(),
        );

        let content = migrator.extract_content(&result, &schema);
        assert_eq!(content.field_data["title"], "From the classifier");
        assert_eq!(content.field_data["link"], "/more");
        assert_eq!(content.field_data["image"], "/x.png");
    }

    #[test]
    fn test_known_types_are_loaded_from_store() {
        let dir = pages(&["a.html"], TEASER);
        let store = Arc::new(MemoryStore::new());
        store
            .upsert(Collection::ComponentTypes, json!({"type": "hero-banner"}))
            .unwrap();

        let migrator = Migrator::new(MigrationConfig::default(), store);
        migrator.migrate(dir.path()).unwrap();
        assert!(migrator.registry().contains("hero-banner"));
    }

    #[test]
    fn test_failing_llm_degrades() {
        let dir = pages(&["a.html", "b.html"], TEASER);
        let provider = Arc::new(MockProvider::failing("connection refused"));
        let migrator = Migrator::new(MigrationConfig::default(), Arc::new(MemoryStore::new()))
            .with_shared_llm(provider.clone());

        let result = migrator.migrate(dir.path()).unwrap();
        assert_eq!(result.summary.results_accepted, 0);
        assert_eq!(result.summary.schemas_created, 0);
        assert!(provider.calls() > 0);
    }

    #[test]
    fn test_extracted_content_round_trips_to_result() {
        let mut field_data = IndexMap::new();
        field_data.insert("title".to_string(), "Hello".to_string());
        field_data.insert("image".to_string(), String::new());
        let content = ExtractedContent {
            component_type: "card".to_string(),
            source_file: "a.html".to_string(),
            confidence: 0.7,
            field_data,
            created_at: Utc::now(),
        };

        let result = content.to_result();
        assert_eq!(result.content_type, "card");
        assert_eq!(result.fields.len(), 1);
        assert!(content.to_document().unwrap().get("created_at").is_some());
    }
}
