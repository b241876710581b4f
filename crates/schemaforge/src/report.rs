//! Run artifacts written as JSON files.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{ForgeError, Result};
use crate::migration::{MigrationResult, MigrationSummary, PageInfo};
use crate::patterns::ReusablePattern;
use crate::schema::CmsComponent;

/// Paths of the files written for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// `content_schemas_<ts>.json`: content type to CMS schema.
    pub schemas: PathBuf,
    /// `extracted_content_<ts>.json`: flat list of content records.
    pub content: PathBuf,
    /// `migration_report_<ts>.json`: summary, pages, schemas and patterns.
    pub report: PathBuf,
}

impl ArtifactPaths {
    pub fn all(&self) -> [&Path; 3] {
        [&self.schemas, &self.content, &self.report]
    }
}

/// The combined report document.
#[derive(Debug, Serialize)]
pub struct MigrationReport<'a> {
    pub migration_date: DateTime<Utc>,
    pub summary: &'a MigrationSummary,
    pub page_info: &'a [PageInfo],
    pub schemas: IndexMap<String, CmsComponent>,
    pub reusable_patterns: &'a IndexMap<String, ReusablePattern>,
    pub cms_components: Vec<CmsComponent>,
}

impl<'a> MigrationReport<'a> {
    pub fn new(result: &'a MigrationResult, migration_date: DateTime<Utc>) -> Self {
        Self {
            migration_date,
            summary: &result.summary,
            page_info: &result.page_info,
            schemas: result.cms_schemas(),
            reusable_patterns: &result.patterns,
            cms_components: result.cms_components(),
        }
    }
}

/// Write the three artifacts into `out_dir`, stamped with the current time.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use schemaforge::{report, MemoryStore, MigrationConfig, Migrator};
/// # fn example() -> schemaforge::Result<()> {
/// let migrator = Migrator::new(MigrationConfig::default(), Arc::new(MemoryStore::new()));
/// let result = migrator.migrate("crawled_pages")?;
/// let paths = report::write_artifacts(&result, "migration_output")?;
/// println!("Report: {}", paths.report.display());
/// # Ok(())
/// # }
/// ```
pub fn write_artifacts(result: &MigrationResult, out_dir: impl AsRef<Path>) -> Result<ArtifactPaths> {
    write_artifacts_at(result, out_dir, Utc::now())
}

/// Write the three artifacts with an explicit timestamp.
pub fn write_artifacts_at(
    result: &MigrationResult,
    out_dir: impl AsRef<Path>,
    timestamp: DateTime<Utc>,
) -> Result<ArtifactPaths> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir).map_err(|e| ForgeError::Io {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    let stamp = timestamp.format("%Y%m%d_%H%M%S");
    let paths = ArtifactPaths {
        schemas: out_dir.join(format!("content_schemas_{}.json", stamp)),
        content: out_dir.join(format!("extracted_content_{}.json", stamp)),
        report: out_dir.join(format!("migration_report_{}.json", stamp)),
    };

    write_json(&paths.schemas, &result.cms_schemas())?;
    write_json(&paths.content, &result.extracted)?;
    write_json(&paths.report, &MigrationReport::new(result, timestamp))?;

    Ok(paths)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| ForgeError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ClassificationResult;
    use crate::detection::Fields;
    use crate::patterns::PatternDetector;
    use crate::schema::{ComponentSchema, FieldType, SchemaField};
    use chrono::TimeZone;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn sample_result() -> MigrationResult {
        let results: Vec<ClassificationResult> = ["a.html", "b.html", "c.html"]
            .iter()
            .map(|file| {
                let mut fields = Fields::new();
                fields.insert("title".to_string(), json!("Title"));
                fields.insert("link".to_string(), json!("/x"));
                ClassificationResult::new("teaser-component", 0.9, fields, *file, "<div></div>")
            })
            .collect();

        let schema = ComponentSchema::new(
            "teaser-component",
            vec![
                SchemaField::new("title", FieldType::Text).with_required(true),
                SchemaField::new("link", FieldType::Text),
            ],
        );
        let mut schemas = IndexMap::new();
        schemas.insert("teaser-component".to_string(), schema);

        MigrationResult {
            summary: MigrationSummary {
                pages_analyzed: 3,
                results_accepted: 3,
                schemas_created: 1,
                ..Default::default()
            },
            page_info: Vec::new(),
            schemas,
            extracted: Vec::new(),
            patterns: PatternDetector::new().detect(&results),
            results,
        }
    }

    #[test]
    fn test_writes_three_stamped_files() {
        let tmp = TempDir::new().unwrap();
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();

        let paths = write_artifacts_at(&sample_result(), tmp.path().join("out"), at).unwrap();

        assert!(paths.report.ends_with("migration_report_20260304_050607.json"));
        for path in paths.all() {
            assert!(path.exists(), "{} missing", path.display());
        }
    }

    #[test]
    fn test_report_shape() {
        let tmp = TempDir::new().unwrap();
        let paths = write_artifacts(&sample_result(), tmp.path()).unwrap();

        let report: Value = serde_json::from_str(&fs::read_to_string(&paths.report).unwrap()).unwrap();
        for key in ["migration_date", "summary", "page_info", "schemas", "reusable_patterns", "cms_components"] {
            assert!(report.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(report["summary"]["schemas_created"], 1);
        assert_eq!(report["schemas"]["teaser-component"]["uid"], "teaser-component_component");
        assert_eq!(report["cms_components"].as_array().unwrap().len(), 1);

        let schemas: Value = serde_json::from_str(&fs::read_to_string(&paths.schemas).unwrap()).unwrap();
        assert_eq!(schemas["teaser-component"]["schema"].as_array().unwrap().len(), 2);

        let content: Value = serde_json::from_str(&fs::read_to_string(&paths.content).unwrap()).unwrap();
        assert_eq!(content, json!([]));
    }
}
