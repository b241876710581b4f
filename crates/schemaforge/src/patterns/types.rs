//! Reusable pattern types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::{title_case, CmsComponent, ComponentSchema, FieldType, SchemaField};

/// Role-specific metrics for well-known field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldRole {
    /// `links`, `menu_items`, `navigation`.
    Navigation { average_items: f64 },
    /// `title`, `heading`, `name`.
    Heading { is_unique_content: bool },
    /// `description`, `content`, `body`.
    RichText { is_content_heavy: bool },
}

/// How one common field is used across instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPattern {
    pub field_name: String,
    /// Non-empty in at least 80% of instances.
    pub required: bool,
    /// Most frequent kind tag among non-empty values.
    pub data_type: String,
    /// Mean length of the stringified non-empty values.
    pub typical_length: usize,
    /// More than 70% of the non-empty values are distinct.
    pub is_variable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_role: Option<FieldRole>,
}

impl FieldPattern {
    /// Nearest CMS field type for this pattern.
    pub fn cms_type(&self) -> FieldType {
        let name = self.field_name.to_lowercase();
        if ["image", "img", "photo", "logo", "thumbnail", "icon"]
            .iter()
            .any(|hint| name.contains(hint))
        {
            return FieldType::File;
        }
        match self.data_type.as_str() {
            "number" => FieldType::Number,
            "bool" => FieldType::Boolean,
            _ if name.contains("date") => FieldType::Date,
            _ => FieldType::Text,
        }
    }

    fn is_multiline(&self) -> bool {
        matches!(self.component_role, Some(FieldRole::RichText { .. }))
            || self.data_type == "list"
            || self.typical_length > 100
    }
}

/// A sub-group of instances sharing one structural fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub variant_name: String,
    pub instances: usize,
    pub distinguishing_features: Vec<String>,
    /// Up to three source files.
    pub usage_context: Vec<String>,
}

/// Generalized component definition for a content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentTemplate {
    pub component_name: String,
    pub description: String,
    pub fields: IndexMap<String, FieldPattern>,
    pub variants: Vec<Variant>,
}

/// Aggregate view of every instance of one content type in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReusablePattern {
    pub content_type: String,
    pub instances_count: usize,
    /// Fields present in at least 70% of instances, in first-seen order.
    pub common_fields: Vec<String>,
    /// Observed kind tags per field, sorted.
    pub field_variations: IndexMap<String, Vec<String>>,
    pub template: ComponentTemplate,
    /// Composite score in [0, 1].
    pub reusability_score: f64,
    /// Source file of every instance.
    pub usage_contexts: Vec<String>,
}

impl ReusablePattern {
    /// Number of distinct source files.
    pub fn distinct_files(&self) -> usize {
        let mut files: Vec<&str> = self.usage_contexts.iter().map(String::as_str).collect();
        files.sort_unstable();
        files.dedup();
        files.len()
    }

    /// CMS component definition built from the template's common fields.
    pub fn to_cms_component(&self) -> CmsComponent {
        let fields = self
            .template
            .fields
            .values()
            .map(|pattern| {
                SchemaField::new(pattern.field_name.clone(), pattern.cms_type())
                    .with_required(pattern.required)
                    .with_multiline(pattern.cms_type() == FieldType::Text && pattern.is_multiline())
            })
            .collect();

        let schema = ComponentSchema {
            content_type: self.content_type.clone(),
            title: title_case(&self.template.component_name),
            fields,
            description: self.template.description.clone(),
        };

        let mut cms = schema.to_cms_format();
        cms.uid = self.template.component_name.clone();
        cms
    }
}
