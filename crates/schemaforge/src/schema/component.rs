//! Component schemas and their CMS import format.

use serde::{Deserialize, Serialize};

use super::field::{title_case, FieldType, SchemaField};

/// Schema for one content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSchema {
    /// Content type this schema describes.
    pub content_type: String,
    /// Human-readable title.
    pub title: String,
    /// Fields in display order. Names are unique.
    pub fields: Vec<SchemaField>,
    /// Short description.
    pub description: String,
}

impl ComponentSchema {
    /// Create a schema with a derived title and description.
    pub fn new(content_type: impl Into<String>, fields: Vec<SchemaField>) -> Self {
        let content_type = content_type.into();
        Self {
            title: format!("{} Content", title_case(&content_type)),
            description: format!("Schema for {} content", content_type),
            content_type,
            fields,
        }
    }

    /// CMS identifier, `<content_type>_component`.
    pub fn uid(&self) -> String {
        format!("{}_component", self.content_type)
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Convert to the CMS import shape.
    pub fn to_cms_format(&self) -> CmsComponent {
        CmsComponent {
            title: self.title.clone(),
            uid: self.uid(),
            schema: self.fields.iter().map(CmsField::from).collect(),
            options: CmsOptions {
                singleton: false,
                is_page: false,
                title: self
                    .fields
                    .first()
                    .map(|f| f.name.clone())
                    .unwrap_or_else(|| "title".to_string()),
            },
            description: self.description.clone(),
        }
    }
}

/// A component definition as the CMS imports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmsComponent {
    pub title: String,
    pub uid: String,
    pub schema: Vec<CmsField>,
    pub options: CmsOptions,
    pub description: String,
}

/// One field in CMS format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmsField {
    pub uid: String,
    pub data_type: FieldType,
    pub display_name: String,
    pub mandatory: bool,
    pub field_metadata: CmsFieldMetadata,
}

impl From<&SchemaField> for CmsField {
    fn from(field: &SchemaField) -> Self {
        let enum_options = field.options.as_ref().map(|options| {
            options
                .iter()
                .map(|option| CmsEnumOption {
                    label: title_case(option),
                    value: option.to_lowercase(),
                })
                .collect()
        });

        Self {
            uid: field.name.clone(),
            data_type: field.field_type,
            display_name: field.display_name.clone(),
            mandatory: field.required,
            field_metadata: CmsFieldMetadata {
                multiline: field.multiline.then_some(true),
                allow_upload: (field.field_type == FieldType::File).then_some(true),
                enum_options,
            },
        }
    }
}

/// Field metadata. Only flags that apply are serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CmsFieldMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_upload: Option<bool>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_options: Option<Vec<CmsEnumOption>>,
}

/// A dropdown choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmsEnumOption {
    pub label: String,
    pub value: String,
}

/// Component-level options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmsOptions {
    pub singleton: bool,
    pub is_page: bool,
    /// Field used as the entry title.
    pub title: String,
}
