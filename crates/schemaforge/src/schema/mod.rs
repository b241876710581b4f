//! Typed, CMS-ready component schemas.

mod component;
mod field;
mod synthesizer;
mod validation;

pub use component::{CmsComponent, CmsEnumOption, CmsField, CmsFieldMetadata, CmsOptions, ComponentSchema};
pub use field::{title_case, FieldType, SchemaField};
pub use synthesizer::{build_schema, infer_field_table, SchemaSynthesizer, SynthesizerConfig};
pub use validation::{
    is_valid, normalize_field_name, validate, SchemaViolation, MAX_FIELD_NAME_LEN,
};
