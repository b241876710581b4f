//! Schema field definitions.

use serde::{Deserialize, Serialize};

/// Field types the CMS supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Plain or rich text.
    #[default]
    Text,
    /// Uploaded asset (image, document).
    File,
    /// Numeric value.
    Number,
    /// True/false flag.
    Boolean,
    /// Calendar date.
    Date,
}

impl FieldType {
    /// All supported types.
    pub const ALL: [FieldType; 5] = [
        FieldType::Text,
        FieldType::File,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::Date,
    ];

    /// Map a proposed type name to the nearest supported type.
    ///
    /// Unrecognized names become [`FieldType::Text`].
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "file" | "image" | "img" | "media" | "asset" | "photo" | "upload" => FieldType::File,
            "number" | "integer" | "int" | "float" | "decimal" | "numeric" | "price" => {
                FieldType::Number
            }
            "boolean" | "bool" | "checkbox" | "toggle" => FieldType::Boolean,
            "date" | "datetime" | "isodate" | "timestamp" | "time" => FieldType::Date,
            _ => FieldType::Text,
        }
    }

    /// CMS data type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::File => "file",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field of a component schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Identifier, e.g. `headline_text`.
    pub name: String,
    /// Field type.
    pub field_type: FieldType,
    /// Human-readable name, e.g. `Headline Text`.
    pub display_name: String,
    /// Whether a value is mandatory.
    pub required: bool,
    /// Whether a text field spans multiple lines.
    #[serde(default)]
    pub multiline: bool,
    /// Allowed values for a dropdown field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl SchemaField {
    /// Create an optional single-line field; the display name is derived.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            display_name: title_case(&name),
            name,
            field_type,
            required: false,
            multiline: false,
            options: None,
        }
    }

    /// Set the required flag.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the multiline flag.
    pub fn with_multiline(mut self, multiline: bool) -> Self {
        self.multiline = multiline;
        self
    }

    /// Set allowed values. An empty list means no restriction.
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = if options.is_empty() { None } else { Some(options) };
        self
    }
}

/// Title-case an identifier: `headline_text` and `teaser-component` become
/// `Headline Text` and `Teaser Component`.
pub fn title_case(text: &str) -> String {
    text.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_known_and_synonyms() {
        assert_eq!(FieldType::coerce("text"), FieldType::Text);
        assert_eq!(FieldType::coerce("Image"), FieldType::File);
        assert_eq!(FieldType::coerce("integer"), FieldType::Number);
        assert_eq!(FieldType::coerce(" bool "), FieldType::Boolean);
        assert_eq!(FieldType::coerce("datetime"), FieldType::Date);
    }

    #[test]
    fn test_coerce_unknown_defaults_to_text() {
        assert_eq!(FieldType::coerce("rich_text"), FieldType::Text);
        assert_eq!(FieldType::coerce("geo_point"), FieldType::Text);
        assert_eq!(FieldType::coerce(""), FieldType::Text);
    }

    #[test]
    fn test_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&FieldType::Boolean).unwrap(), "\"boolean\"");
        for t in FieldType::ALL {
            assert_eq!(t.to_string(), t.as_str());
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("headline_text"), "Headline Text");
        assert_eq!(title_case("teaser-component"), "Teaser Component");
        assert_eq!(title_case("EXTRA large"), "Extra Large");
        assert_eq!(title_case("__"), "");
    }

    #[test]
    fn test_field_builder() {
        let field = SchemaField::new("prep_time", FieldType::Text)
            .with_required(true)
            .with_options(vec![]);
        assert_eq!(field.display_name, "Prep Time");
        assert!(field.required);
        assert!(field.options.is_none());
    }
}
