//! Document persistence.
//!
//! Four named collections of JSON documents. Three of them have a unique key
//! used for upserts; `extracted_data` is append-only. Any store error is
//! fatal to a migration run.

mod json_file;
mod memory;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ForgeError, Result};

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// A named document collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// CMS-format schemas, unique by `uid`.
    ComponentSchemas,
    /// Extracted content records.
    ExtractedData,
    /// Component-type registry, unique by `type`.
    ComponentTypes,
    /// Per-page analysis info, unique by `page_name`.
    PageInfo,
}

impl Collection {
    /// All collections.
    pub const ALL: [Collection; 4] = [
        Collection::ComponentSchemas,
        Collection::ExtractedData,
        Collection::ComponentTypes,
        Collection::PageInfo,
    ];

    /// Storage name.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::ComponentSchemas => "component_schemas",
            Collection::ExtractedData => "extracted_data",
            Collection::ComponentTypes => "component_types",
            Collection::PageInfo => "page_types",
        }
    }

    /// Field that identifies a document, if the collection has one.
    pub fn unique_key(&self) -> Option<&'static str> {
        match self {
            Collection::ComponentSchemas => Some("uid"),
            Collection::ExtractedData => None,
            Collection::ComponentTypes => Some("type"),
            Collection::PageInfo => Some("page_name"),
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Document-oriented persistence.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait DocumentStore: Send + Sync {
    /// Append a document. Fails if it duplicates a unique key.
    fn insert(&self, collection: Collection, document: Value) -> Result<()>;

    /// Every document in insertion order.
    fn find_all(&self, collection: Collection) -> Result<Vec<Value>>;

    /// Documents whose `field` equals `value`.
    fn find_by(&self, collection: Collection, field: &str, value: &Value) -> Result<Vec<Value>>;

    /// Append several documents, stopping at the first failure.
    fn insert_many(&self, collection: Collection, documents: Vec<Value>) -> Result<()> {
        for document in documents {
            self.insert(collection, document)?;
        }
        Ok(())
    }

    /// Insert or replace by the collection's unique key.
    fn upsert(&self, collection: Collection, document: Value) -> Result<()>;

    /// Remove every document.
    fn clear(&self, collection: Collection) -> Result<()>;

    /// Number of documents.
    fn count(&self, collection: Collection) -> Result<usize> {
        Ok(self.find_all(collection)?.len())
    }

    /// Name of this store (for logging).
    fn name(&self) -> &str;
}

/// Key value of a document, required to be present for keyed collections.
fn key_of<'a>(collection: Collection, document: &'a Value) -> Result<Option<&'a Value>> {
    if !document.is_object() {
        return Err(ForgeError::Store(format!(
            "documents in '{}' must be JSON objects",
            collection
        )));
    }
    match collection.unique_key() {
        None => Ok(None),
        Some(key) => document.get(key).filter(|v| !v.is_null()).map(Some).ok_or_else(|| {
            ForgeError::Store(format!("document in '{}' is missing key '{}'", collection, key))
        }),
    }
}

/// Apply an insert to an in-memory document list.
fn insert_into(docs: &mut Vec<Value>, collection: Collection, document: Value) -> Result<()> {
    if let (Some(key), Some(value)) = (collection.unique_key(), key_of(collection, &document)?) {
        if docs.iter().any(|d| d.get(key) == Some(value)) {
            return Err(ForgeError::Store(format!(
                "duplicate {} '{}' in '{}'",
                key, value, collection
            )));
        }
    }
    docs.push(document);
    Ok(())
}

/// Apply an upsert to an in-memory document list.
fn upsert_into(docs: &mut Vec<Value>, collection: Collection, document: Value) -> Result<()> {
    let Some(key) = collection.unique_key() else {
        return Err(ForgeError::Store(format!(
            "'{}' has no unique key to upsert by",
            collection
        )));
    };
    let Some(value) = key_of(collection, &document)? else {
        return Ok(());
    };

    match docs.iter().position(|d| d.get(key) == Some(value)) {
        Some(index) => docs[index] = document,
        None => docs.push(document),
    }
    Ok(())
}

fn matching(docs: &[Value], field: &str, value: &Value) -> Vec<Value> {
    docs.iter()
        .filter(|d| d.get(field) == Some(value))
        .cloned()
        .collect()
}
