//! In-process document store.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

use crate::error::Result;

use super::{insert_into, matching, upsert_into, Collection, DocumentStore};

/// Document store held in memory; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Value>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, collection: Collection, f: impl FnOnce(&[Value]) -> T) -> T {
        let guard = self.collections.read().unwrap_or_else(|e| e.into_inner());
        f(guard.get(&collection).map(Vec::as_slice).unwrap_or_default())
    }

    fn write<T>(&self, collection: Collection, f: impl FnOnce(&mut Vec<Value>) -> T) -> T {
        let mut guard = self.collections.write().unwrap_or_else(|e| e.into_inner());
        f(guard.entry(collection).or_default())
    }
}

impl DocumentStore for MemoryStore {
    fn insert(&self, collection: Collection, document: Value) -> Result<()> {
        self.write(collection, |docs| insert_into(docs, collection, document))
    }

    fn find_all(&self, collection: Collection) -> Result<Vec<Value>> {
        Ok(self.read(collection, <[Value]>::to_vec))
    }

    fn find_by(&self, collection: Collection, field: &str, value: &Value) -> Result<Vec<Value>> {
        Ok(self.read(collection, |docs| matching(docs, field, value)))
    }

    fn upsert(&self, collection: Collection, document: Value) -> Result<()> {
        self.write(collection, |docs| upsert_into(docs, collection, document))
    }

    fn clear(&self, collection: Collection) -> Result<()> {
        self.write(collection, Vec::clear);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_and_find_by() {
        let store = MemoryStore::new();
        store
            .insert(Collection::ExtractedData, json!({"component_type": "card", "n": 1}))
            .unwrap();
        store
            .insert(Collection::ExtractedData, json!({"component_type": "quote", "n": 2}))
            .unwrap();

        assert_eq!(store.count(Collection::ExtractedData).unwrap(), 2);
        let cards = store
            .find_by(Collection::ExtractedData, "component_type", &json!("card"))
            .unwrap();
        assert_eq!(cards, vec![json!({"component_type": "card", "n": 1})]);
        assert!(store.find_all(Collection::PageInfo).unwrap().is_empty());
    }

    #[test]
    fn test_clear() {
        let store = MemoryStore::new();
        store.upsert(Collection::ComponentTypes, json!({"type": "card"})).unwrap();
        store.clear(Collection::ComponentTypes).unwrap();
        assert_eq!(store.count(Collection::ComponentTypes).unwrap(), 0);
    }
}
