//! Directory-backed document store: one pretty JSON array per collection.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;
use tracing::debug;

use crate::error::{ForgeError, Result};

use super::{insert_into, matching, upsert_into, Collection, DocumentStore};

/// Stores each collection as `<dir>/<collection>.json`.
///
/// A collection file is read once and then served from memory. Each write
/// rewrites the whole file through a temporary, so the files are always
/// complete JSON documents; batch with [`DocumentStore::insert_many`].
/// Changes made to the files by other processes after the first read are
/// not seen.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    cache: Mutex<HashMap<Collection, Vec<Value>>>,
}

impl JsonFileStore {
    /// Open a store, creating the directory if needed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use schemaforge::{Collection, DocumentStore, JsonFileStore};
    /// let store = JsonFileStore::open("migration_store").unwrap();
    /// let pages = store.find_all(Collection::PageInfo).unwrap();
    /// println!("{} pages analyzed", pages.len());
    /// ```
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            ForgeError::Store(format!(
                "Failed to create store directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
        if !dir.is_dir() {
            return Err(ForgeError::Store(format!(
                "Store path '{}' is not a directory",
                dir.display()
            )));
        }

        debug!(dir = %dir.display(), "Opened JSON file store");
        Ok(Self {
            dir,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a collection file.
    pub fn collection_path(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!("{}.json", collection.name()))
    }

    fn load(&self, collection: Collection) -> Result<Vec<Value>> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path).map_err(|e| {
            ForgeError::Store(format!("Failed to open '{}': {}", path.display(), e))
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            ForgeError::Store(format!("Failed to parse '{}': {}", path.display(), e))
        })
    }

    fn save(&self, collection: Collection, docs: &[Value]) -> Result<()> {
        let path = self.collection_path(collection);
        let tmp = path.with_extension("json.tmp");

        let file = File::create(&tmp).map_err(|e| {
            ForgeError::Store(format!("Failed to create '{}': {}", tmp.display(), e))
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), docs).map_err(|e| {
            ForgeError::Store(format!("Failed to write '{}': {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            ForgeError::Store(format!("Failed to replace '{}': {}", path.display(), e))
        })
    }

    fn cached<'a>(
        &self,
        cache: &'a mut HashMap<Collection, Vec<Value>>,
        collection: Collection,
    ) -> Result<&'a mut Vec<Value>> {
        if !cache.contains_key(&collection) {
            let docs = self.load(collection)?;
            cache.insert(collection, docs);
        }
        Ok(cache.entry(collection).or_default())
    }

    /// Apply `f` to a working copy; the cache changes only once the file is written.
    fn modify(
        &self,
        collection: Collection,
        f: impl FnOnce(&mut Vec<Value>) -> Result<()>,
    ) -> Result<()> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        let docs = self.cached(&mut cache, collection)?;
        let mut updated = docs.clone();
        f(&mut updated)?;
        self.save(collection, &updated)?;
        *docs = updated;
        Ok(())
    }
}

impl DocumentStore for JsonFileStore {
    fn insert(&self, collection: Collection, document: Value) -> Result<()> {
        self.modify(collection, |docs| insert_into(docs, collection, document))
    }

    fn insert_many(&self, collection: Collection, documents: Vec<Value>) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        self.modify(collection, |docs| {
            documents
                .into_iter()
                .try_for_each(|document| insert_into(docs, collection, document))
        })
    }

    fn find_all(&self, collection: Collection) -> Result<Vec<Value>> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.cached(&mut cache, collection)?.clone())
    }

    fn find_by(&self, collection: Collection, field: &str, value: &Value) -> Result<Vec<Value>> {
        Ok(matching(&self.find_all(collection)?, field, value))
    }

    fn upsert(&self, collection: Collection, document: Value) -> Result<()> {
        self.modify(collection, |docs| upsert_into(docs, collection, document))
    }

    fn clear(&self, collection: Collection) -> Result<()> {
        self.modify(collection, |docs| {
            docs.clear();
            Ok(())
        })
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_persists_across_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let store = JsonFileStore::open(tmp.path()).unwrap();
            store
                .upsert(Collection::ComponentSchemas, json!({"uid": "card_component"}))
                .unwrap();
            store
                .insert(Collection::ExtractedData, json!({"component_type": "card"}))
                .unwrap();
        }

        let store = JsonFileStore::open(tmp.path()).unwrap();
        assert_eq!(store.count(Collection::ComponentSchemas).unwrap(), 1);
        assert_eq!(store.count(Collection::ExtractedData).unwrap(), 1);
        assert!(store.collection_path(Collection::PageInfo).ends_with("page_types.json"));
    }

    #[test]
    fn test_upsert_replaces() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::open(tmp.path().join("nested/store")).unwrap();

        store.upsert(Collection::PageInfo, json!({"page_name": "a.html", "n": 1})).unwrap();
        store.upsert(Collection::PageInfo, json!({"page_name": "a.html", "n": 2})).unwrap();

        let pages = store.find_all(Collection::PageInfo).unwrap();
        assert_eq!(pages, vec![json!({"page_name": "a.html", "n": 2})]);
    }

    #[test]
    fn test_open_fails_on_file_path() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("not_a_dir");
        fs::write(&file, "x").unwrap();

        assert!(matches!(JsonFileStore::open(&file), Err(ForgeError::Store(_))));
    }

    #[test]
    fn test_insert_many_writes_one_batch() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::open(tmp.path()).unwrap();
        let docs: Vec<Value> = (0..50).map(|n| json!({"component_type": "card", "n": n})).collect();

        store.insert_many(Collection::ExtractedData, docs).unwrap();
        store.insert_many(Collection::ExtractedData, Vec::new()).unwrap();

        let reopened = JsonFileStore::open(tmp.path()).unwrap();
        let stored = reopened.find_all(Collection::ExtractedData).unwrap();
        assert_eq!(stored.len(), 50);
        assert_eq!(stored[49]["n"], json!(49));
    }

    #[test]
    fn test_failed_batch_leaves_store_unchanged() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::open(tmp.path()).unwrap();
        store.upsert(Collection::PageInfo, json!({"page_name": "a.html"})).unwrap();

        let batch = vec![json!({"page_name": "b.html"}), json!({"page_name": "a.html"})];
        assert!(store.insert_many(Collection::PageInfo, batch).is_err());

        assert_eq!(store.count(Collection::PageInfo).unwrap(), 1);
        let reopened = JsonFileStore::open(tmp.path()).unwrap();
        assert_eq!(reopened.count(Collection::PageInfo).unwrap(), 1);
    }

    #[test]
    fn test_reads_served_from_cache() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::open(tmp.path()).unwrap();
        store.upsert(Collection::ComponentTypes, json!({"type": "card"})).unwrap();

        fs::remove_file(store.collection_path(Collection::ComponentTypes)).unwrap();
        assert_eq!(store.count(Collection::ComponentTypes).unwrap(), 1);
    }

    #[test]
    fn test_corrupt_collection_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::open(tmp.path()).unwrap();
        fs::write(store.collection_path(Collection::ComponentTypes), "{oops").unwrap();

        assert!(store.find_all(Collection::ComponentTypes).is_err());
        assert!(store.upsert(Collection::ComponentTypes, json!({"type": "x"})).is_err());
    }
}
