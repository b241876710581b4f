//! Run-scoped vocabulary of content types.

use std::sync::RwLock;

use indexmap::IndexSet;
use tracing::info;

/// Types every run starts with.
const SEED_TYPES: &[&str] = &["article", "navigation", "form", "unknown"];

/// Grow-only set of content types seen so far.
///
/// Constructed once per run and shared by reference with everything that
/// builds prompts. Registration is a single check-then-add under a write
/// lock, so concurrent callers never double-register a type.
#[derive(Debug)]
pub struct TypeRegistry {
    types: RwLock<IndexSet<String>>,
}

impl TypeRegistry {
    /// Registry seeded with the base types.
    pub fn new() -> Self {
        Self::with_types(SEED_TYPES.iter().copied())
    }

    /// Registry seeded with the given types.
    pub fn with_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: RwLock::new(types.into_iter().map(Into::into).collect()),
        }
    }

    /// Register a type. Returns `true` if it was not known before.
    pub fn register(&self, content_type: &str) -> bool {
        let content_type = content_type.trim();
        if content_type.is_empty() {
            return false;
        }

        let mut types = self.types.write().unwrap_or_else(|e| e.into_inner());
        let is_new = types.insert(content_type.to_string());
        drop(types);

        if is_new {
            info!(content_type, "New content type discovered");
        }
        is_new
    }

    /// Whether a type is known.
    pub fn contains(&self, content_type: &str) -> bool {
        self.types
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(content_type)
    }

    /// Known types, sorted.
    pub fn snapshot(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .types
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect();
        types.sort();
        types
    }

    /// Number of known types.
    pub fn len(&self) -> usize {
        self.types.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// True when no type is known.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
