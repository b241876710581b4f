//! Parsed HTML documents and their source metadata.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use scraper::Html;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ForgeError, Result};

/// Metadata about a source HTML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file (empty for in-memory documents).
    pub path: PathBuf,
    /// SHA-256 hash of the raw bytes.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// When the document was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    fn new(file: String, path: PathBuf, bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);

        Self {
            file,
            path,
            hash: format!("sha256:{:x}", hasher.finalize()),
            size_bytes: bytes.len() as u64,
            loaded_at: Utc::now(),
        }
    }
}

/// A parsed HTML document. Owns every node that candidate regions point into.
pub struct Document {
    html: Html,
    source: SourceMetadata,
}

impl Document {
    /// Read and parse an HTML file.
    ///
    /// Fails when the file cannot be read or is not valid UTF-8. The HTML
    /// parser itself is lenient and never rejects markup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| ForgeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| ForgeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let text = std::str::from_utf8(&bytes).map_err(|e| {
            ForgeError::Document(format!("'{}' is not valid UTF-8: {}", path.display(), e))
        })?;

        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            html: Html::parse_document(text),
            source: SourceMetadata::new(file_name, path.to_path_buf(), &bytes),
        })
    }

    /// Parse markup that is already in memory.
    pub fn parse(file_name: impl Into<String>, markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
            source: SourceMetadata::new(file_name.into(), PathBuf::new(), markup.as_bytes()),
        }
    }

    /// Parse a markup fragment (e.g. a region captured earlier in a run).
    pub fn fragment(file_name: impl Into<String>, markup: &str) -> Self {
        Self {
            html: Html::parse_fragment(markup),
            source: SourceMetadata::new(file_name.into(), PathBuf::new(), markup.as_bytes()),
        }
    }

    /// The parsed tree.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Source metadata.
    pub fn source(&self) -> &SourceMetadata {
        &self.source
    }

    /// File name of the source.
    pub fn file_name(&self) -> &str {
        &self.source.file
    }
}
