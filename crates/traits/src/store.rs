//! ConfigStore trait for abstracting configuration document access.
//!
//! Schemas, image-size tables and templates live in an external key/blob
//! store that is only ever read or written a whole document at a time. The
//! engine reads each document once per request and never caches it across
//! requests, because concurrent writers may replace a document at any time.

use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// Error type for configuration store operations.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Failed to read document '{key}': {message}")]
    ReadFailed { key: String, message: String },

    #[error("Failed to write document '{key}': {message}")]
    WriteFailed { key: String, message: String },

    #[error("Document '{key}' is not valid JSON: {message}")]
    InvalidJson { key: String, message: String },

    #[error("I/O error: {0}")]
    Io(String),
}

impl StoreError {
    /// The document key the error refers to, when there is one.
    pub fn key(&self) -> Option<&str> {
        match self {
            StoreError::NotFound(key) => Some(key),
            StoreError::ReadFailed { key, .. }
            | StoreError::WriteFailed { key, .. }
            | StoreError::InvalidJson { key, .. } => Some(key),
            StoreError::Io(_) => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

/// Shared document data type (reference-counted bytes).
pub type SharedDocument = Arc<Vec<u8>>;

/// A key/blob store of whole configuration documents.
///
/// # Implementations
///
/// - `InMemoryConfigStore`: pre-populated memory (always available)
/// - `FilesystemConfigStore` in `valuer-resource`: a directory of files
pub trait ConfigStore: Send + Sync + Debug {
    /// Read a whole document by key.
    fn read_document(&self, key: &str) -> Result<SharedDocument, StoreError>;

    /// Replace a whole document. There is no concurrency guard: the last
    /// writer wins.
    fn write_document(&self, key: &str, data: Vec<u8>) -> Result<(), StoreError>;

    /// Check if a document exists.
    fn exists(&self, key: &str) -> bool;

    /// Read a document and decode it as JSON.
    fn read_json(&self, key: &str) -> Result<serde_json::Value, StoreError> {
        let bytes = self.read_document(key)?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::InvalidJson {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// Returns a human-readable name for this store (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// An in-memory configuration store.
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    documents: std::sync::RwLock<std::collections::HashMap<String, SharedDocument>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, replacing any previous content under the same key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteFailed` if the internal lock is poisoned.
    pub fn add(&self, key: impl Into<String>, data: Vec<u8>) -> Result<(), StoreError> {
        let key = key.into();
        let mut documents = self.documents.write().map_err(|_| StoreError::WriteFailed {
            key: key.clone(),
            message: "document store lock poisoned".to_string(),
        })?;
        documents.insert(key, Arc::new(data));
        Ok(())
    }

    /// Add a JSON document.
    pub fn add_json(&self, key: impl Into<String>, value: &serde_json::Value) -> Result<(), StoreError> {
        let key = key.into();
        let data = serde_json::to_vec(value).map_err(|e| StoreError::WriteFailed {
            key: key.clone(),
            message: e.to_string(),
        })?;
        self.add(key, data)
    }

    /// Remove a document from the store.
    ///
    /// Returns `None` if the lock is poisoned or the document doesn't exist.
    pub fn remove(&self, key: &str) -> Option<SharedDocument> {
        self.documents.write().ok()?.remove(key)
    }

    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().map(|d| d.is_empty()).unwrap_or(true)
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn read_document(&self, key: &str) -> Result<SharedDocument, StoreError> {
        let documents = self.documents.read().map_err(|_| StoreError::ReadFailed {
            key: key.to_string(),
            message: "document store lock poisoned".to_string(),
        })?;
        documents
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn write_document(&self, key: &str, data: Vec<u8>) -> Result<(), StoreError> {
        self.add(key, data)
    }

    fn exists(&self, key: &str) -> bool {
        self.documents
            .read()
            .map(|d| d.contains_key(key))
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "InMemoryConfigStore"
    }
}
