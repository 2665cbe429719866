mod local;

pub use local::LocalStore;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("store error: {0}")]
    Internal(String),
}

/// A store for opaque blobs keyed by slash-separated string paths.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write (create or overwrite) an object.
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError>;

    /// Read an object. Returns `StoreError::NotFound` if absent.
    async fn get(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Delete an object. No-op if absent; deletion is idempotent.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self.get(key).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

// -- Key and URL helpers --

/// Shown by the presentation layer when an entity carries no attachment.
pub const PLACEHOLDER_IMAGE_URL: &str = "/images/default-project-image.png";

/// Build a fresh attachment key: an entity-scoped prefix, an unpredictable
/// token so a replacement can never collide with a previous entity's path,
/// and the original filename for download ergonomics.
pub fn attachment_key(prefix: &str, filename: &str) -> String {
    let token = uuid::Uuid::new_v4();
    format!("{prefix}/{token}/{}", sanitize_filename(filename))
}

/// Pure, deterministic mapping from a storage key to the reference handed
/// to the presentation layer. No I/O; recomputation is idempotent.
pub fn public_url(storage_path: Option<&str>) -> String {
    match storage_path {
        Some(key) if !key.is_empty() => format!("/storage/{key}"),
        _ => PLACEHOLDER_IMAGE_URL.to_string(),
    }
}

/// Keep only the final path component and replace characters that would
/// break a key or a Content-Disposition header.
fn sanitize_filename(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_control() || c == '"' { '_' } else { c })
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "upload".to_string()
    } else {
        cleaned
    }
}

// -- Configuration --

/// Filesystem store configuration. The base directory defaults to an
/// XDG-style data dir when unset.
pub struct StoreConfig {
    pub data_dir: Option<String>,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("TASKBOARD_DATA_DIR").ok(),
        }
    }
}

pub fn create_store(config: &StoreConfig) -> Arc<dyn ObjectStore> {
    Arc::new(LocalStore::new(config))
}
