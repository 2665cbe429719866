use std::sync::Arc;

use bytes::Bytes;

use taskboard_store::{attachment_key, ObjectStore};

use crate::ServiceError;

/// A file received with a mutation request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

/// What an update request says about the entity's attachment. Omitting a
/// file keeps the existing one; removal is a distinct, explicit signal.
#[derive(Debug, Clone, Copy, Default)]
pub enum ImageChange<'a> {
    #[default]
    Keep,
    Remove,
    Upload(&'a UploadedFile),
}

/// Owns the attachment lifecycle for one entity kind, scoped under a path
/// prefix over a shared blob store. Any entity type needing an uploaded
/// image consumes one of these rather than hand-rolling path construction.
pub struct AttachmentManager {
    store: Arc<dyn ObjectStore>,
    prefix: &'static str,
}

impl AttachmentManager {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: &'static str) -> Self {
        Self { store, prefix }
    }

    /// Persist the blob under a fresh collision-resistant key and return
    /// the key. A write failure propagates so the owning mutation fails
    /// before any record points at an unwritten blob.
    pub async fn assign(&self, file: &UploadedFile) -> Result<String, ServiceError> {
        let key = attachment_key(self.prefix, &file.filename);
        self.store
            .put(&key, file.bytes.clone())
            .await
            .map_err(|e| ServiceError::Internal(format!("attachment write: {e}")))?;
        Ok(key)
    }

    /// Best-effort, idempotent delete. Failures are logged and swallowed:
    /// an orphaned blob must never fail the owning entity mutation.
    pub async fn remove(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            tracing::warn!(key, error = %e, "attachment delete failed, blob orphaned");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use taskboard_store::{public_url, LocalStore, StoreConfig, PLACEHOLDER_IMAGE_URL};

    fn manager(dir: &std::path::Path) -> AttachmentManager {
        let store = Arc::new(LocalStore::new(&StoreConfig {
            data_dir: Some(dir.to_string_lossy().to_string()),
        }));
        AttachmentManager::new(store, "projects")
    }

    fn png() -> UploadedFile {
        UploadedFile {
            filename: "logo.png".into(),
            bytes: Bytes::from_static(b"png bytes"),
        }
    }

    #[tokio::test]
    async fn assign_then_resolve_yields_a_public_reference() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = manager(tmp.path());

        let key = mgr.assign(&png()).await.unwrap();
        assert!(key.starts_with("projects/"));
        let url = public_url(Some(&key));
        assert!(url.starts_with("/storage/projects/"));
        assert!(!url.is_empty());
    }

    #[tokio::test]
    async fn assign_twice_never_reuses_a_path() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = manager(tmp.path());

        let first = mgr.assign(&png()).await.unwrap();
        let second = mgr.assign(&png()).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn remove_is_idempotent_and_resolve_falls_back_to_placeholder() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = manager(tmp.path());

        let key = mgr.assign(&png()).await.unwrap();
        mgr.remove(&key).await;
        mgr.remove(&key).await; // second removal must not panic or log an error as fatal
        assert_eq!(public_url(None), PLACEHOLDER_IMAGE_URL);
    }
}
