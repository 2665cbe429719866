use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{ObjectStore, StoreConfig, StoreError};

/// Filesystem-backed object store. Keys map to paths under
/// `{base_dir}/uploads/`.
pub struct LocalStore {
    base_dir: PathBuf,
}

impl LocalStore {
    pub fn new(config: &StoreConfig) -> Self {
        let base_dir = config
            .data_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir)
            .join("uploads");
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a key to a path under the base directory, rejecting keys
    /// that would escape it.
    fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.base_dir.join(relative))
    }
}

fn default_data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("taskboard")
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Internal(format!("mkdir: {e}")))?;
        }
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| StoreError::Internal(format!("write {}: {e}", path.display())))
    }

    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(StoreError::Internal(format!(
                "read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Internal(format!(
                "delete {}: {e}",
                path.display()
            ))),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.resolve(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StoreError::Internal(format!("exists {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(dir: &Path) -> LocalStore {
        LocalStore::new(&StoreConfig {
            data_dir: Some(dir.to_string_lossy().to_string()),
        })
    }

    #[tokio::test]
    async fn put_then_get_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        store
            .put("projects/abc/logo.png", Bytes::from_static(b"png bytes"))
            .await
            .unwrap();
        let data = store.get("projects/abc/logo.png").await.unwrap();
        assert_eq!(data.as_ref(), b"png bytes");
    }

    #[tokio::test]
    async fn get_missing_returns_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        let err = store.get("projects/nope/logo.png").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn put_overwrites_existing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        store.put("k/v", Bytes::from_static(b"first")).await.unwrap();
        store.put("k/v", Bytes::from_static(b"second")).await.unwrap();
        assert_eq!(store.get("k/v").await.unwrap().as_ref(), b"second");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        store.put("k/v", Bytes::from_static(b"data")).await.unwrap();
        store.delete("k/v").await.unwrap();
        assert!(!store.exists("k/v").await.unwrap());
        // Second delete of the same key must not error.
        store.delete("k/v").await.unwrap();
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        for key in ["../outside", "a/../../b", "/etc/passwd", ""] {
            let err = store.get(key).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidKey(_)), "key={key:?}");
        }
    }

    #[tokio::test]
    async fn keys_live_under_the_uploads_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        store.put("projects/x/a.png", Bytes::from_static(b"x")).await.unwrap();
        assert!(tmp.path().join("uploads/projects/x/a.png").is_file());
    }
}
