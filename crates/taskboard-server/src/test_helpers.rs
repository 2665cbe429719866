//! Helpers for exercising the HTTP layer against real (in-memory) state.

use std::sync::Arc;

use axum::Router;
use taskboard_db::Db;
use taskboard_service::LocalService;
use taskboard_store::{LocalStore, ObjectStore, StoreConfig};

/// Build a test router over in-memory SQLite and a temp-dir blob store.
pub fn test_router() -> Router {
    let db = Db::open_in_memory().unwrap();
    let store: Arc<dyn ObjectStore> = Arc::new(LocalStore::new(&StoreConfig {
        data_dir: Some(
            tempfile::tempdir()
                .unwrap()
                .keep()
                .to_string_lossy()
                .to_string(),
        ),
    }));
    let service = LocalService::new(db, store.clone());
    crate::routes::build_router(service, store)
}

/// Assemble a `multipart/form-data` body from text fields and an optional
/// file part named `image`.
pub fn multipart_body(
    boundary: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
