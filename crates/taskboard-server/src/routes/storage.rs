//! Serves stored blobs back at the URL shape `public_url` generates.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use taskboard_store::StoreError;

use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/storage/{*key}", get(serve_blob))
}

async fn serve_blob(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let bytes = state.store.get(&key).await.map_err(|e| match e {
        StoreError::NotFound(_) | StoreError::InvalidKey(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("no such object: {key}") })),
        ),
        StoreError::Internal(msg) => {
            tracing::error!(key, error = %msg, "blob read failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
        }
    })?;

    Response::builder()
        .header(header::CONTENT_TYPE, content_type_for(&key))
        .body(Body::from(bytes))
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("response build: {e}") })),
            )
        })
}

fn content_type_for(key: &str) -> &'static str {
    let ext = key.rsplit('.').next().unwrap_or("");
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
