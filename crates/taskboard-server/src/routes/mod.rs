mod forms;
pub mod health;
mod listing;
pub mod projects;
pub mod storage;
pub mod tasks;
pub mod users;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::{Json, Router};
use serde_json::{json, Value};
use taskboard_service::{LocalService, ServiceError};
use taskboard_store::ObjectStore;
use tower_http::cors::CorsLayer;

pub struct InnerAppState {
    pub service: LocalService,
    pub store: Arc<dyn ObjectStore>,
}

pub type AppState = Arc<InnerAppState>;

pub fn build_router(service: LocalService, store: Arc<dyn ObjectStore>) -> Router {
    let state: AppState = Arc::new(InnerAppState { service, store });

    Router::new()
        .merge(health::routes())
        .merge(projects::routes())
        .merge(tasks::routes())
        .merge(users::routes())
        .merge(storage::routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Map service failures to the response contract: validation problems
/// carry the per-field map, everything else a single error message.
pub(crate) fn to_error(e: ServiceError) -> (StatusCode, Json<Value>) {
    match e {
        ServiceError::NotFound(msg) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("not found: {msg}") })),
        ),
        ServiceError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": errors.fields })),
        ),
        ServiceError::Internal(msg) => {
            tracing::error!(error = %msg, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
        }
    }
}
