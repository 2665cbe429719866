use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use taskboard_core::query::QuerySpec;
use taskboard_core::user::{CreateUser, UpdateUser, USER_LIST};
use taskboard_service::AdminService;

use super::listing::list_response;
use super::{to_error, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let spec = QuerySpec::decode(&params, &USER_LIST);
    let page = state.service.list_users(&spec).await.map_err(to_error)?;
    Ok(Json(list_response("/api/users", &spec, &USER_LIST, page)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .service
        .get_user(&id)
        .await
        .map(|u| Json(json!(u)))
        .map_err(to_error)
}

async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    state
        .service
        .create_user(&input)
        .await
        .map(|u| (StatusCode::CREATED, Json(json!(u))))
        .map_err(to_error)
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .service
        .update_user(&id, &input)
        .await
        .map(|u| Json(json!(u)))
        .map_err(to_error)
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    state.service.delete_user(&id).await.map_err(to_error)?;
    Ok(StatusCode::NO_CONTENT)
}
