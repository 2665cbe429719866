use std::collections::HashMap;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use taskboard_core::query::QuerySpec;
use taskboard_core::task::{CreateTask, TaskView, UpdateTask, TASK_LIST};
use taskboard_core::ValidationErrors;
use taskboard_service::AdminService;
use taskboard_store::public_url;

use super::forms::{read_form, FormPayload};
use super::listing::list_response;
use super::projects::{image_change, parse_date, parse_status};
use super::{to_error, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
}

pub(crate) fn task_view_json(view: &TaskView) -> Value {
    let mut value = json!(view);
    value["image_url"] = json!(public_url(view.task.image_path.as_deref()));
    value
}

async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let spec = QuerySpec::decode(&params, &TASK_LIST);
    let page = state.service.list_tasks(&spec).await.map_err(to_error)?;
    let page = page.map(|t| task_view_json(&t));
    Ok(Json(list_response("/api/tasks", &spec, &TASK_LIST, page)))
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .service
        .get_task(&id)
        .await
        .map(|t| Json(task_view_json(&t)))
        .map_err(to_error)
}

async fn create_task(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let payload = read_form(multipart).await?;
    let input = build_create(&payload).map_err(|e| to_error(e.into()))?;
    let task = state
        .service
        .create_task(&input, payload.file.as_ref())
        .await
        .map_err(to_error)?;
    // Re-read through the view so the response carries the assignee name.
    state
        .service
        .get_task(&task.id)
        .await
        .map(|t| (StatusCode::CREATED, Json(task_view_json(&t))))
        .map_err(to_error)
}

async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let payload = read_form(multipart).await?;
    let update = build_update(&payload).map_err(|e| to_error(e.into()))?;
    let image = image_change(&payload);
    state
        .service
        .update_task(&id, &update, image)
        .await
        .map_err(to_error)?;
    state
        .service
        .get_task(&id)
        .await
        .map(|t| Json(task_view_json(&t)))
        .map_err(to_error)
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    state.service.delete_task(&id).await.map_err(to_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Input builders --

fn build_create(payload: &FormPayload) -> Result<CreateTask, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if payload.text("title").map(str::trim).unwrap_or("").is_empty() {
        errors.add("title", "is required");
    }
    let status = parse_status(payload.text("status"), &mut errors);
    let due_date = match payload.text("due_date") {
        Some(raw) if !raw.is_empty() => parse_date(raw, "due_date", &mut errors),
        _ => None,
    };
    let project_id = match payload.text("project_id") {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            errors.add("project_id", "is required");
            String::new()
        }
    };

    errors.into_result(())?;
    Ok(CreateTask {
        project_id,
        title: payload.text("title").unwrap_or_default().to_string(),
        description: payload.text("description").unwrap_or_default().to_string(),
        status: status.unwrap_or(taskboard_core::Status::Pending),
        due_date,
        assigned_to: payload
            .text("assigned_to")
            .filter(|v| !v.is_empty())
            .map(str::to_string),
    })
}

fn build_update(payload: &FormPayload) -> Result<UpdateTask, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let status = match payload.text("status") {
        Some(raw) => parse_status(Some(raw), &mut errors),
        None => None,
    };
    let due_date = match payload.text("due_date") {
        Some("") => Some(None),
        Some(raw) => parse_date(raw, "due_date", &mut errors).map(Some),
        None => None,
    };
    // Same convention for the assignee: empty string unassigns, absence
    // leaves the assignment alone.
    let assigned_to = match payload.text("assigned_to") {
        Some("") => Some(None),
        Some(id) => Some(Some(id.to_string())),
        None => None,
    };

    errors.into_result(())?;
    Ok(UpdateTask {
        title: payload.text("title").map(str::to_string),
        description: payload.text("description").map(str::to_string),
        status,
        due_date,
        assigned_to,
    })
}
