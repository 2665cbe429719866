use std::collections::HashMap;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};

use taskboard_core::project::{CreateProject, Project, UpdateProject, PROJECT_LIST};
use taskboard_core::query::QuerySpec;
use taskboard_core::status::Status;
use taskboard_core::task::PROJECT_TASK_LIST;
use taskboard_core::ValidationErrors;
use taskboard_service::{AdminService, ImageChange};
use taskboard_store::public_url;

use super::forms::{read_form, FormPayload};
use super::listing::list_response;
use super::tasks::task_view_json;
use super::{to_error, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/api/projects/{id}/tasks", get(list_project_tasks))
}

/// Entity JSON plus the resolved image URL, so clients never rebuild
/// storage paths themselves.
fn project_json(project: &Project) -> Value {
    let mut value = json!(project);
    value["image_url"] = json!(public_url(project.image_path.as_deref()));
    value
}

async fn list_projects(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let spec = QuerySpec::decode(&params, &PROJECT_LIST);
    let page = state.service.list_projects(&spec).await.map_err(to_error)?;
    let page = page.map(|p| project_json(&p));
    Ok(Json(list_response("/api/projects", &spec, &PROJECT_LIST, page)))
}

async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .service
        .get_project(&id)
        .await
        .map(|p| Json(project_json(&p)))
        .map_err(to_error)
}

async fn create_project(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let payload = read_form(multipart).await?;
    let input = build_create(&payload).map_err(|e| to_error(e.into()))?;
    state
        .service
        .create_project(&input, payload.file.as_ref())
        .await
        .map(|p| (StatusCode::CREATED, Json(project_json(&p))))
        .map_err(to_error)
}

async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let payload = read_form(multipart).await?;
    let update = build_update(&payload).map_err(|e| to_error(e.into()))?;
    let image = image_change(&payload);
    state
        .service
        .update_project(&id, &update, image)
        .await
        .map(|p| Json(project_json(&p)))
        .map_err(to_error)
}

async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    state.service.delete_project(&id).await.map_err(to_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_project_tasks(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let spec = QuerySpec::decode(&params, &PROJECT_TASK_LIST);
    let page = state
        .service
        .list_project_tasks(&id, &spec)
        .await
        .map_err(to_error)?;
    let page = page.map(|t| task_view_json(&t));
    let base = format!("/api/projects/{id}/tasks");
    Ok(Json(list_response(&base, &spec, &PROJECT_TASK_LIST, page)))
}

// -- Input builders --

pub(crate) fn parse_status(
    raw: Option<&str>,
    errors: &mut ValidationErrors,
) -> Option<Status> {
    match raw {
        Some(s) => match Status::parse_str(s) {
            Some(status) => Some(status),
            None => {
                errors.add("status", "must be one of pending, in_progress, completed");
                None
            }
        },
        None => {
            errors.add("status", "is required");
            None
        }
    }
}

pub(crate) fn parse_date(
    raw: &str,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "must be a date in YYYY-MM-DD format");
            None
        }
    }
}

fn build_create(payload: &FormPayload) -> Result<CreateProject, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    // Presence is checked here so a fully-empty form reports every
    // missing field together with the status parse failure. Content
    // rules (length, referenced ids) stay in the service.
    if payload.text("name").map(str::trim).unwrap_or("").is_empty() {
        errors.add("name", "is required");
    }
    let status = parse_status(payload.text("status"), &mut errors);
    let due_date = match payload.text("due_date") {
        Some(raw) if !raw.is_empty() => parse_date(raw, "due_date", &mut errors),
        _ => None,
    };

    errors.into_result(())?;
    Ok(CreateProject {
        name: payload.text("name").unwrap_or_default().to_string(),
        description: payload.text("description").unwrap_or_default().to_string(),
        // into_result returned above if status failed to parse
        status: status.unwrap_or(Status::Pending),
        due_date,
        created_by: payload.text("created_by").map(str::to_string),
    })
}

fn build_update(payload: &FormPayload) -> Result<UpdateProject, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let status = match payload.text("status") {
        Some(raw) => parse_status(Some(raw), &mut errors),
        None => None,
    };
    // An empty due_date field means "clear the date"; an absent field
    // leaves it unchanged.
    let due_date = match payload.text("due_date") {
        Some("") => Some(None),
        Some(raw) => parse_date(raw, "due_date", &mut errors).map(Some),
        None => None,
    };

    errors.into_result(())?;
    Ok(UpdateProject {
        name: payload.text("name").map(str::to_string),
        description: payload.text("description").map(str::to_string),
        status,
        due_date,
    })
}

pub(crate) fn image_change(payload: &FormPayload) -> ImageChange<'_> {
    if payload.remove_image {
        ImageChange::Remove
    } else if let Some(file) = &payload.file {
        ImageChange::Upload(file)
    } else {
        ImageChange::Keep
    }
}
