use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::query::{FilterField, FilterKind, ListConfig};
use crate::status::Status;

/// List contract for the top-level task index.
pub const TASK_LIST: ListConfig = ListConfig {
    default_sort: "created_at",
    per_page: 10,
    sortable: &["id", "title", "status", "due_date", "created_at"],
    filters: &[
        FilterField { name: "title", kind: FilterKind::Substring },
        FilterField { name: "status", kind: FilterKind::Exact },
    ],
};

/// List contract for tasks nested under a single project. Same fields,
/// smaller page.
pub const PROJECT_TASK_LIST: ListConfig = ListConfig {
    default_sort: "created_at",
    per_page: 5,
    sortable: TASK_LIST.sortable,
    filters: TASK_LIST.filters,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    pub due_date: Option<NaiveDate>,
    /// Weak reference to the assigned user; survives that user's deletion.
    pub assigned_to: Option<String>,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task enriched with the assignee's display name, resolved by lookup.
/// A dangling `assigned_to` simply yields no name.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub assigned_user_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub due_date: Option<Option<NaiveDate>>,
    pub assigned_to: Option<Option<String>>,
}
