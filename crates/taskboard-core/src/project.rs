use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::query::{FilterField, FilterKind, ListConfig};
use crate::status::Status;

/// List contract for the top-level project index.
pub const PROJECT_LIST: ListConfig = ListConfig {
    default_sort: "created_at",
    per_page: 10,
    sortable: &["id", "name", "status", "due_date", "created_at"],
    filters: &[
        FilterField { name: "name", kind: FilterKind::Substring },
        FilterField { name: "status", kind: FilterKind::Exact },
    ],
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    pub due_date: Option<NaiveDate>,
    /// Storage key of the uploaded project image, if any.
    pub image_path: Option<String>,
    /// Weak reference to the creating user; survives that user's deletion.
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    /// `Some(None)` clears the due date; outer `None` leaves it unchanged.
    pub due_date: Option<Option<NaiveDate>>,
}
