use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::{FilterField, FilterKind, ListConfig};

pub const USER_LIST: ListConfig = ListConfig {
    default_sort: "created_at",
    per_page: 10,
    sortable: &["id", "name", "email", "created_at"],
    filters: &[
        FilterField { name: "name", kind: FilterKind::Substring },
        FilterField { name: "email", kind: FilterKind::Substring },
    ],
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
}
