use chrono::Utc;
use rusqlite::{params, Row};

use taskboard_core::query::QuerySpec;
use taskboard_core::status::Status;
use taskboard_core::task::{CreateTask, Task, UpdateTask, PROJECT_TASK_LIST, TASK_LIST};

use super::list::{fetch_page, PageResult};
use crate::{Db, DbError};

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let status_str: String = row.get("status")?;
    Ok(Task {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: Status::parse_str(&status_str).unwrap_or(Status::Pending),
        due_date: row.get("due_date")?,
        assigned_to: row.get("assigned_to")?,
        image_path: row.get("image_path")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl Db {
    pub fn create_task(
        &self,
        input: &CreateTask,
        image_path: Option<&str>,
    ) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            let id = uuid::Uuid::new_v4().to_string();
            let now = Utc::now();
            conn.execute(
                "INSERT INTO tasks (
                    id, project_id, title, description, status, due_date,
                    assigned_to, image_path, created_at, updated_at
                 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    id,
                    input.project_id,
                    input.title,
                    input.description,
                    input.status.as_str(),
                    input.due_date,
                    input.assigned_to,
                    image_path,
                    now,
                    now,
                ],
            )?;
            conn.query_row("SELECT * FROM tasks WHERE id = ?", params![id], row_to_task)
                .map_err(DbError::from)
        })
    }

    pub fn get_task(&self, id: &str) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM tasks WHERE id = ?", params![id], row_to_task)
                .map_err(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => {
                        DbError::NotFound(format!("task {id}"))
                    }
                    other => other.into(),
                })
        })
    }

    pub fn list_tasks(&self, spec: &QuerySpec) -> Result<PageResult<Task>, DbError> {
        self.with_conn(|conn| fetch_page(conn, "tasks", None, spec, &TASK_LIST, row_to_task))
    }

    /// The nested task list on a project's detail page: same contract,
    /// scoped to one project, five rows per page.
    pub fn list_project_tasks(
        &self,
        project_id: &str,
        spec: &QuerySpec,
    ) -> Result<PageResult<Task>, DbError> {
        self.with_conn(|conn| {
            fetch_page(
                conn,
                "tasks",
                Some(("project_id = ?", &project_id.to_string())),
                spec,
                &PROJECT_TASK_LIST,
                row_to_task,
            )
        })
    }

    pub fn update_task(&self, id: &str, update: &UpdateTask) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            let mut sets = vec!["updated_at = ?".to_string()];
            let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(now)];

            if let Some(ref title) = update.title {
                sets.push("title = ?".into());
                values.push(Box::new(title.clone()));
            }
            if let Some(ref description) = update.description {
                sets.push("description = ?".into());
                values.push(Box::new(description.clone()));
            }
            if let Some(status) = update.status {
                sets.push("status = ?".into());
                values.push(Box::new(status.as_str().to_string()));
            }
            if let Some(ref due_date) = update.due_date {
                sets.push("due_date = ?".into());
                values.push(Box::new(*due_date));
            }
            if let Some(ref assigned_to) = update.assigned_to {
                sets.push("assigned_to = ?".into());
                values.push(Box::new(assigned_to.clone()));
            }

            values.push(Box::new(id.to_string()));
            let sql = format!("UPDATE tasks SET {} WHERE id = ?", sets.join(", "));
            let params_ref: Vec<&dyn rusqlite::types::ToSql> =
                values.iter().map(|v| v.as_ref()).collect();
            let changed = conn.execute(&sql, params_ref.as_slice())?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("task {id}")));
            }
            conn.query_row("SELECT * FROM tasks WHERE id = ?", params![id], row_to_task)
                .map_err(DbError::from)
        })
    }

    pub fn set_task_image(&self, id: &str, image_path: Option<&str>) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET image_path = ?, updated_at = ? WHERE id = ?",
                params![image_path, Utc::now(), id],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("task {id}")));
            }
            Ok(())
        })
    }

    pub fn delete_task(&self, id: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM tasks WHERE id = ?", params![id])?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("task {id}")));
            }
            Ok(())
        })
    }
}
