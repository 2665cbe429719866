use chrono::Utc;
use rusqlite::{params, Row};

use taskboard_core::project::{CreateProject, Project, UpdateProject, PROJECT_LIST};
use taskboard_core::query::QuerySpec;
use taskboard_core::status::Status;

use super::list::{fetch_page, PageResult};
use crate::{Db, DbError};

fn row_to_project(row: &Row) -> rusqlite::Result<Project> {
    let status_str: String = row.get("status")?;
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        status: Status::parse_str(&status_str).unwrap_or(Status::Pending),
        due_date: row.get("due_date")?,
        image_path: row.get("image_path")?,
        created_by: row.get("created_by")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl Db {
    pub fn create_project(
        &self,
        input: &CreateProject,
        image_path: Option<&str>,
    ) -> Result<Project, DbError> {
        self.with_conn(|conn| {
            let id = uuid::Uuid::new_v4().to_string();
            let now = Utc::now();
            conn.execute(
                "INSERT INTO projects (
                    id, name, description, status, due_date, image_path,
                    created_by, created_at, updated_at
                 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    id,
                    input.name,
                    input.description,
                    input.status.as_str(),
                    input.due_date,
                    image_path,
                    input.created_by,
                    now,
                    now,
                ],
            )?;
            conn.query_row(
                "SELECT * FROM projects WHERE id = ?",
                params![id],
                row_to_project,
            )
            .map_err(DbError::from)
        })
    }

    pub fn get_project(&self, id: &str) -> Result<Project, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM projects WHERE id = ?",
                params![id],
                row_to_project,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    DbError::NotFound(format!("project {id}"))
                }
                other => other.into(),
            })
        })
    }

    pub fn list_projects(&self, spec: &QuerySpec) -> Result<PageResult<Project>, DbError> {
        self.with_conn(|conn| {
            fetch_page(conn, "projects", None, spec, &PROJECT_LIST, row_to_project)
        })
    }

    pub fn update_project(&self, id: &str, update: &UpdateProject) -> Result<Project, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            let mut sets = vec!["updated_at = ?".to_string()];
            let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(now)];

            if let Some(ref name) = update.name {
                sets.push("name = ?".into());
                values.push(Box::new(name.clone()));
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

            values.push(Box::new(id.to_string()));
            let sql = format!("UPDATE projects SET {} WHERE id = ?", sets.join(", "));
            let params_ref: Vec<&dyn rusqlite::types::ToSql> =
                values.iter().map(|v| v.as_ref()).collect();
            let changed = conn.execute(&sql, params_ref.as_slice())?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("project {id}")));
            }
            conn.query_row(
                "SELECT * FROM projects WHERE id = ?",
                params![id],
                row_to_project,
            )
            .map_err(DbError::from)
        })
    }

    /// Point the project record at a new (or no) attachment key.
    pub fn set_project_image(&self, id: &str, image_path: Option<&str>) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE projects SET image_path = ?, updated_at = ? WHERE id = ?",
                params![image_path, Utc::now(), id],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("project {id}")));
            }
            Ok(())
        })
    }

    /// Storage keys that become orphans if this project is deleted: the
    /// project's own image plus every owned task's image.
    pub fn project_image_keys(&self, id: &str) -> Result<Vec<String>, DbError> {
        self.with_conn(|conn| {
            let mut keys = Vec::new();
            let own: Option<Option<String>> = conn
                .query_row(
                    "SELECT image_path FROM projects WHERE id = ?",
                    params![id],
                    |row| row.get(0),
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;
            keys.extend(own.flatten());

            let mut stmt = conn.prepare(
                "SELECT image_path FROM tasks
                 WHERE project_id = ? AND image_path IS NOT NULL",
            )?;
            let task_keys = stmt
                .query_map(params![id], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            keys.extend(task_keys);
            Ok(keys)
        })
    }

    /// Delete the project row. Owned tasks go with it (FK cascade); blob
    /// cleanup is the caller's concern.
    pub fn delete_project(&self, id: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM projects WHERE id = ?", params![id])?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("project {id}")));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn db() -> Db {
        Db::open_in_memory().unwrap()
    }

    fn make(db: &Db, name: &str, status: Status) -> Project {
        db.create_project(
            &CreateProject {
                name: name.into(),
                description: String::new(),
                status,
                due_date: None,
                created_by: None,
            },
            None,
        )
        .unwrap()
    }

    fn spec_with(entries: &[(&str, &str)]) -> QuerySpec {
        let params: HashMap<String, String> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        QuerySpec::decode(&params, &PROJECT_LIST)
    }

    #[test]
    fn pagination_slices_23_rows_into_pages_of_10() {
        let db = db();
        for i in 0..23 {
            make(&db, &format!("Project {i:02}"), Status::Pending);
        }

        let page1 = db.list_projects(&spec_with(&[])).unwrap();
        assert_eq!(page1.rows.len(), 10);
        assert_eq!(page1.total, 23);
        assert_eq!(page1.last_page, 3);

        let page3 = db.list_projects(&spec_with(&[("page", "3")])).unwrap();
        assert_eq!(page3.rows.len(), 3);

        let page4 = db.list_projects(&spec_with(&[("page", "4")])).unwrap();
        assert!(page4.rows.is_empty());
        assert_eq!(page4.current_page, 4);
        assert_eq!(page4.last_page, 3);
    }

    #[test]
    fn maximal_page_number_is_served_empty_not_wrapped() {
        let db = db();
        make(&db, "Only Row", Status::Pending);

        // An i64::MAX page must behave like any other past-the-end page;
        // the offset computation saturates instead of overflowing into a
        // negative value that would silently serve page-1 rows.
        let spec = spec_with(&[("page", &i64::MAX.to_string())]);
        let result = db.list_projects(&spec).unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.current_page, i64::MAX);
        assert_eq!(result.last_page, 1);
    }

    #[test]
    fn filters_combine_with_and_and_match_case_insensitively() {
        let db = db();
        make(&db, "Apollo Lander", Status::Pending);
        make(&db, "apollo ground control", Status::Completed);
        make(&db, "Gemini", Status::Pending);

        let result = db
            .list_projects(&spec_with(&[("name", "APOLLO"), ("status", "pending")]))
            .unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].name, "Apollo Lander");
    }

    #[test]
    fn no_row_is_skipped_or_duplicated_across_pages() {
        let db = db();
        // Identical sortable values force the id tiebreak to matter.
        for _ in 0..12 {
            make(&db, "Same Name", Status::Pending);
        }

        let mut seen = std::collections::HashSet::new();
        for page in 1..=2 {
            let spec = spec_with(&[
                ("sort_field", "name"),
                ("sort_direction", "asc"),
                ("page", &page.to_string()),
            ]);
            for row in db.list_projects(&spec).unwrap().rows {
                assert!(seen.insert(row.id.clone()), "row served twice");
            }
        }
        assert_eq!(seen.len(), 12);
    }

    #[test]
    fn sort_direction_orders_rows() {
        let db = db();
        make(&db, "Alpha", Status::Pending);
        make(&db, "Beta", Status::Pending);

        let asc = db
            .list_projects(&spec_with(&[("sort_field", "name"), ("sort_direction", "asc")]))
            .unwrap();
        assert_eq!(asc.rows[0].name, "Alpha");

        let desc = db
            .list_projects(&spec_with(&[("sort_field", "name"), ("sort_direction", "desc")]))
            .unwrap();
        assert_eq!(desc.rows[0].name, "Beta");
    }

    #[test]
    fn empty_collection_reports_last_page_one() {
        let db = db();
        let result = db.list_projects(&spec_with(&[])).unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.last_page, 1);
    }

    #[test]
    fn update_changes_only_supplied_fields() {
        let db = db();
        let project = make(&db, "Original", Status::Pending);

        let updated = db
            .update_project(
                &project.id,
                &UpdateProject {
                    status: Some(Status::Completed),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Original");
        assert_eq!(updated.status, Status::Completed);
    }

    #[test]
    fn delete_missing_project_is_not_found() {
        let db = db();
        let err = db.delete_project("no-such-id").unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[test]
    fn set_project_image_roundtrips() {
        let db = db();
        let project = make(&db, "P", Status::Pending);
        db.set_project_image(&project.id, Some("projects/t/a.png"))
            .unwrap();
        assert_eq!(
            db.get_project(&project.id).unwrap().image_path.as_deref(),
            Some("projects/t/a.png")
        );
        db.set_project_image(&project.id, None).unwrap();
        assert!(db.get_project(&project.id).unwrap().image_path.is_none());
    }
}
