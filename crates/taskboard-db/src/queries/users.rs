use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use taskboard_core::query::QuerySpec;
use taskboard_core::user::{CreateUser, UpdateUser, User, USER_LIST};

use super::list::{fetch_page, PageResult};
use crate::{Db, DbError};

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl Db {
    pub fn create_user(&self, input: &CreateUser) -> Result<User, DbError> {
        self.with_conn(|conn| {
            let id = uuid::Uuid::new_v4().to_string();
            let now = Utc::now();
            conn.execute(
                "INSERT INTO users (id, name, email, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
                params![id, input.name, input.email, now, now],
            )?;
            conn.query_row("SELECT * FROM users WHERE id = ?", params![id], row_to_user)
                .map_err(DbError::from)
        })
    }

    pub fn get_user(&self, id: &str) -> Result<User, DbError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM users WHERE id = ?", params![id], row_to_user)
                .map_err(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => {
                        DbError::NotFound(format!("user {id}"))
                    }
                    other => other.into(),
                })
        })
    }

    /// Lookup that treats absence as a normal outcome; used to resolve
    /// weak references where a dangling id must not be an error.
    pub fn get_user_opt(&self, id: &str) -> Result<Option<User>, DbError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM users WHERE id = ?", params![id], row_to_user)
                .optional()
                .map_err(DbError::from)
        })
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM users WHERE email = ?",
                params![email],
                row_to_user,
            )
            .optional()
            .map_err(DbError::from)
        })
    }

    pub fn list_users(&self, spec: &QuerySpec) -> Result<PageResult<User>, DbError> {
        self.with_conn(|conn| fetch_page(conn, "users", None, spec, &USER_LIST, row_to_user))
    }

    pub fn update_user(&self, id: &str, update: &UpdateUser) -> Result<User, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            let mut sets = vec!["updated_at = ?".to_string()];
            let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(now)];

            if let Some(ref name) = update.name {
                sets.push("name = ?".into());
                values.push(Box::new(name.clone()));
            }
            if let Some(ref email) = update.email {
                sets.push("email = ?".into());
                values.push(Box::new(email.clone()));
            }

            values.push(Box::new(id.to_string()));
            let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
            let params_ref: Vec<&dyn rusqlite::types::ToSql> =
                values.iter().map(|v| v.as_ref()).collect();
            let changed = conn.execute(&sql, params_ref.as_slice())?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("user {id}")));
            }
            conn.query_row("SELECT * FROM users WHERE id = ?", params![id], row_to_user)
                .map_err(DbError::from)
        })
    }

    pub fn delete_user(&self, id: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM users WHERE id = ?", params![id])?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("user {id}")));
            }
            Ok(())
        })
    }
}
