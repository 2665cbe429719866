mod migrations;
pub mod queries;

pub use queries::list::PageResult;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("lock poisoned")]
    LockPoisoned,
}

/// Handle to the SQLite database. Cheap to clone; all access funnels
/// through one mutex-guarded connection.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn open(path: &Path) -> Result<Self, DbError> {
        // WAL keeps readers unblocked during writes; the busy timeout
        // covers the rare same-process lock contention.
        Self::init(
            Connection::open(path)?,
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )
    }

    /// A private in-memory database, used by tests. WAL does not apply.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::init(Connection::open_in_memory()?, "PRAGMA foreign_keys=ON;")
    }

    /// Open (creating if needed) the database in the default data
    /// directory: `$XDG_DATA_HOME/taskboard` or `~/.local/share/taskboard`.
    pub fn open_default() -> Result<Self, DbError> {
        let dir = default_data_dir();
        std::fs::create_dir_all(&dir)?;
        Self::open(&dir.join("taskboard.db"))
    }

    fn init(conn: Connection, pragmas: &str) -> Result<Self, DbError> {
        conn.execute_batch(pragmas)?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError>,
    {
        let conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        f(&conn)
    }
}

fn default_data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("taskboard")
}
