use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, Row, ToSql};
use tracing::{debug, info};

use super::Gateway;
use crate::error::StorageError;
use crate::types::{NewTodo, Todo, TodoId, TodoPatch, TodoType};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS todos (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    summary     TEXT,
    description TEXT,
    todo_type   TEXT NOT NULL DEFAULT 'ACTIVE',
    completed   INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
";

const COLUMNS: &str = "id, title, summary, description, todo_type, completed, created_at, updated_at";

/// Relational store backed by a single SQLite connection.
///
/// `AUTOINCREMENT` keeps ids from being reused after delete and makes them
/// follow insertion order, so listing sorts by id rather than by the
/// wall-clock `created_at`. Timestamps are written by this gateway, not by
/// SQLite, so they carry sub-second precision and compare correctly as text.
///
/// rusqlite blocks, so every statement runs on tokio's blocking pool. A
/// store held locked by another writer stalls that call for up to the busy
/// timeout, never the runtime.
#[derive(Debug, Clone)]
pub struct SqliteGateway {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGateway {
    /// Open the store named by a connection string.
    ///
    /// Accepts `sqlite://<path>`, `sqlite:<path>`, `sqlite::memory:` and
    /// `:memory:`. Anything else is a configuration error.
    pub fn connect(url: &str) -> Result<Self, StorageError> {
        let url = url.trim();
        let conn = match url {
            "" => return Err(StorageError::Config("database url is empty".to_string())),
            ":memory:" | "sqlite::memory:" => Connection::open_in_memory()?,
            _ => match url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) {
                Some(path) if !path.is_empty() => open_file(Path::new(path))?,
                _ => {
                    let scheme = url.split(':').next().unwrap_or_default();
                    return Err(StorageError::Config(format!(
                        "unsupported database scheme `{scheme}`"
                    )));
                }
            },
        };
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn blocking<T, F>(&self, op: &'static str, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&conn)
        })
        .await
        .map_err(|e| StorageError::Unavailable(format!("sqlite {op} did not finish: {e}")))?
    }
}

fn open_file(path: &Path) -> Result<Connection, StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            StorageError::Unavailable(format!("cannot create {}: {e}", parent.display()))
        })?;
    }
    let conn = Connection::open(path)?;
    info!(path = %path.display(), "sqlite store opened");
    Ok(conn)
}

fn row_to_todo(row: &Row<'_>) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        summary: row.get(2)?,
        description: row.get(3)?,
        todo_type: row.get(4)?,
        completed: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl ToSql for TodoType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TodoType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl Gateway for SqliteGateway {
    async fn list(&self) -> Result<Vec<Todo>, StorageError> {
        self.blocking("list", |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM todos ORDER BY id DESC"
            ))?;
            let todos = stmt
                .query_map([], row_to_todo)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(todos)
        })
        .await
    }

    async fn insert(&self, fields: NewTodo) -> Result<Todo, StorageError> {
        let todo = self
            .blocking("insert", move |conn| {
                let now: DateTime<Utc> = Utc::now();
                let todo = conn.query_row(
                    &format!(
                        "INSERT INTO todos(title, summary, description, created_at, updated_at) \
                         VALUES (?1, ?2, ?3, ?4, ?4) RETURNING {COLUMNS}"
                    ),
                    params![fields.title, fields.summary, fields.description, now],
                    row_to_todo,
                )?;
                Ok(todo)
            })
            .await?;
        debug!(id = todo.id, "sqlite insert");
        Ok(todo)
    }

    async fn update(&self, id: TodoId, patch: TodoPatch) -> Result<(), StorageError> {
        let changed = self
            .blocking("update", move |conn| {
                let changed = conn.execute(
                    "UPDATE todos SET \
                        title = COALESCE(?1, title), \
                        summary = COALESCE(?2, summary), \
                        description = COALESCE(?3, description), \
                        todo_type = COALESCE(?4, todo_type), \
                        completed = COALESCE(?5, completed), \
                        updated_at = MAX(updated_at, ?6) \
                     WHERE id = ?7",
                    params![
                        patch.title,
                        patch.summary,
                        patch.description,
                        patch.todo_type,
                        patch.completed,
                        Utc::now(),
                        id,
                    ],
                )?;
                Ok(changed)
            })
            .await?;
        debug!(id, changed, "sqlite update");
        Ok(())
    }

    async fn delete(&self, id: TodoId) -> Result<(), StorageError> {
        let changed = self
            .blocking("delete", move |conn| {
                Ok(conn.execute("DELETE FROM todos WHERE id = ?1", params![id])?)
            })
            .await?;
        debug!(id, changed, "sqlite delete");
        Ok(())
    }
}
