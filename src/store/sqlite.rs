use super::connection::{Connector, ManagedConnection};
use super::error::{StoreError, StoreResult};
use super::models::{LinkEntry, Note, NoteDraft, TableSummary, Task, TaskDraft};
use super::{RecordStore, KNOWN_TABLES, LINKS_TABLE, NOTES_TABLE, TASKS_TABLE};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS notes_records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        note_title TEXT NOT NULL,
        note_content TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_notes_records_created_at ON notes_records(created_at DESC);
    CREATE TABLE IF NOT EXISTS kanban_tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'todo',
        priority TEXT NOT NULL DEFAULT 'medium',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_kanban_tasks_created_at ON kanban_tasks(created_at DESC);
    CREATE TABLE IF NOT EXISTS tw_grid_links (
        position INTEGER PRIMARY KEY,
        payload TEXT NOT NULL
    );
"#;

const NOTE_COLUMNS: &str = "id, note_title, note_content, created_at, updated_at";
const TASK_COLUMNS: &str = "id, title, description, status, priority, created_at, updated_at";

/// Where a [`SqliteStore`] keeps its data.
///
/// An in-memory database starts empty again after a reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqliteConnector {
    Memory,
    File(PathBuf),
}

impl Connector for SqliteConnector {
    type Conn = Connection;

    fn connect(&self) -> StoreResult<Connection> {
        let conn = match self {
            SqliteConnector::Memory => Connection::open_in_memory()?,
            SqliteConnector::File(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)?;
                    }
                }
                Connection::open(path)?
            }
        };
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }

    fn describe(&self) -> String {
        match self {
            SqliteConnector::Memory => "sqlite::memory:".to_string(),
            SqliteConnector::File(path) => format!("sqlite:{}", path.display()),
        }
    }
}

/// Relational [`RecordStore`] with one table per record kind.
pub struct SqliteStore {
    conn: ManagedConnection<SqliteConnector>,
}

impl SqliteStore {
    pub fn new(connector: SqliteConnector) -> Self {
        Self {
            conn: ManagedConnection::new(connector),
        }
    }

    fn notes(&self, limit: Option<usize>) -> StoreResult<Vec<Note>> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes_records ORDER BY created_at DESC, id DESC LIMIT ?1"
        );
        self.conn.run(|c| {
            let mut stmt = c.prepare_cached(&sql)?;
            let rows = stmt.query_map([sql_limit(limit)], note_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    fn tasks(&self, limit: Option<usize>) -> StoreResult<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM kanban_tasks ORDER BY created_at DESC, id DESC LIMIT ?1"
        );
        self.conn.run(|c| {
            let mut stmt = c.prepare_cached(&sql)?;
            let rows = stmt.query_map([sql_limit(limit)], task_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    fn link_payloads(&self, limit: Option<usize>) -> StoreResult<Vec<String>> {
        self.conn.run(|c| {
            let mut stmt =
                c.prepare_cached("SELECT payload FROM tw_grid_links ORDER BY position LIMIT ?1")?;
            let rows = stmt.query_map([sql_limit(limit)], |row| row.get::<_, String>(0))?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }
}

/// `LIMIT -1` means no limit in SQLite.
fn sql_limit(limit: Option<usize>) -> i64 {
    limit
        .and_then(|n| i64::try_from(n).ok())
        .unwrap_or(-1)
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        note_title: row.get(1)?,
        note_content: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        priority: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl RecordStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn list_notes(&self) -> StoreResult<Vec<Note>> {
        self.notes(None)
    }

    fn create_note(&self, draft: &NoteDraft) -> StoreResult<Note> {
        let sql = format!(
            "INSERT INTO notes_records (note_title, note_content, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?3) RETURNING {NOTE_COLUMNS}"
        );
        self.conn.run(|c| {
            Ok(c.query_row(
                &sql,
                params![draft.title, draft.content, Utc::now()],
                note_from_row,
            )?)
        })
    }

    fn update_note(&self, id: i64, draft: &NoteDraft) -> StoreResult<Option<Note>> {
        let sql = format!(
            "UPDATE notes_records SET note_title = ?1, note_content = ?2, updated_at = ?3 \
             WHERE id = ?4 RETURNING {NOTE_COLUMNS}"
        );
        self.conn.run(|c| {
            Ok(c.query_row(
                &sql,
                params![draft.title, draft.content, Utc::now(), id],
                note_from_row,
            )
            .optional()?)
        })
    }

    fn delete_note(&self, id: i64) -> StoreResult<bool> {
        self.conn.run(|c| {
            let n = c.execute("DELETE FROM notes_records WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        self.tasks(None)
    }

    fn create_task(&self, draft: &TaskDraft) -> StoreResult<Task> {
        let sql = format!(
            "INSERT INTO kanban_tasks (title, description, status, priority, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5) RETURNING {TASK_COLUMNS}"
        );
        self.conn.run(|c| {
            Ok(c.query_row(
                &sql,
                params![
                    draft.title,
                    draft.description,
                    draft.status,
                    draft.priority,
                    Utc::now()
                ],
                task_from_row,
            )?)
        })
    }

    fn update_task(&self, id: i64, draft: &TaskDraft) -> StoreResult<Option<Task>> {
        let sql = format!(
            "UPDATE kanban_tasks SET title = ?1, description = ?2, status = ?3, priority = ?4, \
             updated_at = ?5 WHERE id = ?6 RETURNING {TASK_COLUMNS}"
        );
        self.conn.run(|c| {
            Ok(c.query_row(
                &sql,
                params![
                    draft.title,
                    draft.description,
                    draft.status,
                    draft.priority,
                    Utc::now(),
                    id
                ],
                task_from_row,
            )
            .optional()?)
        })
    }

    fn delete_task(&self, id: i64) -> StoreResult<bool> {
        self.conn.run(|c| {
            let n = c.execute("DELETE FROM kanban_tasks WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    fn links(&self) -> StoreResult<Vec<LinkEntry>> {
        self.link_payloads(None)?
            .iter()
            .map(|p| serde_json::from_str(p).map_err(StoreError::from))
            .collect()
    }

    fn replace_links(&self, links: &[LinkEntry]) -> StoreResult<()> {
        let payloads = links
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        self.conn.run(|c| {
            let tx = c.transaction()?;
            tx.execute("DELETE FROM tw_grid_links", [])?;
            {
                let mut stmt =
                    tx.prepare("INSERT INTO tw_grid_links (position, payload) VALUES (?1, ?2)")?;
                for (position, payload) in payloads.iter().enumerate() {
                    let position = i64::try_from(position)
                        .map_err(|e| StoreError::Query(e.to_string()))?;
                    stmt.execute(params![position, payload])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    fn table_summaries(&self) -> StoreResult<Vec<TableSummary>> {
        self.conn.run(|c| {
            KNOWN_TABLES
                .iter()
                .map(|table| -> StoreResult<TableSummary> {
                    let count: i64 =
                        c.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
                    Ok(TableSummary {
                        table_name: (*table).to_string(),
                        row_count: usize::try_from(count).unwrap_or(0),
                    })
                })
                .collect()
        })
    }

    fn table_rows(&self, table: &str, limit: usize) -> StoreResult<Vec<Value>> {
        let limit = Some(limit);
        match table {
            NOTES_TABLE => self
                .notes(limit)?
                .iter()
                .map(|n| serde_json::to_value(n).map_err(StoreError::from))
                .collect(),
            TASKS_TABLE => self
                .tasks(limit)?
                .iter()
                .map(|t| serde_json::to_value(t).map_err(StoreError::from))
                .collect(),
            LINKS_TABLE => self
                .link_payloads(limit)?
                .iter()
                .map(|p| serde_json::from_str(p).map_err(StoreError::from))
                .collect(),
            _ => Ok(Vec::new()),
        }
    }
}
