//! # Record Store
//!
//! Persistence for the hub's built-in apps: notes, kanban tasks and the
//! link grid. Handlers only see the [`RecordStore`] trait; the backend is
//! picked from a database URL by [`open_store`].
//!
//! | URL                                  | Backend                     |
//! |--------------------------------------|-----------------------------|
//! | `memory:`                            | [`KvStore`] over [`MemoryKv`] |
//! | `kv:PATH`, `*.json`                  | [`KvStore`] over [`FileKv`]   |
//! | `sqlite::memory:`, `sqlite:PATH`, `*.db` | [`SqliteStore`]         |
//!
//! Every backend goes through a [`ManagedConnection`], which reconnects and
//! retries an operation once when the connection drops.

mod connection;
mod error;
mod kv;
mod models;
mod sqlite;

use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

pub use connection::{Connector, ConnectionState, ManagedConnection, DEFAULT_MAX_RETRIES};
pub use error::{StoreError, StoreResult};
pub use kv::{FileKv, KvBackend, KvConnection, KvStore, MemoryKv};
pub use models::{
    LinkEntry, Note, NoteDraft, TableSummary, Task, TaskDraft, DEFAULT_TASK_PRIORITY,
    DEFAULT_TASK_STATUS,
};
pub use sqlite::{SqliteConnector, SqliteStore};

pub const NOTES_TABLE: &str = "notes_records";
pub const TASKS_TABLE: &str = "kanban_tasks";
pub const LINKS_TABLE: &str = "tw_grid_links";

/// Tables the database viewer knows about, in display order.
pub const KNOWN_TABLES: [&str; 3] = [NOTES_TABLE, TASKS_TABLE, LINKS_TABLE];

/// Upper bound on rows returned by [`RecordStore::table_rows`].
pub const MAX_TABLE_ROWS: usize = 100;

/// CRUD over the hub's record kinds.
///
/// `update_*` returns `Ok(None)` and `delete_*` returns `Ok(false)` when the
/// id does not exist. `Err` is reserved for storage failures.
pub trait RecordStore: Send + Sync {
    /// Short backend label for logs and `/health`.
    fn backend_name(&self) -> &'static str;

    fn list_notes(&self) -> StoreResult<Vec<Note>>;
    fn create_note(&self, draft: &NoteDraft) -> StoreResult<Note>;
    fn update_note(&self, id: i64, draft: &NoteDraft) -> StoreResult<Option<Note>>;
    fn delete_note(&self, id: i64) -> StoreResult<bool>;

    fn list_tasks(&self) -> StoreResult<Vec<Task>>;
    fn create_task(&self, draft: &TaskDraft) -> StoreResult<Task>;
    fn update_task(&self, id: i64, draft: &TaskDraft) -> StoreResult<Option<Task>>;
    fn delete_task(&self, id: i64) -> StoreResult<bool>;

    fn links(&self) -> StoreResult<Vec<LinkEntry>>;
    /// Replace the whole link list.
    fn replace_links(&self, links: &[LinkEntry]) -> StoreResult<()>;

    fn table_summaries(&self) -> StoreResult<Vec<TableSummary>>;

    /// Up to `limit` most recent rows of a known table as JSON objects.
    /// Unknown table names yield an empty list.
    fn table_rows(&self, table: &str, limit: usize) -> StoreResult<Vec<Value>>;
}

/// Open the store named by `url`.
///
/// # Errors
///
/// [`StoreError::UnsupportedUrl`] for schemes this build cannot serve, or the
/// backend's error when the initial connection fails.
pub fn open_store(url: &str) -> StoreResult<Arc<dyn RecordStore>> {
    let url = url.trim();
    let store: Arc<dyn RecordStore> = match classify_url(url)? {
        StoreUrl::Memory => Arc::new(KvStore::new(MemoryKv::new())),
        StoreUrl::KvFile(path) => Arc::new(KvStore::new(FileKv::new(path))),
        StoreUrl::SqliteMemory => Arc::new(SqliteStore::new(SqliteConnector::Memory)),
        StoreUrl::SqliteFile(path) => Arc::new(SqliteStore::new(SqliteConnector::File(path))),
    };
    store.table_summaries()?;
    Ok(store)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreUrl {
    Memory,
    KvFile(PathBuf),
    SqliteMemory,
    SqliteFile(PathBuf),
}

fn classify_url(url: &str) -> StoreResult<StoreUrl> {
    if url == "memory:" || url == "memory://" {
        return Ok(StoreUrl::Memory);
    }
    if let Some(path) = url.strip_prefix("kv:") {
        return non_empty(path, url).map(StoreUrl::KvFile);
    }
    if url == "sqlite::memory:" || url == "sqlite://:memory:" {
        return Ok(StoreUrl::SqliteMemory);
    }
    if let Some(rest) = url.strip_prefix("sqlite:") {
        let path = rest.strip_prefix("//").unwrap_or(rest);
        return non_empty(path, url).map(StoreUrl::SqliteFile);
    }
    if url.contains("://") {
        return Err(StoreError::UnsupportedUrl(url.to_string()));
    }

    let lower = url.to_ascii_lowercase();
    if lower.ends_with(".json") {
        Ok(StoreUrl::KvFile(PathBuf::from(url)))
    } else if [".db", ".sqlite", ".sqlite3"]
        .iter()
        .any(|ext| lower.ends_with(ext))
    {
        Ok(StoreUrl::SqliteFile(PathBuf::from(url)))
    } else {
        Err(StoreError::UnsupportedUrl(url.to_string()))
    }
}

fn non_empty(path: &str, url: &str) -> StoreResult<PathBuf> {
    if path.is_empty() {
        Err(StoreError::UnsupportedUrl(url.to_string()))
    } else {
        Ok(PathBuf::from(path))
    }
}
