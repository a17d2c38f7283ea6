//! Document-style backend: each collection is one JSON array stored under
//! its table name, and every write rewrites the whole array.

use super::connection::{Connector, ManagedConnection};
use super::error::{StoreError, StoreResult};
use super::models::{LinkEntry, Note, NoteDraft, TableSummary, Task, TaskDraft};
use super::{RecordStore, KNOWN_TABLES, LINKS_TABLE, NOTES_TABLE, TASKS_TABLE};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// An open handle to a key-value database.
pub trait KvConnection: Send {
    fn get(&mut self, key: &str) -> StoreResult<Option<Value>>;
    fn set(&mut self, key: &str, value: Value) -> StoreResult<()>;
}

/// A key-value database that can hand out connections.
pub trait KvBackend: Send + Sync {
    type Conn: KvConnection;

    /// Open a connection.
    ///
    /// # Errors
    ///
    /// [`StoreError::Connection`] when the database is unreachable.
    fn open(&self) -> StoreResult<Self::Conn>;

    fn describe(&self) -> String;

    fn backend_name(&self) -> &'static str;
}

struct BackendConnector<B>(B);

impl<B: KvBackend> Connector for BackendConnector<B> {
    type Conn = B::Conn;

    fn connect(&self) -> StoreResult<B::Conn> {
        self.0.open()
    }

    fn describe(&self) -> String {
        self.0.describe()
    }
}

/// Process-local key-value map. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    data: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryKv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvConnection for MemoryKv {
    fn get(&mut self, key: &str) -> StoreResult<Option<Value>> {
        let data = self
            .data
            .lock()
            .map_err(|_| StoreError::Connection("memory store poisoned".to_string()))?;
        Ok(data.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> StoreResult<()> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| StoreError::Connection("memory store poisoned".to_string()))?;
        data.insert(key.to_string(), value);
        Ok(())
    }
}

impl KvBackend for MemoryKv {
    type Conn = MemoryKv;

    fn open(&self) -> StoreResult<MemoryKv> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// One JSON object on disk mapping keys to values.
#[derive(Debug, Clone)]
pub struct FileKv {
    path: PathBuf,
}

impl FileKv {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Connection to a [`FileKv`] document. The file is re-read on every call
/// so edits made by other processes are picked up.
#[derive(Debug)]
pub struct FileKvConnection {
    path: PathBuf,
}

impl FileKvConnection {
    fn read_document(&self) -> StoreResult<Map<String, Value>> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Map::new()),
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes)? {
                Value::Object(map) => Ok(map),
                _ => Err(StoreError::Corrupt(format!(
                    "{} does not contain a JSON object",
                    self.path.display()
                ))),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_document(&self, doc: &Map<String, Value>) -> StoreResult<()> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        let bytes = serde_json::to_vec_pretty(doc)?;
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KvConnection for FileKvConnection {
    fn get(&mut self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.read_document()?.remove(key))
    }

    fn set(&mut self, key: &str, value: Value) -> StoreResult<()> {
        let mut doc = self.read_document()?;
        doc.insert(key.to_string(), value);
        self.write_document(&doc)
    }
}

impl KvBackend for FileKv {
    type Conn = FileKvConnection;

    fn open(&self) -> StoreResult<FileKvConnection> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = FileKvConnection {
            path: self.path.clone(),
        };
        conn.read_document()?;
        Ok(conn)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

/// [`RecordStore`] over any [`KvBackend`].
pub struct KvStore<B: KvBackend> {
    name: &'static str,
    conn: ManagedConnection<BackendConnector<B>>,
}

impl<B: KvBackend> KvStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            name: backend.backend_name(),
            conn: ManagedConnection::new(BackendConnector(backend)),
        }
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Vec<T>> {
        self.conn.run(|c| read_collection(c, key))
    }

    /// Read-modify-write of one collection. `edit` decides whether anything
    /// changed; unchanged collections are not written back.
    fn modify<T, R>(
        &self,
        key: &str,
        mut edit: impl FnMut(&mut Vec<T>) -> StoreResult<(bool, R)>,
    ) -> StoreResult<R>
    where
        T: DeserializeOwned + Serialize,
    {
        self.conn.run(|c| {
            let mut items: Vec<T> = read_collection(c, key)?;
            let (changed, out) = edit(&mut items)?;
            if changed {
                c.set(key, serde_json::to_value(&items)?)?;
            }
            Ok(out)
        })
    }

    fn raw_rows(&self, key: &str) -> StoreResult<Vec<Value>> {
        self.load::<Value>(key)
    }
}

fn read_collection<T: DeserializeOwned>(
    conn: &mut impl KvConnection,
    key: &str,
) -> StoreResult<Vec<T>> {
    match conn.get(key)? {
        Some(value @ Value::Array(_)) => Ok(serde_json::from_value(value)?),
        Some(_) => {
            debug!(key, "Collection is not an array, treating as empty");
            Ok(Vec::new())
        }
        None => Ok(Vec::new()),
    }
}

/// Millisecond timestamp ids, bumped past the current maximum on collision.
fn next_id(existing: impl Iterator<Item = i64>) -> StoreResult<i64> {
    let now = Utc::now().timestamp_millis();
    match existing.max() {
        Some(max) if max >= now => max
            .checked_add(1)
            .ok_or_else(|| StoreError::Corrupt(format!("record id {max} leaves no room"))),
        _ => Ok(now),
    }
}

impl<B: KvBackend> RecordStore for KvStore<B> {
    fn backend_name(&self) -> &'static str {
        self.name
    }

    fn list_notes(&self) -> StoreResult<Vec<Note>> {
        self.load(NOTES_TABLE)
    }

    fn create_note(&self, draft: &NoteDraft) -> StoreResult<Note> {
        self.modify(NOTES_TABLE, |notes: &mut Vec<Note>| {
            let now = Utc::now();
            let note = Note {
                id: next_id(notes.iter().map(|n| n.id))?,
                note_title: draft.title.clone(),
                note_content: draft.content.clone(),
                created_at: now,
                updated_at: now,
            };
            notes.insert(0, note.clone());
            Ok((true, note))
        })
    }

    fn update_note(&self, id: i64, draft: &NoteDraft) -> StoreResult<Option<Note>> {
        self.modify(NOTES_TABLE, |notes: &mut Vec<Note>| {
            match notes.iter_mut().find(|n| n.id == id) {
                Some(note) => {
                    note.note_title = draft.title.clone();
                    note.note_content = draft.content.clone();
                    note.updated_at = Utc::now();
                    Ok((true, Some(note.clone())))
                }
                None => Ok((false, None)),
            }
        })
    }

    fn delete_note(&self, id: i64) -> StoreResult<bool> {
        self.modify(NOTES_TABLE, |notes: &mut Vec<Note>| {
            let before = notes.len();
            notes.retain(|n| n.id != id);
            let removed = notes.len() != before;
            Ok((removed, removed))
        })
    }

    fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        self.load(TASKS_TABLE)
    }

    fn create_task(&self, draft: &TaskDraft) -> StoreResult<Task> {
        self.modify(TASKS_TABLE, |tasks: &mut Vec<Task>| {
            let now = Utc::now();
            let task = Task {
                id: next_id(tasks.iter().map(|t| t.id))?,
                title: draft.title.clone(),
                description: draft.description.clone(),
                status: draft.status.clone(),
                priority: draft.priority.clone(),
                created_at: now,
                updated_at: now,
            };
            tasks.insert(0, task.clone());
            Ok((true, task))
        })
    }

    fn update_task(&self, id: i64, draft: &TaskDraft) -> StoreResult<Option<Task>> {
        self.modify(TASKS_TABLE, |tasks: &mut Vec<Task>| {
            match tasks.iter_mut().find(|t| t.id == id) {
                Some(task) => {
                    task.title = draft.title.clone();
                    task.description = draft.description.clone();
                    task.status = draft.status.clone();
                    task.priority = draft.priority.clone();
                    task.updated_at = Utc::now();
                    Ok((true, Some(task.clone())))
                }
                None => Ok((false, None)),
            }
        })
    }

    fn delete_task(&self, id: i64) -> StoreResult<bool> {
        self.modify(TASKS_TABLE, |tasks: &mut Vec<Task>| {
            let before = tasks.len();
            tasks.retain(|t| t.id != id);
            let removed = tasks.len() != before;
            Ok((removed, removed))
        })
    }

    fn links(&self) -> StoreResult<Vec<LinkEntry>> {
        self.load(LINKS_TABLE)
    }

    fn replace_links(&self, links: &[LinkEntry]) -> StoreResult<()> {
        let value = serde_json::to_value(links)?;
        self.conn.run(|c| c.set(LINKS_TABLE, value.clone()))
    }

    fn table_summaries(&self) -> StoreResult<Vec<TableSummary>> {
        KNOWN_TABLES
            .iter()
            .map(|table| -> StoreResult<TableSummary> {
                Ok(TableSummary {
                    table_name: (*table).to_string(),
                    row_count: self.raw_rows(table)?.len(),
                })
            })
            .collect()
    }

    fn table_rows(&self, table: &str, limit: usize) -> StoreResult<Vec<Value>> {
        if !KNOWN_TABLES.contains(&table) {
            return Ok(Vec::new());
        }
        let mut rows = self.raw_rows(table)?;
        rows.truncate(limit);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft(title: &str, content: &str) -> NoteDraft {
        NoteDraft {
            title: title.into(),
            content: content.into(),
        }
    }

    #[test]
    fn test_note_crud_round_trip() {
        let store = KvStore::new(MemoryKv::new());
        let note = store.create_note(&draft("a", "b")).unwrap();
        assert_eq!(note.created_at, note.updated_at);

        let updated = store
            .update_note(note.id, &draft("c", "d"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.note_title, "c");
        assert!(updated.updated_at >= updated.created_at);

        let all = store.list_notes().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].note_content, "d");

        assert!(store.delete_note(note.id).unwrap());
        assert!(!store.delete_note(note.id).unwrap());
        assert!(store.list_notes().unwrap().is_empty());
    }

    #[test]
    fn test_missing_ids() {
        let store = KvStore::new(MemoryKv::new());
        assert!(store.update_note(42, &draft("x", "y")).unwrap().is_none());
        let task = TaskDraft::new("t", None, None, None);
        assert!(store.update_task(42, &task).unwrap().is_none());
        assert!(!store.delete_task(42).unwrap());
    }

    #[test]
    fn test_ids_unique_and_newest_first() {
        let store = KvStore::new(MemoryKv::new());
        let a = store
            .create_task(&TaskDraft::new("a", None, None, None))
            .unwrap();
        let b = store
            .create_task(&TaskDraft::new("b", None, None, None))
            .unwrap();
        assert!(b.id > a.id);
        let titles: Vec<_> = store
            .list_tasks()
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["b", "a"]);
    }

    #[test]
    fn test_exhausted_id_space_is_corrupt() {
        let kv = MemoryKv::new();
        let store = KvStore::new(kv.clone());
        let note = store.create_note(&draft("last", "one")).unwrap();
        let maxed = Note {
            id: i64::MAX,
            ..note
        };
        kv.clone()
            .set(NOTES_TABLE, serde_json::to_value(vec![maxed]).unwrap())
            .unwrap();

        assert!(matches!(
            store.create_note(&draft("next", "one")),
            Err(StoreError::Corrupt(_))
        ));
        assert_eq!(store.list_notes().unwrap().len(), 1);
    }

    #[test]
    fn test_non_array_collection_reads_empty() {
        let kv = MemoryKv::new();
        kv.clone().set(NOTES_TABLE, json!({"oops": true})).unwrap();
        let store = KvStore::new(kv);
        assert!(store.list_notes().unwrap().is_empty());
    }

    #[test]
    fn test_links_replace_and_table_views() {
        let store = KvStore::new(MemoryKv::new());
        let links: Vec<LinkEntry> = serde_json::from_value(json!([
            {"id": "x1", "name": "Docs", "url": "https://docs.rs", "color": "red"},
            {"id": 2, "title": "Crates", "url": "https://crates.io"}
        ]))
        .unwrap();
        store.replace_links(&links).unwrap();
        assert_eq!(store.links().unwrap(), links);

        store.create_note(&draft("n", "c")).unwrap();
        let summaries = store.table_summaries().unwrap();
        let counts: Vec<_> = summaries
            .iter()
            .map(|s| (s.table_name.as_str(), s.row_count))
            .collect();
        assert_eq!(
            counts,
            vec![(NOTES_TABLE, 1), (TASKS_TABLE, 0), (LINKS_TABLE, 2)]
        );

        let rows = store.table_rows(LINKS_TABLE, 1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["color"], "red");
        assert!(store.table_rows("users", 10).unwrap().is_empty());
    }

    #[test]
    fn test_file_kv_persists_across_stores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("hub.json");

        let store = KvStore::new(FileKv::new(&path));
        let note = store.create_note(&draft("keep", "me")).unwrap();
        drop(store);

        let reopened = KvStore::new(FileKv::new(&path));
        let notes = reopened.list_notes().unwrap();
        assert_eq!(notes, vec![note]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_kv_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hub.json");
        fs::write(&path, "[1, 2").unwrap();
        let store = KvStore::new(FileKv::new(&path));
        assert!(matches!(store.list_notes(), Err(StoreError::Corrupt(_))));
    }
}
