use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_TASK_STATUS: &str = "todo";
pub const DEFAULT_TASK_PRIORITY: &str = "medium";

/// A free-form note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub note_title: String,
    pub note_content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied note fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

/// A kanban card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied task fields with defaults already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
}

impl TaskDraft {
    /// Build a draft, filling in empty description, `todo` and `medium`.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        status: Option<String>,
        priority: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.unwrap_or_default(),
            status: status
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_TASK_STATUS.to_string()),
            priority: priority
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_TASK_PRIORITY.to_string()),
        }
    }
}

/// One tile of the link grid.
///
/// Ids are whatever the client sent; keys this type does not know about
/// are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkEntry {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub id: Value,
    #[serde(default, alias = "title", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default, alias = "icon", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Row count of one store table, for the database viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub table_name: String,
    pub row_count: usize,
}
