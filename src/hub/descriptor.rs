use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_DESCRIPTION: &str = "A tiny app";
pub const DEFAULT_ICON: &str = "mdi:application";
pub const DEFAULT_COLOR: &str = "#3498db";
pub const DEFAULT_CATEGORY: &str = "General";

/// Display metadata for one discovered app directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppDescriptor {
    pub title: String,
    pub description: String,
    pub icon: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub visit_count: u64,
    pub color: String,
    pub category: String,
    pub tags: Vec<String>,
    /// Always the directory name; used to build `/app/{path}` URLs.
    pub path: String,
}

/// Optional per-app overrides read from `app-metadata.json`.
///
/// Unknown keys are ignored. A field of the wrong type is dropped on its
/// own; only a file that is not a JSON object fails as a whole.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    #[serde(deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub icon: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub created: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(alias = "visitCount", deserialize_with = "lenient")]
    pub visit_count: Option<u64>,
    #[serde(deserialize_with = "lenient")]
    pub color: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub tags: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub path: Option<String>,
}

/// Any JSON value; `None` when it does not fit `T`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl AppDescriptor {
    /// Defaults for a directory discovered at `now`.
    #[must_use]
    pub fn with_defaults(dir_name: &str, now: DateTime<Utc>) -> Self {
        Self {
            title: dir_name.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            icon: DEFAULT_ICON.to_string(),
            created: now,
            modified: now,
            visit_count: 0,
            color: DEFAULT_COLOR.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            tags: Vec::new(),
            path: dir_name.to_string(),
        }
    }

    /// Overlay `meta` field by field; present metadata wins.
    ///
    /// `path` is never taken from metadata.
    #[must_use]
    pub fn merge(self, meta: AppMetadata) -> Self {
        Self {
            title: meta.title.unwrap_or(self.title),
            description: meta.description.unwrap_or(self.description),
            icon: meta.icon.unwrap_or(self.icon),
            created: meta.created.unwrap_or(self.created),
            modified: meta.modified.unwrap_or(self.modified),
            visit_count: meta.visit_count.unwrap_or(self.visit_count),
            color: meta.color.unwrap_or(self.color),
            category: meta.category.unwrap_or(self.category),
            tags: meta.tags.unwrap_or(self.tags),
            path: self.path,
        }
    }
}
