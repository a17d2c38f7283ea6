use std::fmt;

/// Failure reported by a [`RecordStore`](super::RecordStore) backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached or the connection broke mid-call.
    ///
    /// Only this variant triggers a reconnect-and-retry.
    Connection(String),
    /// A statement or write was rejected.
    Query(String),
    /// Stored data could not be decoded.
    Corrupt(String),
    /// The database URL names a backend this build does not support.
    UnsupportedUrl(String),
}

impl StoreError {
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Connection(msg) => write!(f, "store connection failed: {msg}"),
            StoreError::Query(msg) => write!(f, "store query failed: {msg}"),
            StoreError::Corrupt(msg) => write!(f, "stored data is malformed: {msg}"),
            StoreError::UnsupportedUrl(url) => {
                write!(f, "unsupported database url '{url}' (expected memory:, kv:PATH or sqlite:PATH)")
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        StoreError::Connection(value.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        StoreError::Corrupt(value.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;
        match &value {
            rusqlite::Error::SqliteFailure(e, _)
                if matches!(
                    e.code,
                    ErrorCode::CannotOpen
                        | ErrorCode::SystemIoFailure
                        | ErrorCode::NotADatabase
                        | ErrorCode::DatabaseBusy
                        | ErrorCode::DatabaseLocked
                        | ErrorCode::FileLockingProtocolFailed
                ) =>
            {
                StoreError::Connection(value.to_string())
            }
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..) => StoreError::Corrupt(value.to_string()),
            _ => StoreError::Query(value.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
