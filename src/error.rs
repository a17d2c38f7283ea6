use crate::server::HandlerResponse;
use crate::store::StoreError;
use std::fmt;
use tracing::error;

/// Failure of an API handler, mapped onto an HTTP status by
/// [`ApiError::into_response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 404 with the given message.
    NotFound(String),
    /// 400 with the given message.
    Validation(String),
    /// 500; the cause is logged but never sent to the client.
    Storage(StoreError),
    /// 503; no record store is configured.
    Unavailable,
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::Validation(_) => 400,
            ApiError::Storage(_) => 500,
            ApiError::Unavailable => 503,
        }
    }

    #[must_use]
    pub fn into_response(self) -> HandlerResponse {
        match self {
            ApiError::NotFound(msg) => HandlerResponse::error(404, &msg),
            ApiError::Validation(msg) => HandlerResponse::error(400, &msg),
            ApiError::Storage(err) => {
                error!(error = %err, "Store operation failed");
                HandlerResponse::error(500, "Internal server error")
            }
            ApiError::Unavailable => HandlerResponse::error(503, "Database not available"),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "not found: {msg}"),
            ApiError::Validation(msg) => write!(f, "invalid request: {msg}"),
            ApiError::Storage(err) => write!(f, "{err}"),
            ApiError::Unavailable => write!(f, "database not available"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        ApiError::Storage(value)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
