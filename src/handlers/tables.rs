use super::json_response;
use crate::error::{ApiError, ApiResult};
use crate::router::RouteMatch;
use crate::server::{AppState, HandlerResponse, ParsedRequest};
use crate::store::MAX_TABLE_ROWS;

/// `GET /api/database/tables`: row counts per known table.
pub fn list(state: &AppState) -> ApiResult<HandlerResponse> {
    match &state.store {
        Some(store) => json_response(200, &store.table_summaries()?),
        None => Ok(HandlerResponse::json(200, serde_json::json!([]))),
    }
}

/// `GET /api/database/tables/{name}?limit=N`: most recent rows, at most 100.
pub fn rows(
    state: &AppState,
    req: &ParsedRequest,
    route: &RouteMatch,
) -> ApiResult<HandlerResponse> {
    let limit = row_limit(req.query("limit"))?;
    let table = route.param("name").unwrap_or_default();
    match &state.store {
        Some(store) => json_response(200, &store.table_rows(table, limit)?),
        None => Ok(HandlerResponse::json(200, serde_json::json!([]))),
    }
}

fn row_limit(raw: Option<&str>) -> ApiResult<usize> {
    match raw {
        None | Some("") => Ok(MAX_TABLE_ROWS),
        Some(s) => s
            .trim()
            .parse::<usize>()
            .map(|n| n.min(MAX_TABLE_ROWS))
            .map_err(|_| ApiError::validation("Invalid limit")),
    }
}
