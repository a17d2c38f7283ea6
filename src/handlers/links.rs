use super::json_response;
use crate::error::{ApiError, ApiResult};
use crate::server::{AppState, HandlerResponse, ParsedRequest};
use crate::store::LinkEntry;
use serde_json::Value;

pub fn list(state: &AppState) -> ApiResult<HandlerResponse> {
    match &state.store {
        Some(store) => json_response(200, &store.links()?),
        None => Ok(HandlerResponse::json(200, serde_json::json!([]))),
    }
}

/// `POST /api/tw-grid-links`: replace the whole list with the body array.
pub fn replace(state: &AppState, req: &ParsedRequest) -> ApiResult<HandlerResponse> {
    let store = state.store()?;
    let links = parse_links(req.json_body::<Value>()?)?;
    store.replace_links(&links)?;
    Ok(HandlerResponse::message("Links updated successfully."))
}

fn parse_links(body: Value) -> ApiResult<Vec<LinkEntry>> {
    match body {
        Value::Array(items) => items
            .into_iter()
            .map(|item| {
                if !item.is_object() {
                    return Err(ApiError::validation("Each link must be a JSON object."));
                }
                serde_json::from_value(item)
                    .map_err(|e| ApiError::validation(format!("Invalid link entry: {e}")))
            })
            .collect(),
        _ => Err(ApiError::validation(
            "Request body must be an array of links.",
        )),
    }
}
