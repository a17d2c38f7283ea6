use crate::error::{ApiError, ApiResult};
use crate::router::RouteMatch;
use crate::server::{AppState, HandlerResponse};
use serde_json::json;

/// `GET /health`
pub fn health(state: &AppState) -> ApiResult<HandlerResponse> {
    Ok(HandlerResponse::json(
        200,
        json!({
            "status": "ok",
            "store": state.store.as_ref().map(|s| s.backend_name()),
        }),
    ))
}

/// `GET /`: the hub's own front page.
pub fn index(state: &AppState) -> ApiResult<HandlerResponse> {
    serve(state, "index.html", "Frontend not found")
}

/// `GET /static/{*path}`
pub fn asset(state: &AppState, route: &RouteMatch) -> ApiResult<HandlerResponse> {
    serve(state, route.param("path").unwrap_or_default(), "File not found")
}

fn serve(state: &AppState, path: &str, missing: &'static str) -> ApiResult<HandlerResponse> {
    let frontend = state
        .frontend
        .as_ref()
        .ok_or_else(|| ApiError::not_found("Not Found"))?;
    match frontend.load(path) {
        Ok((bytes, content_type)) => Ok(HandlerResponse::bytes(bytes, content_type)),
        Err(_) => Ok(HandlerResponse::text(404, missing)),
    }
}
