use super::json_response;
use crate::error::ApiResult;
use crate::router::RouteMatch;
use crate::server::{AppState, HandlerResponse};
use tracing::debug;

/// `GET /api/apps`: rescan and list every app.
pub fn list(state: &AppState) -> ApiResult<HandlerResponse> {
    json_response(200, &state.registry.list())
}

/// `GET /app/{name}`: the app's entry page with a base tag injected.
pub fn visit(state: &AppState, route: &RouteMatch) -> ApiResult<HandlerResponse> {
    let name = route.param("name").unwrap_or_default();
    match state.registry.visit(name) {
        Some(html) => Ok(HandlerResponse::html(html)),
        None => {
            debug!(app = %name, "App not found");
            Ok(HandlerResponse::text(404, "App not found"))
        }
    }
}

/// `GET /app/{name}/{*path}`: one of the app's files.
pub fn asset(state: &AppState, route: &RouteMatch) -> ApiResult<HandlerResponse> {
    let name = route.param("name").unwrap_or_default();
    let path = route.param("path").unwrap_or_default();
    match state.registry.serve_static(name, path) {
        Some(asset) => Ok(HandlerResponse::bytes(asset.content, asset.content_type)),
        None => {
            debug!(app = %name, path = %path, "App file not found");
            Ok(HandlerResponse::text(404, "File not found"))
        }
    }
}
