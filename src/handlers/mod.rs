//! Request handlers, one function per [`Endpoint`].
//!
//! Handlers validate input (required fields, numeric ids) and translate
//! between HTTP and the hub or the record store. They return
//! [`ApiResult`]; [`dispatch`] turns errors into responses.

mod apps;
mod frontend;
mod kanban;
mod links;
mod notes;
mod tables;

use crate::error::{ApiError, ApiResult};
use crate::router::{Endpoint, RouteMatch};
use crate::server::{AppState, HandlerResponse, ParsedRequest};

/// Run the handler for `route.endpoint`.
pub fn dispatch(state: &AppState, req: &ParsedRequest, route: &RouteMatch) -> HandlerResponse {
    let result = match route.endpoint {
        Endpoint::Health => frontend::health(state),
        Endpoint::FrontendIndex => frontend::index(state),
        Endpoint::FrontendAsset => frontend::asset(state, route),
        Endpoint::ListApps => apps::list(state),
        Endpoint::VisitApp => apps::visit(state, route),
        Endpoint::AppAsset => apps::asset(state, route),
        Endpoint::ListNotes => notes::list(state),
        Endpoint::CreateNote => notes::create(state, req),
        Endpoint::UpdateNote => notes::update(state, req, route),
        Endpoint::DeleteNote => notes::delete(state, route),
        Endpoint::ListTasks => kanban::list(state),
        Endpoint::CreateTask => kanban::create(state, req),
        Endpoint::UpdateTask => kanban::update(state, req, route),
        Endpoint::DeleteTask => kanban::delete(state, route),
        Endpoint::ListLinks => links::list(state),
        Endpoint::ReplaceLinks => links::replace(state, req),
        Endpoint::ListTables => tables::list(state),
        Endpoint::TableRows => tables::rows(state, req, route),
    };
    result.unwrap_or_else(ApiError::into_response)
}

/// Parse the `{id}` path parameter; `what` names the record in the error.
fn record_id(route: &RouteMatch, what: &str) -> ApiResult<i64> {
    route
        .param("id")
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .ok_or_else(|| ApiError::validation(format!("Invalid {what} ID")))
}

/// Serialize `value` as a JSON response.
fn json_response<T: serde::Serialize>(status: u16, value: &T) -> ApiResult<HandlerResponse> {
    let body = serde_json::to_value(value)
        .map_err(|e| ApiError::Storage(crate::store::StoreError::Corrupt(e.to_string())))?;
    Ok(HandlerResponse::json(status, body))
}
