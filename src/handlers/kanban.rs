use super::{json_response, record_id};
use crate::error::{ApiError, ApiResult};
use crate::router::RouteMatch;
use crate::server::{AppState, HandlerResponse, ParsedRequest};
use crate::store::TaskDraft;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct TaskBody {
    title: Option<String>,
    description: Option<String>,
    status: Option<String>,
    priority: Option<String>,
}

impl TaskBody {
    fn into_draft(self) -> ApiResult<TaskDraft> {
        match self.title.filter(|t| !t.is_empty()) {
            Some(title) => Ok(TaskDraft::new(
                title,
                self.description,
                self.status,
                self.priority,
            )),
            None => Err(ApiError::validation("Title is required")),
        }
    }
}

pub fn list(state: &AppState) -> ApiResult<HandlerResponse> {
    match &state.store {
        Some(store) => json_response(200, &store.list_tasks()?),
        None => Ok(HandlerResponse::json(200, serde_json::json!([]))),
    }
}

pub fn create(state: &AppState, req: &ParsedRequest) -> ApiResult<HandlerResponse> {
    let store = state.store()?;
    let draft = req.json_body::<TaskBody>()?.into_draft()?;
    json_response(201, &store.create_task(&draft)?)
}

/// Replaces every mutable field; omitted ones fall back to their defaults.
pub fn update(
    state: &AppState,
    req: &ParsedRequest,
    route: &RouteMatch,
) -> ApiResult<HandlerResponse> {
    let store = state.store()?;
    let id = record_id(route, "task")?;
    let draft = req.json_body::<TaskBody>()?.into_draft()?;
    match store.update_task(id, &draft)? {
        Some(task) => json_response(200, &task),
        None => Err(ApiError::not_found("Task not found")),
    }
}

pub fn delete(state: &AppState, route: &RouteMatch) -> ApiResult<HandlerResponse> {
    let store = state.store()?;
    let id = record_id(route, "task")?;
    if store.delete_task(id)? {
        Ok(HandlerResponse::message("Task deleted successfully"))
    } else {
        Err(ApiError::not_found("Task not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_only_gets_defaults() {
        let body: TaskBody = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        let draft = body.into_draft().unwrap();
        assert_eq!(draft.description, "");
        assert_eq!(draft.status, "todo");
        assert_eq!(draft.priority, "medium");
    }

    #[test]
    fn test_empty_title_rejected() {
        let body: TaskBody = serde_json::from_str(r#"{"title":"","status":"done"}"#).unwrap();
        assert_eq!(
            body.into_draft().unwrap_err(),
            ApiError::validation("Title is required")
        );
    }
}
