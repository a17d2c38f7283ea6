use super::{json_response, record_id};
use crate::error::{ApiError, ApiResult};
use crate::router::RouteMatch;
use crate::server::{AppState, HandlerResponse, ParsedRequest};
use crate::store::NoteDraft;
use serde::Deserialize;

/// Note payload. Both `title`/`content` and `note_title`/`note_content`
/// are accepted; the short names win when both are non-empty.
#[derive(Debug, Default, Deserialize)]
struct NoteBody {
    title: Option<String>,
    content: Option<String>,
    note_title: Option<String>,
    note_content: Option<String>,
}

impl NoteBody {
    fn into_draft(self) -> ApiResult<NoteDraft> {
        let pick = |a: Option<String>, b: Option<String>| {
            a.filter(|s| !s.is_empty()).or(b.filter(|s| !s.is_empty()))
        };
        match (
            pick(self.title, self.note_title),
            pick(self.content, self.note_content),
        ) {
            (Some(title), Some(content)) => Ok(NoteDraft { title, content }),
            _ => Err(ApiError::validation("Title and content are required")),
        }
    }
}

pub fn list(state: &AppState) -> ApiResult<HandlerResponse> {
    match &state.store {
        Some(store) => json_response(200, &store.list_notes()?),
        None => Ok(HandlerResponse::json(200, serde_json::json!([]))),
    }
}

pub fn create(state: &AppState, req: &ParsedRequest) -> ApiResult<HandlerResponse> {
    let store = state.store()?;
    let draft = req.json_body::<NoteBody>()?.into_draft()?;
    json_response(201, &store.create_note(&draft)?)
}

pub fn update(
    state: &AppState,
    req: &ParsedRequest,
    route: &RouteMatch,
) -> ApiResult<HandlerResponse> {
    let store = state.store()?;
    let id = record_id(route, "note")?;
    let draft = req.json_body::<NoteBody>()?.into_draft()?;
    match store.update_note(id, &draft)? {
        Some(note) => json_response(200, &note),
        None => Err(ApiError::not_found("Note not found")),
    }
}

pub fn delete(state: &AppState, route: &RouteMatch) -> ApiResult<HandlerResponse> {
    let store = state.store()?;
    let id = record_id(route, "note")?;
    if store.delete_note(id)? {
        Ok(HandlerResponse::message("Note deleted successfully"))
    } else {
        Err(ApiError::not_found("Note not found"))
    }
}
