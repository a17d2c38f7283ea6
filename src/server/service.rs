use super::request::{parse_request, ParsedRequest};
use super::response::{write_handler_response, HandlerResponse};
use crate::error::{ApiError, ApiResult};
use crate::handlers::dispatch;
use crate::hub::AppRegistry;
use crate::middleware::Middleware;
use crate::router::Router;
use crate::static_files::StaticFiles;
use crate::store::RecordStore;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info_span};

/// Everything a handler can reach.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AppRegistry>,
    /// `None` when no database is configured; reads then return empty
    /// lists and writes answer 503.
    pub store: Option<Arc<dyn RecordStore>>,
    /// The hub's own front-end, served at `/` and `/static/`.
    pub frontend: Option<StaticFiles>,
}

impl AppState {
    pub fn new(
        registry: Arc<AppRegistry>,
        store: Option<Arc<dyn RecordStore>>,
        frontend: Option<StaticFiles>,
    ) -> Self {
        Self {
            registry,
            store,
            frontend,
        }
    }

    /// The configured store.
    ///
    /// # Errors
    ///
    /// [`ApiError::Unavailable`] when there is none.
    pub fn store(&self) -> ApiResult<&dyn RecordStore> {
        self.store.as_deref().ok_or(ApiError::Unavailable)
    }
}

/// The hub as a `may_minihttp` service. Cloned once per connection.
#[derive(Clone)]
pub struct AppService {
    state: Arc<AppState>,
    router: Arc<Router>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl AppService {
    pub fn new(state: AppState, router: Router) -> Self {
        Self {
            state: Arc::new(state),
            router: Arc::new(router),
            middlewares: Vec::new(),
        }
    }

    /// Append a middleware; `before` hooks run in insertion order.
    #[must_use]
    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run one request through middleware, routing and its handler.
    pub fn handle(&self, req: &ParsedRequest) -> HandlerResponse {
        let start = Instant::now();
        let mut response = self
            .middlewares
            .iter()
            .find_map(|m| m.before(req))
            .unwrap_or_else(|| self.route(req));
        let latency = start.elapsed();
        for m in &self.middlewares {
            m.after(req, &mut response, latency);
        }
        response
    }

    fn route(&self, req: &ParsedRequest) -> HandlerResponse {
        match self.router.route(&req.method, &req.path) {
            Some(route) => {
                debug!(endpoint = route.endpoint.name(), "Route matched");
                dispatch(&self.state, req, &route)
            }
            None if self.router.path_known(&req.path) => {
                HandlerResponse::error(405, "Method not allowed")
            }
            None => HandlerResponse::error(404, "Not Found"),
        }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let parsed = match parse_request(req) {
            Ok(parsed) => parsed,
            Err(err) => {
                write_handler_response(res, err.into_response());
                return Ok(());
            }
        };
        let span = info_span!(
            "request",
            request_id = %parsed.request_id,
            method = %parsed.method,
            path = %parsed.path
        );
        let response = span.in_scope(|| self.handle(&parsed));
        write_handler_response(res, response);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::CorsMiddleware;
    use crate::server::ResponseBody;
    use crate::store::{KvStore, MemoryKv};
    use http::Method;
    use serde_json::json;
    use std::fs;

    fn service(with_store: bool) -> (AppService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("notes");
        fs::create_dir_all(&app).unwrap();
        fs::write(app.join("index.html"), "<html><head></head><body></body></html>").unwrap();
        let store: Option<Arc<dyn RecordStore>> = if with_store {
            Some(Arc::new(KvStore::new(MemoryKv::new())))
        } else {
            None
        };
        let state = AppState::new(Arc::new(AppRegistry::new(dir.path())), store, None);
        let svc = AppService::new(state, Router::hub().unwrap())
            .with_middleware(Arc::new(CorsMiddleware::default()));
        (svc, dir)
    }

    #[test]
    fn test_create_then_list_notes() {
        let (svc, _dir) = service(true);
        let created = svc.handle(
            &ParsedRequest::new(Method::POST, "/api/notes")
                .with_body(r#"{"title":"t","content":"c"}"#),
        );
        assert_eq!(created.status, 201);

        let listed = svc.handle(&ParsedRequest::new(Method::GET, "/api/notes"));
        match listed.body {
            ResponseBody::Json(v) => assert_eq!(v[0]["note_title"], "t"),
            other => panic!("unexpected body {other:?}"),
        }
        assert_eq!(listed.header("Access-Control-Allow-Origin"), Some("*"));
    }

    #[test]
    fn test_without_store() {
        let (svc, _dir) = service(false);
        let list = svc.handle(&ParsedRequest::new(Method::GET, "/api/kanban"));
        assert_eq!(list.status, 200);
        assert_eq!(list.body, ResponseBody::Json(json!([])));

        let write = svc.handle(
            &ParsedRequest::new(Method::POST, "/api/kanban").with_body(r#"{"title":"x"}"#),
        );
        assert_eq!(write.status, 503);
    }

    #[test]
    fn test_preflight_and_unknown_routes() {
        let (svc, _dir) = service(false);
        let pre = svc.handle(&ParsedRequest::new(Method::OPTIONS, "/api/notes"));
        assert_eq!(pre.status, 204);
        assert_eq!(
            pre.header("Access-Control-Allow-Methods"),
            Some("GET, POST, PUT, DELETE, OPTIONS")
        );

        let missing = svc.handle(&ParsedRequest::new(Method::GET, "/nope"));
        assert_eq!(missing.status, 404);
        let wrong = svc.handle(&ParsedRequest::new(Method::PATCH, "/api/notes/1"));
        assert_eq!(wrong.status, 405);
    }

    #[test]
    fn test_visit_app() {
        let (svc, _dir) = service(false);
        let page = svc.handle(&ParsedRequest::new(Method::GET, "/app/notes"));
        assert_eq!(page.status, 200);
        match page.body {
            ResponseBody::Html(html) => assert!(html.contains(r#"<base href="/app/notes/">"#)),
            other => panic!("unexpected body {other:?}"),
        }
        let missing = svc.handle(&ParsedRequest::new(Method::GET, "/app/ghost"));
        assert_eq!(missing.status, 404);
        assert_eq!(missing.body, ResponseBody::Text("App not found".into()));
    }
}
