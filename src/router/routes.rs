use super::core::{RouteSpec, Router};
use http::Method;

/// Every operation the hub serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Health,
    FrontendIndex,
    FrontendAsset,
    ListApps,
    VisitApp,
    AppAsset,
    ListNotes,
    CreateNote,
    UpdateNote,
    DeleteNote,
    ListTasks,
    CreateTask,
    UpdateTask,
    DeleteTask,
    ListLinks,
    ReplaceLinks,
    ListTables,
    TableRows,
}

impl Endpoint {
    /// Stable name for logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Health => "health",
            Endpoint::FrontendIndex => "frontend_index",
            Endpoint::FrontendAsset => "frontend_asset",
            Endpoint::ListApps => "list_apps",
            Endpoint::VisitApp => "visit_app",
            Endpoint::AppAsset => "app_asset",
            Endpoint::ListNotes => "list_notes",
            Endpoint::CreateNote => "create_note",
            Endpoint::UpdateNote => "update_note",
            Endpoint::DeleteNote => "delete_note",
            Endpoint::ListTasks => "list_tasks",
            Endpoint::CreateTask => "create_task",
            Endpoint::UpdateTask => "update_task",
            Endpoint::DeleteTask => "delete_task",
            Endpoint::ListLinks => "list_links",
            Endpoint::ReplaceLinks => "replace_links",
            Endpoint::ListTables => "list_tables",
            Endpoint::TableRows => "table_rows",
        }
    }
}

/// The hub's routing table.
pub fn hub_routes() -> Vec<RouteSpec> {
    use Endpoint::*;
    vec![
        RouteSpec::new(Method::GET, "/health", Health),
        RouteSpec::new(Method::GET, "/", FrontendIndex),
        RouteSpec::new(Method::GET, "/static/{*path}", FrontendAsset),
        RouteSpec::new(Method::GET, "/api/apps", ListApps),
        RouteSpec::new(Method::GET, "/app/{name}", VisitApp),
        RouteSpec::new(Method::GET, "/app/{name}/{*path}", AppAsset),
        RouteSpec::new(Method::GET, "/api/notes", ListNotes),
        RouteSpec::new(Method::POST, "/api/notes", CreateNote),
        RouteSpec::new(Method::PUT, "/api/notes/{id}", UpdateNote),
        RouteSpec::new(Method::DELETE, "/api/notes/{id}", DeleteNote),
        RouteSpec::new(Method::GET, "/api/kanban", ListTasks),
        RouteSpec::new(Method::POST, "/api/kanban", CreateTask),
        RouteSpec::new(Method::PUT, "/api/kanban/{id}", UpdateTask),
        RouteSpec::new(Method::DELETE, "/api/kanban/{id}", DeleteTask),
        RouteSpec::new(Method::GET, "/api/tw-grid-links", ListLinks),
        RouteSpec::new(Method::POST, "/api/tw-grid-links", ReplaceLinks),
        RouteSpec::new(Method::GET, "/api/database/tables", ListTables),
        RouteSpec::new(Method::GET, "/api/database/tables/{name}", TableRows),
    ]
}

impl Router {
    /// Router over [`hub_routes`].
    ///
    /// # Errors
    ///
    /// Only if a built-in pattern fails to compile.
    pub fn hub() -> Result<Self, regex::Error> {
        Router::new(&hub_routes())
    }
}
