//! # apphub
//!
//! A personal app hub. Drop a folder containing an `index.html` into the
//! apps directory and the hub lists it, serves it under `/app/{name}/` and
//! gives it a handful of small JSON APIs to persist data through.
//!
//! ## Architecture
//!
//! - **[`hub`]** - App discovery, metadata merging and per-app file serving
//! - **[`static_files`]** - Path resolution with a traversal guard and content types
//! - **[`store`]** - The [`RecordStore`](store::RecordStore) trait with key-value and SQLite backends
//! - **[`router`]** - Regex route table mapping method and path to an [`Endpoint`](router::Endpoint)
//! - **[`handlers`]** - One function per endpoint, returning [`ApiResult`](error::ApiResult)
//! - **[`server`]** - HTTP server on `may_minihttp`, request parsing and response writing
//! - **[`middleware`]** - CORS and request tracing
//! - **[`config`]** / **[`logging`]** / **[`cli`]** - Startup plumbing
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as AppService
//!     participant MW as Middleware
//!     participant Router
//!     participant Handler
//!     participant Store as RecordStore
//!
//!     Client->>Server: GET /api/notes
//!     Server->>Server: parse_request (query, body, request id)
//!     Server->>MW: before()
//!     alt OPTIONS preflight
//!         MW-->>Server: 204
//!     end
//!     Server->>Router: route(GET, /api/notes)
//!     Router-->>Server: Endpoint::ListNotes
//!     Server->>Handler: dispatch
//!     Handler->>Store: list_notes()
//!     Store-->>Handler: Vec<Note>
//!     Handler-->>Server: HandlerResponse 200
//!     Server->>MW: after() adds CORS headers, logs latency
//!     Server-->>Client: 200 application/json
//! ```
//!
//! ## Runtime Considerations
//!
//! The server runs on the `may` coroutine runtime. Store calls are
//! synchronous and execute on the coroutine handling the request, so the
//! coroutine stack size (`APPHUB_STACK_SIZE`) must fit the SQLite call chain.
//!
//! ## Quick Start
//!
//! ```no_run
//! use apphub::cli::build_service;
//! use apphub::config::HubConfig;
//! use apphub::server::HttpServer;
//!
//! let config = HubConfig {
//!     database_url: Some("sqlite:hub.db".into()),
//!     ..HubConfig::default()
//! };
//! let service = build_service(&config).unwrap();
//! let handle = HttpServer(service).start(config.addr.as_str()).unwrap();
//! handle.join().unwrap();
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod server;
pub mod static_files;
pub mod store;

pub use error::{ApiError, ApiResult};
pub use hub::{AppDescriptor, AppRegistry};
pub use store::{open_store, RecordStore};
