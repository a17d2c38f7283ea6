//! # Router Module
//!
//! Regex-based path matching. At startup each route pattern (for example
//! `/api/notes/{id}` or `/app/{name}/{*path}`) is compiled into an anchored
//! regex; each request is then tested against the table in order and the
//! first route whose method and pattern match wins, yielding an
//! [`Endpoint`] and its percent-decoded path parameters.
//!
//! ```rust
//! use apphub::router::{Endpoint, Router};
//! use http::Method;
//!
//! let router = Router::hub().unwrap();
//! let m = router.route(&Method::GET, "/app/notes/css/site.css").unwrap();
//! assert_eq!(m.endpoint, Endpoint::AppAsset);
//! assert_eq!(m.param("path"), Some("css/site.css"));
//! ```

mod core;
mod routes;

pub use core::{RouteMatch, RouteSpec, Router};
pub use routes::{hub_routes, Endpoint};
