use std::time::Duration;

use http::Method;

use super::Middleware;
use crate::server::{HandlerResponse, ParsedRequest};

/// CORS (Cross-Origin Resource Sharing) middleware
///
/// Answers preflight `OPTIONS` requests with `204 No Content` and adds the
/// `Access-Control-Allow-*` headers to every response.
pub struct CorsMiddleware {
    allow_origin: &'static str,
    allow_headers: &'static str,
    allow_methods: &'static str,
}

impl CorsMiddleware {
    /// Create a CORS middleware with a specific policy.
    ///
    /// Header lines are rendered once here; the server keeps one instance
    /// for its whole lifetime.
    ///
    /// ```rust
    /// use apphub::middleware::CorsMiddleware;
    /// use http::Method;
    ///
    /// let cors = CorsMiddleware::new(
    ///     &["https://hub.example".to_string()],
    ///     &["Content-Type".to_string()],
    ///     &[Method::GET, Method::POST],
    /// );
    /// ```
    pub fn new(origins: &[String], headers: &[String], methods: &[Method]) -> Self {
        let methods = methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            allow_origin: leak_line("Access-Control-Allow-Origin", &origins.join(", ")),
            allow_headers: leak_line("Access-Control-Allow-Headers", &headers.join(", ")),
            allow_methods: leak_line("Access-Control-Allow-Methods", &methods),
        }
    }

    /// Permissive policy for `origin` with the hub's methods and headers.
    pub fn for_origin(origin: &str) -> Self {
        if origin == "*" {
            return Self::default();
        }
        Self {
            allow_origin: leak_line("Access-Control-Allow-Origin", origin),
            ..Self::default()
        }
    }
}

fn leak_line(name: &str, value: &str) -> &'static str {
    Box::leak(format!("{name}: {value}").into_boxed_str())
}

/// Any origin; `GET, POST, PUT, DELETE, OPTIONS`; `Content-Type`.
impl Default for CorsMiddleware {
    fn default() -> Self {
        Self {
            allow_origin: "Access-Control-Allow-Origin: *",
            allow_headers: "Access-Control-Allow-Headers: Content-Type",
            allow_methods: "Access-Control-Allow-Methods: GET, POST, PUT, DELETE, OPTIONS",
        }
    }
}

impl Middleware for CorsMiddleware {
    fn before(&self, req: &ParsedRequest) -> Option<HandlerResponse> {
        (req.method == Method::OPTIONS).then(|| HandlerResponse::empty(204))
    }

    fn after(&self, _req: &ParsedRequest, res: &mut HandlerResponse, _latency: Duration) {
        res.set_header(self.allow_origin);
        res.set_header(self.allow_methods);
        res.set_header(self.allow_headers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preflight_short_circuits() {
        let cors = CorsMiddleware::default();
        let preflight = ParsedRequest::new(Method::OPTIONS, "/api/notes");
        assert_eq!(cors.before(&preflight).map(|r| r.status), Some(204));
        let get = ParsedRequest::new(Method::GET, "/api/notes");
        assert!(cors.before(&get).is_none());
    }

    #[test]
    fn test_headers_added() {
        let cors = CorsMiddleware::default();
        let req = ParsedRequest::new(Method::GET, "/api/apps");
        let mut res = HandlerResponse::json(200, serde_json::json!([]));
        cors.after(&req, &mut res, Duration::ZERO);
        assert_eq!(res.header("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(
            res.header("Access-Control-Allow-Methods"),
            Some("GET, POST, PUT, DELETE, OPTIONS")
        );
        assert_eq!(res.header("Access-Control-Allow-Headers"), Some("Content-Type"));
    }

    #[test]
    fn test_custom_policy() {
        let cors = CorsMiddleware::new(
            &["https://a.example".into(), "https://b.example".into()],
            &["Content-Type".into(), "X-Request-Id".into()],
            &[Method::GET],
        );
        let req = ParsedRequest::new(Method::GET, "/");
        let mut res = HandlerResponse::empty(200);
        cors.after(&req, &mut res, Duration::ZERO);
        assert_eq!(
            res.header("Access-Control-Allow-Origin"),
            Some("https://a.example, https://b.example")
        );
        assert_eq!(res.header("Access-Control-Allow-Methods"), Some("GET"));

        let single = CorsMiddleware::for_origin("https://hub.example");
        let mut res = HandlerResponse::empty(200);
        single.after(&req, &mut res, Duration::ZERO);
        assert_eq!(
            res.header("Access-Control-Allow-Origin"),
            Some("https://hub.example")
        );
        assert_eq!(res.header("Access-Control-Allow-Headers"), Some("Content-Type"));
    }
}
