use may_minihttp::Response;
use serde_json::{json, Value};

/// Body of a [`HandlerResponse`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Html(String),
    Bytes {
        content: Vec<u8>,
        content_type: &'static str,
    },
    Empty,
}

/// Response produced by a handler or a middleware short-circuit.
///
/// `headers` are complete header lines (`"Name: value"`). may_minihttp only
/// accepts `'static` header lines, so dynamic values must be prepared once
/// up front (see [`CorsMiddleware`](crate::middleware::CorsMiddleware)).
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: u16,
    pub headers: Vec<&'static str>,
    pub body: ResponseBody,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, body: ResponseBody) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self::new(status, ResponseBody::Json(body))
    }

    /// `{"error": message}` with the given status.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "error": message }))
    }

    /// `{"message": message}` with status 200.
    #[must_use]
    pub fn message(message: &str) -> Self {
        Self::json(200, json!({ "message": message }))
    }

    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, ResponseBody::Text(body.into()))
    }

    #[must_use]
    pub fn html(body: String) -> Self {
        Self::new(200, ResponseBody::Html(body))
    }

    #[must_use]
    pub fn bytes(content: Vec<u8>, content_type: &'static str) -> Self {
        Self::new(
            200,
            ResponseBody::Bytes {
                content,
                content_type,
            },
        )
    }

    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self::new(status, ResponseBody::Empty)
    }

    /// Add a header line, replacing any earlier line with the same name.
    pub fn set_header(&mut self, line: &'static str) {
        if let Some(name) = header_name(line) {
            self.headers
                .retain(|h| !header_name(h).is_some_and(|n| n.eq_ignore_ascii_case(name)));
        }
        self.headers.push(line);
    }

    /// Value of the first header called `name`, case-insensitive.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&'static str> {
        self.headers.iter().copied().find_map(|h| {
            let (n, v) = h.split_once(':')?;
            n.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }
}

fn header_name(line: &str) -> Option<&str> {
    line.split_once(':').map(|(n, _)| n.trim())
}

pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// Static `Content-Type` header line for a MIME type from the static file
/// table; anything else is sent as `application/octet-stream`.
pub fn content_type_line(content_type: &str) -> &'static str {
    match content_type {
        "text/html" => "Content-Type: text/html",
        "text/css" => "Content-Type: text/css",
        "application/javascript" => "Content-Type: application/javascript",
        "application/json" => "Content-Type: application/json",
        "text/plain" => "Content-Type: text/plain",
        "image/png" => "Content-Type: image/png",
        "image/jpeg" => "Content-Type: image/jpeg",
        "image/gif" => "Content-Type: image/gif",
        "image/svg+xml" => "Content-Type: image/svg+xml",
        "image/x-icon" => "Content-Type: image/x-icon",
        "image/webp" => "Content-Type: image/webp",
        "font/woff" => "Content-Type: font/woff",
        "font/woff2" => "Content-Type: font/woff2",
        _ => "Content-Type: application/octet-stream",
    }
}

pub fn write_handler_response(res: &mut Response, hr: HandlerResponse) {
    res.status_code(usize::from(hr.status), status_reason(hr.status));
    for line in hr.headers {
        res.header(line);
    }
    match hr.body {
        ResponseBody::Json(value) => {
            res.header("Content-Type: application/json");
            res.body_vec(value.to_string().into_bytes());
        }
        ResponseBody::Text(s) => {
            res.header("Content-Type: text/plain; charset=utf-8");
            res.body_vec(s.into_bytes());
        }
        ResponseBody::Html(s) => {
            res.header("Content-Type: text/html; charset=utf-8");
            res.body_vec(s.into_bytes());
        }
        ResponseBody::Bytes {
            content,
            content_type,
        } => {
            res.header(content_type_line(content_type));
            res.body_vec(content);
        }
        ResponseBody::Empty => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::static_files::content_type_for;
    use std::path::Path;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(204), "No Content");
        assert_eq!(status_reason(503), "Service Unavailable");
    }

    #[test]
    fn test_every_static_type_has_a_header_line() {
        for file in [
            "a.html", "a.css", "a.js", "a.json", "a.txt", "a.png", "a.jpg", "a.gif", "a.svg",
            "a.ico", "a.webp", "a.woff", "a.woff2",
        ] {
            let ct = content_type_for(Path::new(file));
            assert_eq!(content_type_line(ct), format!("Content-Type: {ct}"), "{file}");
        }
        assert_eq!(
            content_type_line("application/x-unknown"),
            "Content-Type: application/octet-stream"
        );
    }

    #[test]
    fn test_set_header_replaces_same_name() {
        let mut hr = HandlerResponse::empty(204);
        hr.set_header("Access-Control-Allow-Origin: *");
        hr.set_header("access-control-allow-origin: https://a.example");
        assert_eq!(hr.headers.len(), 1);
        assert_eq!(
            hr.header("Access-Control-Allow-Origin"),
            Some("https://a.example")
        );
    }
}
