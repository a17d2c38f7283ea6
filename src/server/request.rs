use crate::error::ApiError;
use crate::ids::RequestId;
use http::Method;
use may_minihttp::Request;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, warn};

/// Parsed HTTP request data used by `AppService`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// HTTP headers (lowercase keys)
    pub headers: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    /// Raw request body
    pub body: Vec<u8>,
    pub request_id: RequestId,
}

impl ParsedRequest {
    /// Build a request by hand. Used by tests and benches.
    pub fn new(method: Method, target: &str) -> Self {
        let path = target.split('?').next().unwrap_or("/").to_string();
        Self {
            method,
            path,
            headers: HashMap::new(),
            query_params: parse_query_params(target),
            body: Vec::new(),
            request_id: RequestId::new(),
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] when the body is empty or not valid JSON
    /// for `T`.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Err(ApiError::validation("Request body is required"));
        }
        serde_json::from_slice(&self.body).map_err(|e| {
            debug!(error = %e, "Rejected request body");
            ApiError::validation("Invalid JSON in request body")
        })
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }
}

/// Parse query string parameters from a URL path
///
/// Extracts everything after the `?` character and URL-decodes parameter names and values.
pub fn parse_query_params(path: &str) -> HashMap<String, String> {
    match path.split_once('?') {
        Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        None => HashMap::new(),
    }
}

/// Read the whole body. A broken stream is a client error, not an empty body.
fn read_body(mut reader: impl Read) -> Result<Vec<u8>, ApiError> {
    let mut body = Vec::new();
    reader.read_to_end(&mut body).map_err(|e| {
        warn!(error = %e, "Failed to read request body");
        ApiError::validation("Failed to read request body")
    })?;
    Ok(body)
}

/// Parse an incoming HTTP request into a [`ParsedRequest`].
///
/// # Errors
///
/// [`ApiError::Validation`] when the method token is malformed or the
/// body cannot be read.
pub fn parse_request(req: Request) -> Result<ParsedRequest, ApiError> {
    let method = Method::from_bytes(req.method().as_bytes())
        .map_err(|_| ApiError::validation("Invalid HTTP method"))?;
    let raw_path = req.path().to_string();
    let path = raw_path.split('?').next().unwrap_or("/").to_string();

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).into_owned(),
            )
        })
        .collect();

    let query_params = parse_query_params(&raw_path);

    let body = read_body(req.body())?;

    let request_id = RequestId::from_headers(&headers);

    debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        header_count = headers.len(),
        query_count = query_params.len(),
        body_bytes = body.len(),
        "HTTP request parsed"
    );

    Ok(ParsedRequest {
        method,
        path,
        headers,
        query_params,
        body,
        request_id,
    })
}
