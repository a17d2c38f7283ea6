use std::time::Duration;

use crate::server::{HandlerResponse, ParsedRequest};

/// Hook run around every request.
///
/// `before` may answer the request itself by returning a response; `after`
/// sees every response, including ones produced by a `before` short-circuit.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &ParsedRequest) -> Option<HandlerResponse> {
        None
    }
    fn after(&self, _req: &ParsedRequest, _res: &mut HandlerResponse, _latency: Duration) {}
}
