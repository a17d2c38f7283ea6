use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::Middleware;
use crate::server::{HandlerResponse, ParsedRequest};

/// Logs one line per completed request at a level matching its status.
///
/// The surrounding `request` span (opened by the service) carries the
/// request id, so these events only add outcome fields.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &ParsedRequest) -> Option<HandlerResponse> {
        debug!(method = %req.method, path = %req.path, "Request started");
        None
    }

    fn after(&self, req: &ParsedRequest, res: &mut HandlerResponse, latency: Duration) {
        let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        match res.status {
            500..=599 => error!(
                method = %req.method,
                path = %req.path,
                status = res.status,
                latency_ms,
                "Request failed"
            ),
            400..=499 => warn!(
                method = %req.method,
                path = %req.path,
                status = res.status,
                latency_ms,
                "Request rejected"
            ),
            _ => info!(
                method = %req.method,
                path = %req.path,
                status = res.status,
                latency_ms,
                "Request completed"
            ),
        }
    }
}
