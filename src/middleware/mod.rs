mod core;
mod cors;
mod tracing;

pub use core::Middleware;
pub use cors::CorsMiddleware;
pub use tracing::TracingMiddleware;
