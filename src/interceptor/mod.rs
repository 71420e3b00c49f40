//! Interceptor Module
//!
//! Request-side caching: eligibility, hit serving, miss capture and client
//! `Cache-Control` headers, plus the axum middleware wiring them to routes.

mod cache_control;
mod context;
mod middleware;
mod response_cache;

pub use cache_control::ClientCacheControl;
pub use context::{Identity, RequestContext};
pub use middleware::output_cache;
pub use response_cache::{
    is_cacheable, CachedResponse, Dispatch, ResponseCache, DEFAULT_MAX_BODY_BYTES,
};
