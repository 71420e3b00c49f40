//! Output Cache Middleware
//!
//! Axum glue running both interceptor phases around the route's handler.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::Result;
use crate::interceptor::{Dispatch, RequestContext, ResponseCache};

/// Caches the wrapped route according to the interceptor's policy.
///
/// Register per route with `route_layer`:
///
/// ```ignore
/// let cache = ResponseCache::new(store, CachePolicy::new(60, 30, false));
/// Router::new().route(
///     "/items",
///     get(list_items).route_layer(middleware::from_fn_with_state(cache, output_cache)),
/// );
/// ```
pub async fn output_cache(
    State(cache): State<ResponseCache>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let ctx = RequestContext::from_request(&request);

    let key = match cache.on_before_dispatch(Some(&ctx))? {
        Dispatch::Hit(cached) => return Ok(cache.serve(&ctx, cached)),
        Dispatch::Proceed { key } => key,
    };

    let response = next.run(request).await;
    cache.on_after_dispatch(&ctx, key.as_ref(), response).await
}
