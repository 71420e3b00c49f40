//! API Routes
//!
//! Configures the Axum router, attaching the output cache to the item routes.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_item, get_item, health_handler, identify, list_items, stats_handler, AppState,
};
use crate::cache::CachePolicy;
use crate::interceptor::output_cache;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /items` - Cached with the configured policy
/// - `POST /items` - Same route; bypasses the cache as a non-GET
/// - `GET /items/:id` - Cached for anonymous callers only
/// - `GET /stats` - Store statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let list_cache = state.cache.clone();
    let item_cache = state.cache.with_policy(CachePolicy {
        anonymous_only: true,
        ..state.cache.policy()
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/items",
            get(list_items)
                .post(create_item)
                .route_layer(from_fn_with_state(list_cache, output_cache)),
        )
        .route(
            "/items/:id",
            get(get_item).route_layer(from_fn_with_state(item_cache, output_cache)),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(from_fn(identify))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
