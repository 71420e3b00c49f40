//! API Handlers
//!
//! HTTP request handlers for the demo endpoints fronted by the output cache.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use tracing::debug;

use crate::cache::MemoryStore;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::interceptor::{Identity, ResponseCache};
use crate::models::{CreateItemRequest, HealthResponse, Item, ListItemsQuery, StatsResponse};

/// Items returned per page by `GET /items`
pub const PAGE_SIZE: usize = 10;

/// Application state shared across all handlers.
///
/// The store is created once per process; every cached route holds a
/// [`ResponseCache`] handle onto it.
#[derive(Clone)]
pub struct AppState {
    /// Shared response store
    pub store: Arc<MemoryStore>,
    /// Interceptor carrying the default endpoint policy
    pub cache: ResponseCache,
    /// Demo data set
    pub items: Arc<RwLock<Vec<Item>>>,
}

impl AppState {
    /// Creates a new AppState around an existing store.
    pub fn new(store: Arc<MemoryStore>, cache: ResponseCache) -> Self {
        Self {
            store,
            cache,
            items: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::new(store.clone(), config.policy())
            .with_max_body_bytes(config.max_body_bytes);
        Self::new(store, cache)
    }
}

/// Marks requests carrying an `Authorization` header as authenticated.
///
/// Stands in for a real authentication layer; credentials are not checked.
pub async fn identify(mut request: Request, next: Next) -> Response {
    let identity = if request.headers().contains_key(AUTHORIZATION) {
        Identity::authenticated()
    } else {
        Identity::anonymous()
    };
    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// Handler for GET /items
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
) -> Json<Vec<Item>> {
    let items = state.items.read().await;
    let page: Vec<Item> = items
        .iter()
        .skip((query.page() - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .cloned()
        .collect();

    debug!("Listing page {} ({} items)", query.page(), page.len());
    Json(page)
}

/// Handler for POST /items
pub async fn create_item(
    State(state): State<AppState>,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<Item>)> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut items = state.items.write().await;
    let item = Item::new(items.len() as u64 + 1, req.name.trim());
    items.push(item.clone());

    Ok((StatusCode::CREATED, Json(item)))
}

/// Handler for GET /items/:id
pub async fn get_item(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Item>> {
    let items = state.items.read().await;
    items
        .iter()
        .find(|item| item.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| CacheError::NotFound(format!("item {}", id)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.store.stats().into())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
