//! Web Output Cache - read-through HTTP response caching for axum routes
//!
//! Serves stored responses for eligible GET requests and captures fresh
//! handler responses into an in-memory store with a fixed TTL.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod models;

pub use api::AppState;
pub use cache::{CacheKey, CachePolicy, MemoryStore, OutputStore};
pub use config::Config;
pub use error::{CacheError, Result};
pub use interceptor::{output_cache, Identity, RequestContext, ResponseCache};
