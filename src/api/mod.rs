//! API Module
//!
//! Demo HTTP endpoints served behind the output cache.
//!
//! # Endpoints
//! - `GET /items` - List items (cached)
//! - `POST /items` - Create an item
//! - `GET /items/:id` - Fetch one item (cached, anonymous callers only)
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
