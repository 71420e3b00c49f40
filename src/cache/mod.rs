//! Cache Module
//!
//! Provides the response store with TTL expiration, cache keys and policies.

mod entry;
mod key;
mod policy;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use key::{CacheKey, DEFAULT_ACCEPT, KEY_DELIMITER};
pub use policy::CachePolicy;
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use store::{MemoryStore, OutputStore};
