//! Cache Policy Module

use serde::Deserialize;

// == Cache Policy ==
/// Per-endpoint caching rules, fixed when the interceptor is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct CachePolicy {
    /// Seconds a captured response is served from the store
    pub server_ttl: u64,
    /// Seconds clients may reuse a response (`max-age`)
    pub client_ttl: u64,
    /// Bypass caching for authenticated callers
    pub anonymous_only: bool,
}

impl CachePolicy {
    pub fn new(server_ttl: u64, client_ttl: u64, anonymous_only: bool) -> Self {
        Self {
            server_ttl,
            client_ttl,
            anonymous_only,
        }
    }

    /// Server-side caching only; no `Cache-Control` is emitted.
    pub fn server_only(server_ttl: u64) -> Self {
        Self::new(server_ttl, 0, false)
    }
}
