//! Configuration Module
//!
//! Handles loading server and cache policy configuration from environment variables.

use std::env;

use crate::cache::CachePolicy;
use crate::interceptor::DEFAULT_MAX_BODY_BYTES;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Server-side cache lifetime in seconds for cached endpoints
    pub server_ttl: u64,
    /// Client `max-age` in seconds for cached endpoints
    pub client_ttl: u64,
    /// Only cache responses for anonymous callers
    pub anonymous_only: bool,
    /// Largest response body the cache will capture
    pub max_body_bytes: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SERVER_TTL` - Server cache TTL in seconds (default: 60)
    /// - `CLIENT_TTL` - Client max-age in seconds (default: 30)
    /// - `ANONYMOUS_ONLY` - `true`/`false` (default: false)
    /// - `MAX_BODY_BYTES` - Capture limit in bytes (default: 1 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            server_ttl: parse_var("SERVER_TTL").unwrap_or(defaults.server_ttl),
            client_ttl: parse_var("CLIENT_TTL").unwrap_or(defaults.client_ttl),
            anonymous_only: parse_var("ANONYMOUS_ONLY").unwrap_or(defaults.anonymous_only),
            max_body_bytes: parse_var("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
        }
    }

    /// Cache policy applied to the demo's cached routes.
    pub fn policy(&self) -> CachePolicy {
        CachePolicy::new(self.server_ttl, self.client_ttl, self.anonymous_only)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            server_ttl: 60,
            client_ttl: 30,
            anonymous_only: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}
