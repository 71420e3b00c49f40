//! Client Cache-Control Module

use std::fmt;

use axum::http::{header::CACHE_CONTROL, HeaderMap, HeaderValue};

// == Client Cache Control ==
/// The `Cache-Control` directives sent to clients of a cached endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientCacheControl {
    /// Seconds the client may reuse the response
    pub max_age: u64,
    /// Whether the client must revalidate once stale
    pub must_revalidate: bool,
}

impl ClientCacheControl {
    pub fn new(max_age: u64) -> Self {
        Self {
            max_age,
            must_revalidate: true,
        }
    }

    /// Sets the `Cache-Control` header, replacing any value the handler set.
    pub fn apply(&self, headers: &mut HeaderMap) {
        if let Ok(value) = HeaderValue::from_str(&self.to_string()) {
            headers.insert(CACHE_CONTROL, value);
        }
    }
}

impl fmt::Display for ClientCacheControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "max-age={}", self.max_age)?;
        if self.must_revalidate {
            write!(f, ", must-revalidate")?;
        }
        Ok(())
    }
}
