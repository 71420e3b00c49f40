//! Request Context Module
//!
//! The request attributes the cache reads: method, target, Accept values and caller identity.

use axum::http::{header::ACCEPT, Method, Request};

use crate::cache::CacheKey;

// == Identity ==
/// Authentication state of the caller, inserted as a request extension by
/// the host's authentication layer. A request without it is anonymous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity {
    pub is_authenticated: bool,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            is_authenticated: false,
        }
    }

    pub fn authenticated() -> Self {
        Self {
            is_authenticated: true,
        }
    }
}

// == Request Context ==
/// Snapshot of an inbound request as seen by the cache.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// HTTP method
    pub method: Method,
    /// Path plus `?query` when present
    pub path_and_query: String,
    /// Raw Accept header values in order
    pub accept: Vec<String>,
    /// Whether the caller is authenticated
    pub is_authenticated: bool,
}

impl RequestContext {
    /// Creates an anonymous context with no Accept header.
    pub fn new(method: Method, path_and_query: impl Into<String>) -> Self {
        Self {
            method,
            path_and_query: path_and_query.into(),
            accept: Vec::new(),
            is_authenticated: false,
        }
    }

    pub fn with_accept(mut self, value: impl Into<String>) -> Self {
        self.accept.push(value.into());
        self
    }

    pub fn with_authenticated(mut self, is_authenticated: bool) -> Self {
        self.is_authenticated = is_authenticated;
        self
    }

    // == From Request ==
    /// Reads the cache-relevant attributes out of an HTTP request.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let uri = request.uri();
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());

        let accept = request
            .headers()
            .get_all(ACCEPT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();

        let is_authenticated = request
            .extensions()
            .get::<Identity>()
            .map(|identity| identity.is_authenticated)
            .unwrap_or(false);

        Self {
            method: request.method().clone(),
            path_and_query,
            accept,
            is_authenticated,
        }
    }

    /// Derives the store key for this request.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::from_parts(
            self.path_and_query.clone(),
            self.accept.iter().map(String::as_str),
        )
    }
}
