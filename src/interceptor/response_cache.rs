//! Response Cache Interceptor
//!
//! Read-through caching around a handler: the pre-dispatch phase serves hits,
//! the post-dispatch phase captures misses and attaches client cache headers.

use std::fmt;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheKey, CachePolicy, OutputStore};
use crate::error::{CacheError, Result};
use crate::interceptor::{ClientCacheControl, RequestContext};

/// Default capture limit for response bodies.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

// == Eligibility ==
/// Decides whether a request may be cached for `ttl` seconds.
///
/// Used with the server TTL for the store and with the client TTL for the
/// `Cache-Control` header; the two are evaluated independently.
pub fn is_cacheable(
    ttl: u64,
    method: &Method,
    is_authenticated: bool,
    anonymous_only: bool,
) -> bool {
    if ttl == 0 {
        return false;
    }
    if anonymous_only && is_authenticated {
        return false;
    }
    *method == Method::GET
}

// == Dispatch Decision ==
/// Outcome of the pre-dispatch phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Serve the stored response; the handler must not run.
    Hit(CachedResponse),
    /// Run the handler. `key` is set when the response should be captured.
    Proceed { key: Option<CacheKey> },
}

/// A response rebuilt from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub body: String,
    pub content_type: Option<String>,
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, self.body).into_response();
        response.headers_mut().remove(CONTENT_TYPE);

        if let Some(content_type) = self.content_type {
            match HeaderValue::from_str(&content_type) {
                Ok(value) => {
                    response.headers_mut().insert(CONTENT_TYPE, value);
                }
                Err(_) => warn!("Dropping invalid cached content type {:?}", content_type),
            }
        }
        response
    }
}

// == Response Cache ==
/// Interceptor for one endpoint: a fixed policy plus a handle to the shared store.
#[derive(Clone)]
pub struct ResponseCache {
    policy: CachePolicy,
    store: Arc<dyn OutputStore>,
    max_body_bytes: usize,
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("policy", &self.policy)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

impl ResponseCache {
    // == Constructor ==
    pub fn new(store: Arc<dyn OutputStore>, policy: CachePolicy) -> Self {
        Self {
            policy,
            store,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Responses larger than `max_body_bytes` are passed through uncached.
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Same store, different endpoint policy.
    pub fn with_policy(&self, policy: CachePolicy) -> Self {
        Self {
            policy,
            ..self.clone()
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    // == Pre-Dispatch ==
    /// Looks the request up in the store.
    ///
    /// Fails with [`CacheError::InvalidArgument`] when no context is given.
    pub fn on_before_dispatch(&self, ctx: Option<&RequestContext>) -> Result<Dispatch> {
        let ctx = ctx.ok_or_else(|| {
            CacheError::InvalidArgument("request context is required".to_string())
        })?;

        if !is_cacheable(
            self.policy.server_ttl,
            &ctx.method,
            ctx.is_authenticated,
            self.policy.anonymous_only,
        ) {
            debug!("Bypassing cache for {} {}", ctx.method, ctx.path_and_query);
            return Ok(Dispatch::Proceed { key: None });
        }

        let key = ctx.cache_key();
        match self.store.get(&key.to_string()) {
            Some(entry) if !entry.body.is_empty() => {
                debug!("Cache hit for {}", key);
                let content_type = entry.content_type.or_else(|| key.content_type_hint());
                Ok(Dispatch::Hit(CachedResponse {
                    body: entry.body,
                    content_type,
                }))
            }
            _ => {
                debug!("Cache miss for {}", key);
                Ok(Dispatch::Proceed { key: Some(key) })
            }
        }
    }

    /// Builds the response for a hit, with client cache headers attached.
    pub fn serve(&self, ctx: &RequestContext, cached: CachedResponse) -> Response {
        let mut response = cached.into_response();
        self.apply_client_cache_control(ctx, &mut response);
        response
    }

    // == Post-Dispatch ==
    /// Captures the handler's response under `key` and attaches client cache headers.
    pub async fn on_after_dispatch(
        &self,
        ctx: &RequestContext,
        key: Option<&CacheKey>,
        response: Response,
    ) -> Result<Response> {
        let mut response = match key {
            Some(key) => self.capture(key, response).await?,
            None => response,
        };

        self.apply_client_cache_control(ctx, &mut response);
        Ok(response)
    }

    /// The client cache directives for this request, if it is eligible.
    pub fn client_cache_control(&self, ctx: &RequestContext) -> Option<ClientCacheControl> {
        is_cacheable(
            self.policy.client_ttl,
            &ctx.method,
            ctx.is_authenticated,
            self.policy.anonymous_only,
        )
        .then(|| ClientCacheControl::new(self.policy.client_ttl))
    }

    fn apply_client_cache_control(&self, ctx: &RequestContext, response: &mut Response) {
        if let Some(cache_control) = self.client_cache_control(ctx) {
            cache_control.apply(response.headers_mut());
        }
    }

    // == Capture ==
    /// Stores the response body unless another request already populated the key.
    ///
    /// The body is read chunk by chunk. Once it grows past `max_body_bytes`
    /// capture stops and the client gets the bytes read so far followed by
    /// the rest of the stream.
    async fn capture(&self, key: &CacheKey, response: Response) -> Result<Response> {
        let rendered = key.to_string();

        if self.store.contains(&rendered) {
            debug!("Entry for {} already populated", rendered);
            return Ok(response);
        }
        if response.status() != StatusCode::OK {
            debug!("Not caching {} response for {}", response.status(), rendered);
            return Ok(response);
        }
        if declared_length(&response).is_some_and(|len| len > self.max_body_bytes) {
            debug!("Response for {} exceeds capture limit", rendered);
            return Ok(response);
        }

        let (parts, body) = response.into_parts();
        let mut stream = body.into_data_stream();
        let mut buffered: Vec<u8> = Vec::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| CacheError::BodyRead(e.to_string()))?;
            buffered.extend_from_slice(&chunk);

            if buffered.len() > self.max_body_bytes {
                debug!("Response for {} exceeds capture limit", rendered);
                let head = futures::stream::once(async move {
                    Ok::<_, axum::Error>(Bytes::from(buffered))
                });
                let body = Body::from_stream(head.chain(stream));
                return Ok(Response::from_parts(parts, body));
            }
        }

        let bytes = Bytes::from(buffered);
        match std::str::from_utf8(&bytes) {
            Ok(text) => {
                let content_type = parts
                    .headers
                    .get(CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);

                self.store.add(
                    &rendered,
                    CacheEntry::new(text.to_string(), content_type, self.policy.server_ttl),
                );
                info!(
                    "Cached {} ({} bytes, ttl={}s)",
                    rendered,
                    bytes.len(),
                    self.policy.server_ttl
                );
            }
            Err(_) => warn!("Response for {} is not UTF-8; not caching", rendered),
        }

        Ok(Response::from_parts(parts, Body::from(bytes)))
    }
}

fn declared_length(response: &Response) -> Option<usize> {
    response
        .headers()
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use axum::body::to_bytes;
    use axum::http::header::CACHE_CONTROL;
    use std::time::Duration;

    fn setup(policy: CachePolicy) -> (Arc<MemoryStore>, ResponseCache) {
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::new(store.clone(), policy);
        (store, cache)
    }

    fn get_items() -> RequestContext {
        RequestContext::new(Method::GET, "/items?page=1").with_accept("application/json")
    }

    fn json_response(body: &'static str) -> Response {
        ([(CONTENT_TYPE, "application/json")], body).into_response()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_is_cacheable_rules() {
        assert!(is_cacheable(60, &Method::GET, false, false));
        assert!(is_cacheable(60, &Method::GET, true, false));
        assert!(!is_cacheable(0, &Method::GET, false, false));
        assert!(!is_cacheable(60, &Method::POST, false, false));
        assert!(!is_cacheable(60, &Method::HEAD, false, false));
        assert!(!is_cacheable(60, &Method::GET, true, true));
        assert!(is_cacheable(60, &Method::GET, false, true));
    }

    #[test]
    fn test_missing_context_is_invalid_argument() {
        let (_, cache) = setup(CachePolicy::new(60, 30, false));

        let result = cache.on_before_dispatch(None);
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_ineligible_request_computes_no_key() {
        let (store, cache) = setup(CachePolicy::new(60, 30, false));
        let ctx = RequestContext::new(Method::POST, "/items");

        let dispatch = cache.on_before_dispatch(Some(&ctx)).unwrap();
        assert_eq!(dispatch, Dispatch::Proceed { key: None });
        assert_eq!(store.stats().misses, 0, "Store must not be read");
    }

    #[test]
    fn test_miss_returns_key() {
        let (_, cache) = setup(CachePolicy::new(60, 30, false));

        let dispatch = cache.on_before_dispatch(Some(&get_items())).unwrap();
        match dispatch {
            Dispatch::Proceed { key: Some(key) } => {
                assert_eq!(key.to_string(), "/items?page=1:application/json")
            }
            other => panic!("expected miss, got {:?}", other),
        }
    }

    #[test]
    fn test_hit_with_empty_body_is_miss() {
        let (store, cache) = setup(CachePolicy::new(60, 30, false));
        store.add(
            "/items?page=1:application/json",
            CacheEntry::new(String::new(), None, 60),
        );

        let dispatch = cache.on_before_dispatch(Some(&get_items())).unwrap();
        assert!(matches!(dispatch, Dispatch::Proceed { key: Some(_) }));

        let stats = store.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_anonymous_only_skips_authenticated_context() {
        let (store, cache) = setup(CachePolicy::new(60, 30, true));
        store.add(
            "/items?page=1:application/json",
            CacheEntry::new("[1]".to_string(), None, 60),
        );
        let ctx = get_items().with_authenticated(true);

        let dispatch = cache.on_before_dispatch(Some(&ctx)).unwrap();
        assert_eq!(dispatch, Dispatch::Proceed { key: None });
        assert!(cache.client_cache_control(&ctx).is_none());
        assert_eq!(store.stats().hits, 0);
    }

    #[tokio::test]
    async fn test_endless_stream_passes_through_uncached() {
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::new(store.clone(), CachePolicy::server_only(60))
            .with_max_body_bytes(4);
        let ctx = get_items();
        let key = ctx.cache_key();

        let events = futures::stream::repeat_with(|| {
            Ok::<_, std::io::Error>(Bytes::from_static(b"data: x\n\n"))
        });
        let response = Response::new(Body::from_stream(events));

        let response = tokio::time::timeout(
            Duration::from_secs(2),
            cache.on_after_dispatch(&ctx, Some(&key), response),
        )
        .await
        .expect("capture must give up at the limit")
        .unwrap();

        let mut body = response.into_body().into_data_stream();
        let first = body.next().await.unwrap().unwrap();
        assert_eq!(&first[..], b"data: x\n\n");
        let second = body.next().await.unwrap().unwrap();
        assert_eq!(&second[..], b"data: x\n\n");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_chunked_body_over_limit_is_forwarded_whole() {
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::new(store.clone(), CachePolicy::server_only(60))
            .with_max_body_bytes(4);
        let ctx = get_items();
        let key = ctx.cache_key();

        let chunks = futures::stream::iter(["abc", "def", "ghi"])
            .map(|chunk| Ok::<_, std::io::Error>(Bytes::from_static(chunk.as_bytes())));
        let response = Response::new(Body::from_stream(chunks));

        let response = cache
            .on_after_dispatch(&ctx, Some(&key), response)
            .await
            .unwrap();

        assert_eq!(body_string(response).await, "abcdefghi");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_non_ok_success_is_not_captured() {
        let (store, cache) = setup(CachePolicy::server_only(60));
        let ctx = get_items();
        let key = ctx.cache_key();

        let response = (StatusCode::CREATED, "[1]").into_response();
        let response = cache
            .on_after_dispatch(&ctx, Some(&key), response)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(store.is_empty());
    }

    #[test]
    fn test_hit_without_content_type_uses_accept() {
        let (store, cache) = setup(CachePolicy::new(60, 30, false));
        store.add(
            "/items?page=1:application/json",
            CacheEntry::new("[1]".to_string(), None, 60),
        );

        let dispatch = cache.on_before_dispatch(Some(&get_items())).unwrap();
        assert_eq!(
            dispatch,
            Dispatch::Hit(CachedResponse {
                body: "[1]".to_string(),
                content_type: Some("application/json".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let (store, cache) = setup(CachePolicy::new(60, 30, false));
        let ctx = get_items();

        let key = match cache.on_before_dispatch(Some(&ctx)).unwrap() {
            Dispatch::Proceed { key } => key,
            Dispatch::Hit(_) => panic!("first request must miss"),
        };
        let response = cache
            .on_after_dispatch(&ctx, key.as_ref(), json_response("[1,2,3]"))
            .await
            .unwrap();

        assert_eq!(response.headers()[CACHE_CONTROL], "max-age=30, must-revalidate");
        assert_eq!(body_string(response).await, "[1,2,3]");
        assert_eq!(store.len(), 1);

        match cache.on_before_dispatch(Some(&ctx)).unwrap() {
            Dispatch::Hit(cached) => {
                let response = cache.serve(&ctx, cached);
                assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
                assert_eq!(response.headers()[CACHE_CONTROL], "max-age=30, must-revalidate");
                assert_eq!(body_string(response).await, "[1,2,3]");
            }
            other => panic!("second request must hit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_existing_entry_is_not_overwritten() {
        let (store, cache) = setup(CachePolicy::new(60, 0, false));
        let ctx = get_items();
        let key = ctx.cache_key();
        store.add(
            &key.to_string(),
            CacheEntry::new("old".to_string(), None, 60),
        );

        let response = cache
            .on_after_dispatch(&ctx, Some(&key), json_response("new"))
            .await
            .unwrap();

        assert_eq!(body_string(response).await, "new");
        assert_eq!(store.get(&key.to_string()).unwrap().body, "old");
    }

    #[tokio::test]
    async fn test_error_responses_are_not_captured() {
        let (store, cache) = setup(CachePolicy::new(60, 0, false));
        let ctx = get_items();
        let key = ctx.cache_key();

        let response = (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
        let response = cache
            .on_after_dispatch(&ctx, Some(&key), response)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_body_passes_through() {
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::new(store.clone(), CachePolicy::server_only(60))
            .with_max_body_bytes(4);
        let ctx = get_items();
        let key = ctx.cache_key();

        let response = cache
            .on_after_dispatch(&ctx, Some(&key), json_response("[1,2,3]"))
            .await
            .unwrap();

        assert_eq!(body_string(response).await, "[1,2,3]");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_client_header_only_when_client_ttl_set() {
        let (_, cache) = setup(CachePolicy::server_only(60));
        let ctx = get_items();

        let response = cache
            .on_after_dispatch(&ctx, None, json_response("[]"))
            .await
            .unwrap();

        assert!(response.headers().get(CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn test_client_header_without_server_caching() {
        let (store, cache) = setup(CachePolicy::new(0, 15, false));
        let ctx = get_items();

        let key = match cache.on_before_dispatch(Some(&ctx)).unwrap() {
            Dispatch::Proceed { key } => key,
            Dispatch::Hit(_) => panic!("nothing cached"),
        };
        assert!(key.is_none());

        let response = cache
            .on_after_dispatch(&ctx, key.as_ref(), json_response("[]"))
            .await
            .unwrap();

        assert_eq!(response.headers()[CACHE_CONTROL], "max-age=15, must-revalidate");
        assert!(store.is_empty());
    }

    #[test]
    fn test_with_policy_shares_store() {
        let (store, cache) = setup(CachePolicy::server_only(60));
        let other = cache.with_policy(CachePolicy::new(10, 5, true));

        store.add("/items:Default", CacheEntry::new("x".to_string(), None, 60));
        let ctx = RequestContext::new(Method::GET, "/items");

        assert!(matches!(
            other.on_before_dispatch(Some(&ctx)).unwrap(),
            Dispatch::Hit(_)
        ));
        assert_eq!(other.policy(), CachePolicy::new(10, 5, true));
    }
}
