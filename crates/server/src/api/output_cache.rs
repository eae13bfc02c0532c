//! Per-route response caching backed by [`OutputCache`].

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jawn_content::{CachedResponse, OutputCache};
use tracing::{debug, warn};

/// Largest body the cache will buffer.
const MAX_CACHED_BODY: usize = 16 * 1024 * 1024;

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;

/// How long a route's responses live and which tags evict them.
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub tags: &'static [&'static str],
    /// Cache a separate copy per `Accept` header value.
    pub vary_by_accept: bool,
}

impl CachePolicy {
    const fn new(seconds: u64, tags: &'static [&'static str]) -> Self {
        Self {
            ttl: Duration::from_secs(seconds),
            tags,
            vary_by_accept: false,
        }
    }

    const fn vary_by_accept(mut self) -> Self {
        self.vary_by_accept = true;
        self
    }

    /// `Cache-Control` value advertising the same lifetime to clients.
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.ttl.as_secs())
    }

    fn key(&self, request: &Request) -> String {
        let uri = request
            .uri()
            .path_and_query()
            .map_or_else(|| request.uri().path().to_owned(), |pq| pq.as_str().to_owned());
        if !self.vary_by_accept {
            return uri;
        }
        let accept = request
            .headers()
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        format!("{uri}|accept={accept}")
    }
}

pub const HOME: CachePolicy = CachePolicy::new(6 * HOUR, &["home", "tips", "content"]);
pub const DETAILS: CachePolicy = CachePolicy::new(3 * DAY, &["tips", "content"]);
pub const CATEGORY: CachePolicy = CachePolicy::new(6 * HOUR, &["tips", "content", "category"]);
pub const TAG: CachePolicy = CachePolicy::new(6 * HOUR, &["tips", "content", "tag"]);
pub const STATIC_PAGE: CachePolicy = CachePolicy::new(3 * DAY, &["static"]);
pub const SITEMAP: CachePolicy = CachePolicy::new(6 * HOUR, &["sitemap"]);
pub const RSS: CachePolicy = CachePolicy::new(2 * HOUR, &["rss"]).vary_by_accept();
pub const ARTICLE_IMAGES: CachePolicy = CachePolicy::new(30 * DAY, &["article-images"]);

/// Middleware state: the shared cache and the route's policy.
#[derive(Clone)]
pub struct OutputCacheLayerState {
    pub cache: Arc<OutputCache>,
    pub policy: CachePolicy,
}

/// Serve successful `GET` responses from the cache, storing misses.
///
/// Successful responses get the policy's `Cache-Control` header unless the
/// handler set one. A disabled cache still sets the header but never
/// buffers.
pub async fn cache_responses(
    State(layer): State<OutputCacheLayerState>,
    request: Request,
    next: Next,
) -> Response {
    let OutputCacheLayerState { cache, policy } = layer;
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = policy.key(&request);
    if let Some(hit) = cache.get(&key) {
        debug!(key = %key, "output cache hit");
        return replay(hit);
    }

    let mut response = next.run(request).await;
    if !response.status().is_success() {
        return response;
    }
    apply_headers(response.headers_mut(), &policy);

    if !cache.is_enabled() || response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_CACHED_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(key = %key, error = %e, "response body could not be buffered");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let stored = CachedResponse {
        status: parts.status.as_u16(),
        headers: parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_owned(), v.to_owned()))
            })
            .collect(),
        body: bytes.clone(),
    };
    cache.insert(&key, stored, policy.ttl, policy.tags);
    debug!(key = %key, tags = ?policy.tags, "output cache stored");

    Response::from_parts(parts, Body::from(bytes))
}

fn apply_headers(headers: &mut HeaderMap, policy: &CachePolicy) {
    if !headers.contains_key(header::CACHE_CONTROL) {
        if let Ok(value) = HeaderValue::from_str(&policy.cache_control()) {
            headers.insert(header::CACHE_CONTROL, value);
        }
    }
    if policy.vary_by_accept {
        headers.insert(header::VARY, HeaderValue::from_static("Accept"));
    }
}

fn replay(hit: CachedResponse) -> Response {
    let CachedResponse {
        status,
        headers: stored,
        body,
    } = hit;
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);
    let headers = response.headers_mut();
    for (name, value) in &stored {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.append(name, value);
        }
    }
    response
}
