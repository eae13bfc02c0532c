use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use moka::notification::RemovalCause;
use moka::sync::Cache;
use moka::Expiry;
use tokio::time::Instant;
use tracing::debug;

/// Tags evicted by an explicit content refresh.
pub const REFRESH_TAGS: [&str; 9] = [
    "sitemap",
    "article-images",
    "rss",
    "home",
    "tips",
    "content",
    "category",
    "tag",
    "static",
];

/// Default byte budget for stored responses.
pub const DEFAULT_OUTPUT_CACHE_BYTES: u64 = 256 * 1024 * 1024;

/// Fixed per-entry cost added to the key and body sizes.
const ENTRY_OVERHEAD: usize = 256;

/// A buffered HTTP response held by the [`OutputCache`].
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl CachedResponse {
    fn weight(&self) -> usize {
        self.body.len()
            + self
                .headers
                .iter()
                .map(|(name, value)| name.len() + value.len())
                .sum::<usize>()
    }
}

#[derive(Debug)]
struct Entry {
    response: CachedResponse,
    tags: Vec<String>,
    ttl: Duration,
    expires_at: Instant,
}

type TagIndex = DashMap<String, HashSet<String>>;

/// Expires each entry after the TTL it was inserted with.
struct PerEntryTtl;

impl Expiry<String, Arc<Entry>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Arc<Entry>,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Response cache keyed by request, with a tag index for group eviction.
///
/// Entries are weighed by key, header and body size and the total is capped
/// at the configured byte budget; least valuable entries are evicted first.
/// The tag index follows every removal, whatever its cause.
///
/// A disabled cache never stores anything, which keeps every request live
/// in development.
pub struct OutputCache {
    enabled: bool,
    entries: Cache<String, Arc<Entry>>,
    by_tag: Arc<TagIndex>,
}

impl std::fmt::Debug for OutputCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputCache")
            .field("enabled", &self.enabled)
            .field("entries", &self.entries.entry_count())
            .field("weighted_bytes", &self.entries.weighted_size())
            .finish_non_exhaustive()
    }
}

impl Default for OutputCache {
    fn default() -> Self {
        Self::new(false)
    }
}

impl OutputCache {
    pub fn new(enabled: bool) -> Self {
        Self::with_capacity(enabled, DEFAULT_OUTPUT_CACHE_BYTES)
    }

    /// A cache holding at most `max_bytes` of weighed responses.
    pub fn with_capacity(enabled: bool, max_bytes: u64) -> Self {
        let by_tag: Arc<TagIndex> = Arc::new(DashMap::new());
        let index = Arc::clone(&by_tag);
        let entries = Cache::builder()
            .max_capacity(max_bytes)
            .weigher(|key: &String, entry: &Arc<Entry>| -> u32 {
                (key.len() + entry.response.weight() + ENTRY_OVERHEAD)
                    .try_into()
                    .unwrap_or(u32::MAX)
            })
            .expire_after(PerEntryTtl)
            .eviction_listener(move |key: Arc<String>, entry: Arc<Entry>, cause| {
                // A replacement is re-indexed by the insert that caused it.
                if cause == RemovalCause::Replaced {
                    return;
                }
                unindex(&index, &key, &entry.tags);
            })
            .build();
        Self {
            enabled,
            entries,
            by_tag,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Live entry for `key`. Expired entries are dropped on access.
    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        let entry = self.entries.get(key)?;
        if Instant::now() >= entry.expires_at {
            self.entries.remove(key);
            return None;
        }
        Some(entry.response.clone())
    }

    /// Store `response` under `key` for `ttl`, indexed by each of `tags`.
    pub fn insert(&self, key: &str, response: CachedResponse, ttl: Duration, tags: &[&str]) {
        if !self.enabled {
            return;
        }
        for tag in tags {
            self.by_tag
                .entry((*tag).to_owned())
                .or_default()
                .insert(key.to_owned());
        }
        self.entries.insert(
            key.to_owned(),
            Arc::new(Entry {
                response,
                tags: tags.iter().map(|t| (*t).to_owned()).collect(),
                ttl,
                expires_at: Instant::now() + ttl,
            }),
        );
    }

    /// Remove every entry carrying any of `tags`. Returns how many entries
    /// were removed.
    pub fn evict_tags(&self, tags: &[&str]) -> usize {
        let mut evicted = 0;
        for tag in tags {
            let Some((_, keys)) = self.by_tag.remove(*tag) else {
                continue;
            };
            for key in keys {
                if self.entries.remove(&key).is_some() {
                    evicted += 1;
                }
            }
        }
        debug!(?tags, evicted, "output cache tags evicted");
        evicted
    }

    /// Number of stored entries after pending evictions are applied.
    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        usize::try_from(self.entries.entry_count()).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total weight of stored entries in bytes.
    pub fn weighted_bytes(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.weighted_size()
    }

    /// Keys currently listed under `tag`.
    pub fn tagged(&self, tag: &str) -> usize {
        self.by_tag.get(tag).map_or(0, |keys| keys.len())
    }
}

fn unindex(index: &TagIndex, key: &str, tags: &[String]) {
    for tag in tags {
        if let Some(mut keys) = index.get_mut(tag) {
            keys.remove(key);
        }
    }
    index.retain(|_, keys| !keys.is_empty());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &'static str) -> CachedResponse {
        CachedResponse {
            status: 200,
            headers: vec![("content-type".into(), "text/html".into())],
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[tokio::test]
    async fn insert_and_get() {
        let cache = OutputCache::new(true);
        cache.insert("/", response("home"), Duration::from_secs(60), &["home"]);
        let hit = cache.get("/").unwrap();
        assert_eq!(hit.status, 200);
        assert_eq!(&hit.body[..], b"home");
        assert!(cache.get("/missing").is_none());
    }

    #[tokio::test]
    async fn disabled_cache_stores_nothing() {
        let cache = OutputCache::new(false);
        cache.insert("/", response("home"), Duration::from_secs(60), &["home"]);
        assert!(cache.get("/").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn evicts_by_tag_only() {
        let cache = OutputCache::new(true);
        let ttl = Duration::from_secs(60);
        cache.insert("/", response("home"), ttl, &["home", "tips", "content"]);
        cache.insert("/tips/a", response("a"), ttl, &["tips", "content"]);
        cache.insert("/about", response("about"), ttl, &["static"]);

        assert_eq!(cache.evict_tags(&["tips"]), 2);
        assert!(cache.get("/").is_none());
        assert!(cache.get("/tips/a").is_none());
        assert!(cache.get("/about").is_some());

        assert_eq!(cache.evict_tags(&["content", "home"]), 0);
        assert_eq!(cache.evict_tags(&REFRESH_TAGS), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire() {
        let cache = OutputCache::new(true);
        cache.insert("/rss", response("feed"), Duration::from_secs(7200), &["rss"]);

        tokio::time::advance(Duration::from_secs(7199)).await;
        assert!(cache.get("/rss").is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("/rss").is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.tagged("rss"), 0);
    }

    #[tokio::test]
    async fn byte_budget_bounds_entries_and_tag_index() {
        let cache = OutputCache::with_capacity(true, 256 * 1024);
        let body = Bytes::from(vec![b'x'; 16 * 1024]);
        let ttl = Duration::from_secs(3 * 24 * 60 * 60);
        for i in 0..500 {
            let page = CachedResponse {
                status: 200,
                headers: Vec::new(),
                body: body.clone(),
            };
            cache.insert(&format!("/tips/x?junk={i}"), page, ttl, &["tips", "content"]);
        }

        let stored = cache.len();
        assert!(stored > 0);
        assert!(stored <= 16, "{stored} entries retained");
        assert!(cache.weighted_bytes() <= 256 * 1024);
        assert_eq!(cache.tagged("tips"), stored);
        assert_eq!(cache.evict_tags(&["tips"]), stored);
        assert!(cache.is_empty());
    }
}
