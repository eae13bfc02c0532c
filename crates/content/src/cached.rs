use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jawn_core::{Article, SearchRequest, SearchResult};
use jawn_images::ImageUrls;
use jawn_markdown::{ImageResolver, render_markdown};
use jawn_state::{CacheKey, ContentTable, DistributedCache};
use moka::future::Cache;
use tracing::{debug, info, instrument, warn};

use crate::error::ContentError;
use crate::output_cache::{OutputCache, REFRESH_TAGS};
use crate::service::ContentService;

/// Expiry windows for the two cache tiers.
#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    pub local_ttl: Duration,
    pub distributed_ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            local_ttl: Duration::from_secs(5 * 60),
            distributed_ttl: Duration::from_secs(6 * 60 * 60),
        }
    }
}

/// [`ContentService`] reading through a local `moka` tier and a distributed
/// cache to the table store.
///
/// The whole article list is cached under a single key. Markdown is rendered
/// once per table scan and the HTML travels with the cached list.
pub struct CachedContentService {
    table: Arc<dyn ContentTable>,
    distributed: Arc<dyn DistributedCache>,
    local: Cache<String, Arc<Vec<Article>>>,
    output_cache: Arc<OutputCache>,
    urls: ImageUrls,
    settings: CacheSettings,
}

impl std::fmt::Debug for CachedContentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedContentService")
            .field("settings", &self.settings)
            .field("urls", &self.urls)
            .finish_non_exhaustive()
    }
}

impl CachedContentService {
    pub fn new(
        table: Arc<dyn ContentTable>,
        distributed: Arc<dyn DistributedCache>,
        output_cache: Arc<OutputCache>,
        urls: ImageUrls,
        settings: CacheSettings,
    ) -> Self {
        let local = Cache::builder()
            .max_capacity(4)
            .time_to_live(settings.local_ttl)
            .build();
        Self {
            table,
            distributed,
            local,
            output_cache,
            urls,
            settings,
        }
    }

    fn key() -> CacheKey {
        CacheKey::content_tips()
    }

    /// Fetch the article list, filling whichever tiers missed.
    async fn load(&self) -> Result<Arc<Vec<Article>>, ContentError> {
        let key = Self::key();
        if let Some(articles) = self.local.get(key.canonical()).await {
            return Ok(articles);
        }

        if let Some(articles) = self.read_distributed(&key).await {
            let articles = Arc::new(articles);
            self.local
                .insert(key.canonical().to_owned(), Arc::clone(&articles))
                .await;
            return Ok(articles);
        }

        let articles = Arc::new(self.scan().await?);
        if let Err(e) = self.write_distributed(&key, &articles).await {
            warn!(error = %e, "failed to populate distributed cache");
        }
        self.local
            .insert(key.canonical().to_owned(), Arc::clone(&articles))
            .await;
        Ok(articles)
    }

    /// Distributed-tier lookup. Backend errors and corrupt payloads count as
    /// a miss.
    async fn read_distributed(&self, key: &CacheKey) -> Option<Vec<Article>> {
        let payload = match self.distributed.get(key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "distributed cache read failed, falling back to table scan");
                return None;
            }
        };
        match serde_json::from_str::<Vec<Article>>(&payload) {
            Ok(articles) => {
                debug!(count = articles.len(), "distributed cache hit");
                Some(articles)
            }
            Err(e) => {
                warn!(error = %e, "corrupt distributed cache payload, falling back to table scan");
                None
            }
        }
    }

    async fn write_distributed(
        &self,
        key: &CacheKey,
        articles: &[Article],
    ) -> Result<(), ContentError> {
        let payload = serde_json::to_string(articles)
            .map_err(|e| ContentError::Serialization(e.to_string()))?;
        self.distributed
            .set(key, &payload, Some(self.settings.distributed_ttl))
            .await?;
        Ok(())
    }

    /// Full table scan, converting and rendering every row. Rows that fail
    /// to convert are skipped.
    #[instrument(skip(self))]
    async fn scan(&self) -> Result<Vec<Article>, ContentError> {
        let rows = self.table.scan().await?;
        let total = rows.len();
        let mut articles = Vec::with_capacity(total);
        for row in rows {
            let row_key = row.row_key.clone();
            match row.into_article() {
                Ok(mut article) => {
                    article.html = self.render(&article);
                    articles.push(article);
                }
                Err(e) => warn!(row_key = %row_key, error = %e, "skipping unreadable content row"),
            }
        }
        jawn_core::sort_newest_first(&mut articles);
        info!(count = articles.len(), skipped = total - articles.len(), "content loaded from table store");
        Ok(articles)
    }

    fn render(&self, article: &Article) -> String {
        let urls = &self.urls;
        let resolver =
            ImageResolver::new(&article.images).with_url_builder(move |id, size| urls.url(id, size));
        render_markdown(&article.content, &resolver)
    }
}

#[async_trait]
impl ContentService for CachedContentService {
    async fn list(&self) -> Result<Vec<Article>, ContentError> {
        Ok(self.load().await?.as_ref().clone())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>, ContentError> {
        let articles = self.load().await?;
        Ok(articles
            .iter()
            .find(|a| a.url_slug.eq_ignore_ascii_case(slug))
            .cloned())
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResult, ContentError> {
        let articles = self.load().await?;
        Ok(jawn_core::search(&articles, request))
    }

    async fn categories(&self) -> Result<Vec<String>, ContentError> {
        Ok(jawn_core::categories(&self.load().await?))
    }

    async fn tags(&self) -> Result<Vec<String>, ContentError> {
        Ok(jawn_core::tags(&self.load().await?))
    }

    async fn related(&self, article: &Article, count: usize) -> Result<Vec<Article>, ContentError> {
        Ok(jawn_core::related(article, &self.load().await?, count))
    }

    #[instrument(skip(self))]
    async fn refresh(&self) -> Result<(), ContentError> {
        let key = Self::key();
        let articles = Arc::new(self.scan().await?);
        self.write_distributed(&key, &articles).await?;
        self.local
            .insert(key.canonical().to_owned(), Arc::clone(&articles))
            .await;
        let evicted = self.output_cache.evict_tags(&REFRESH_TAGS);
        info!(count = articles.len(), evicted, "content cache refreshed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate(&self) {
        let key = Self::key();
        self.local.invalidate(key.canonical()).await;
        if let Err(e) = self.distributed.delete(&key).await {
            warn!(error = %e, "failed to clear distributed cache");
        }
        self.output_cache.evict_tags(&["tips", "content"]);
        info!("content cache invalidated");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use chrono::{TimeZone, Utc};
    use jawn_state::{ContentEntity, StateError};
    use jawn_state_memory::{MemoryContentTable, MemoryDistributedCache};

    use super::*;
    use crate::output_cache::CachedResponse;

    /// Table wrapper counting full scans.
    #[derive(Default)]
    struct CountingTable {
        inner: MemoryContentTable,
        scans: AtomicUsize,
    }

    #[async_trait]
    impl ContentTable for CountingTable {
        async fn ensure_table(&self) -> Result<(), StateError> {
            self.inner.ensure_table().await
        }
        async fn get(&self, pk: &str, rk: &str) -> Result<Option<ContentEntity>, StateError> {
            self.inner.get(pk, rk).await
        }
        async fn upsert(&self, entity: &ContentEntity) -> Result<(), StateError> {
            self.inner.upsert(entity).await
        }
        async fn scan(&self) -> Result<Vec<ContentEntity>, StateError> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            self.inner.scan().await
        }
    }

    /// Distributed cache whose every call fails.
    struct BrokenCache;

    #[async_trait]
    impl DistributedCache for BrokenCache {
        async fn get(&self, _: &CacheKey) -> Result<Option<String>, StateError> {
            Err(StateError::Connection("refused".into()))
        }
        async fn set(&self, _: &CacheKey, _: &str, _: Option<Duration>) -> Result<(), StateError> {
            Err(StateError::Connection("refused".into()))
        }
        async fn delete(&self, _: &CacheKey) -> Result<bool, StateError> {
            Err(StateError::Connection("refused".into()))
        }
    }

    /// Table whose scan always fails.
    struct DownTable;

    #[async_trait]
    impl ContentTable for DownTable {
        async fn ensure_table(&self) -> Result<(), StateError> {
            Ok(())
        }
        async fn get(&self, _: &str, _: &str) -> Result<Option<ContentEntity>, StateError> {
            Ok(None)
        }
        async fn upsert(&self, _: &ContentEntity) -> Result<(), StateError> {
            Ok(())
        }
        async fn scan(&self) -> Result<Vec<ContentEntity>, StateError> {
            Err(StateError::Backend("table offline".into()))
        }
    }

    fn entity(slug: &str, category: &str, tags: &str, day: u32) -> ContentEntity {
        ContentEntity {
            partition_key: category.to_lowercase(),
            row_key: slug.into(),
            title: slug.into(),
            category: category.into(),
            tags: tags.into(),
            difficulty: "Beginner".into(),
            author: "Jawn".into(),
            published_date: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            content: "Hello".into(),
            file_name: format!("{slug}.md"),
            slug: slug.into(),
            ..ContentEntity::default()
        }
    }

    async fn seeded_table() -> Arc<CountingTable> {
        let table = Arc::new(CountingTable::default());
        table.upsert(&entity("older", "Tips", "a,b", 1)).await.unwrap();
        table.upsert(&entity("newer", "GitHub Copilot", "a", 2)).await.unwrap();
        table
    }

    fn service(
        table: Arc<dyn ContentTable>,
        distributed: Arc<dyn DistributedCache>,
        output: Arc<OutputCache>,
    ) -> CachedContentService {
        CachedContentService::new(
            table,
            distributed,
            output,
            ImageUrls::new(None, "content-images"),
            CacheSettings::default(),
        )
    }

    #[tokio::test]
    async fn cold_read_scans_once_and_fills_both_tiers() {
        let table = seeded_table().await;
        let distributed = Arc::new(MemoryDistributedCache::new());
        let svc = service(table.clone(), distributed.clone(), Arc::new(OutputCache::new(true)));

        let first = svc.list().await.unwrap();
        let second = svc.list().await.unwrap();

        assert_eq!(table.scans.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(first[0].url_slug, "newer", "newest first");
        assert!(first[0].html.contains("<p>Hello</p>"));
        assert!(
            distributed
                .get(&CacheKey::content_tips())
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn distributed_hit_skips_table_scan() {
        let table = seeded_table().await;
        let distributed = Arc::new(MemoryDistributedCache::new());
        let warm = service(table.clone(), distributed.clone(), Arc::new(OutputCache::new(true)));
        warm.list().await.unwrap();

        let cold_local = service(table.clone(), distributed, Arc::new(OutputCache::new(true)));
        let articles = cold_local.list().await.unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(table.scans.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn corrupt_payload_falls_back_to_scan() {
        let table = seeded_table().await;
        let distributed = Arc::new(MemoryDistributedCache::new());
        distributed
            .set(&CacheKey::content_tips(), "{not json", None)
            .await
            .unwrap();
        let svc = service(table.clone(), distributed.clone(), Arc::new(OutputCache::new(true)));

        let articles = svc.list().await.unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(table.scans.load(Ordering::SeqCst), 1);
        let repaired = distributed.get(&CacheKey::content_tips()).await.unwrap().unwrap();
        assert!(serde_json::from_str::<Vec<Article>>(&repaired).is_ok());
    }

    #[tokio::test]
    async fn unavailable_distributed_cache_degrades_to_scan() {
        let table = seeded_table().await;
        let svc = service(table.clone(), Arc::new(BrokenCache), Arc::new(OutputCache::new(true)));

        assert_eq!(svc.list().await.unwrap().len(), 2);
        assert_eq!(svc.categories().await.unwrap(), vec!["GitHub Copilot", "Tips"]);
        assert_eq!(table.scans.load(Ordering::SeqCst), 1, "local tier still serves");
    }

    #[tokio::test]
    async fn table_failure_propagates() {
        let svc = service(
            Arc::new(DownTable),
            Arc::new(MemoryDistributedCache::new()),
            Arc::new(OutputCache::new(true)),
        );
        assert!(matches!(svc.list().await, Err(ContentError::Store(_))));
        assert!(svc.refresh().await.is_err());
    }

    #[tokio::test]
    async fn unreadable_rows_are_skipped() {
        let table = seeded_table().await;
        let mut bad = entity("bad", "Tips", "", 3);
        bad.images = "{broken".into();
        table.upsert(&bad).await.unwrap();
        let svc = service(table, Arc::new(MemoryDistributedCache::new()), Arc::new(OutputCache::new(true)));

        let slugs: Vec<String> = svc.list().await.unwrap().into_iter().map(|a| a.url_slug).collect();
        assert_eq!(slugs, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn queries_work_on_cached_list() {
        let table = seeded_table().await;
        let svc = service(table, Arc::new(MemoryDistributedCache::new()), Arc::new(OutputCache::new(true)));

        let found = svc.get_by_slug("NEWER").await.unwrap().unwrap();
        assert_eq!(found.url_slug, "newer");
        assert!(svc.get_by_slug("nope").await.unwrap().is_none());
        assert_eq!(svc.tags().await.unwrap(), vec!["a", "b"]);

        let result = svc
            .search(&SearchRequest::default().with_tag("b"))
            .await
            .unwrap();
        assert_eq!(result.total_count, 1);

        let related = svc.related(&found, 3).await.unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].url_slug, "older");
    }

    #[tokio::test]
    async fn refresh_rescans_and_evicts_output_cache() {
        let table = seeded_table().await;
        let output = Arc::new(OutputCache::new(true));
        let svc = service(table.clone(), Arc::new(MemoryDistributedCache::new()), output.clone());
        svc.list().await.unwrap();

        let page = CachedResponse {
            status: 200,
            headers: Vec::new(),
            body: Bytes::from_static(b"cached"),
        };
        output.insert("/", page.clone(), Duration::from_secs(60), &["home", "tips"]);
        output.insert("/sitemap.xml", page, Duration::from_secs(60), &["sitemap"]);

        table.upsert(&entity("newest", "Tips", "c", 3)).await.unwrap();
        assert_eq!(svc.list().await.unwrap().len(), 2, "stale until refresh");

        svc.refresh().await.unwrap();

        assert_eq!(table.scans.load(Ordering::SeqCst), 2);
        assert_eq!(svc.list().await.unwrap()[0].url_slug, "newest");
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn invalidate_clears_tiers_and_swallows_errors() {
        let table = seeded_table().await;
        let output = Arc::new(OutputCache::new(true));
        let svc = service(table.clone(), Arc::new(BrokenCache), output.clone());
        svc.list().await.unwrap();
        output.insert(
            "/tips/older",
            CachedResponse {
                status: 200,
                headers: Vec::new(),
                body: Bytes::new(),
            },
            Duration::from_secs(60),
            &["tips", "content"],
        );

        svc.invalidate().await;
        svc.list().await.unwrap();

        assert_eq!(table.scans.load(Ordering::SeqCst), 2);
        assert!(output.get("/tips/older").is_none());
    }
}
