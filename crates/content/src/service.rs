use async_trait::async_trait;
use jawn_core::{Article, SearchRequest, SearchResult};

use crate::error::ContentError;

/// Read access to the article set, plus cache control.
///
/// Every query works on the fully materialized list; implementations decide
/// where that list comes from.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// All articles, newest published first.
    async fn list(&self) -> Result<Vec<Article>, ContentError>;

    /// Case-insensitive slug lookup.
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>, ContentError>;

    async fn search(&self, request: &SearchRequest) -> Result<SearchResult, ContentError>;

    /// Distinct non-empty categories, sorted.
    async fn categories(&self) -> Result<Vec<String>, ContentError>;

    /// Distinct non-empty tags, sorted.
    async fn tags(&self) -> Result<Vec<String>, ContentError>;

    /// Up to `count` articles ranked by relatedness to `article`.
    async fn related(&self, article: &Article, count: usize) -> Result<Vec<Article>, ContentError>;

    /// Rescan the table store, repopulate every cache tier and evict output
    /// cache entries for content routes.
    async fn refresh(&self) -> Result<(), ContentError>;

    /// Drop both cache tiers. Failures are logged, never returned.
    async fn invalidate(&self);
}
