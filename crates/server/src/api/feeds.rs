//! `sitemap.xml` and the RSS feed.

use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use chrono::{Datelike, Utc};
use jawn_core::Article;
use minijinja::context;
use serde::Serialize;

use super::AppState;
use super::redirect::base_url;
use crate::error::ServerError;
use crate::templates::SITE_NAME;
use crate::views::{article_url, category_url, tag_url};

const FEED_ITEMS: usize = 15;
const FEED_TITLE: &str = "Copilot That Jawn - Latest Tips";
const FEED_DESCRIPTION: &str = "Where Philly innovation meets AI excellence. Master Microsoft \
                                Copilot and GitHub Copilot with our expert-curated tips and tricks.";

#[derive(Debug, Serialize)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
    pub changefreq: &'static str,
    pub priority: &'static str,
}

impl SitemapEntry {
    fn new(loc: String, changefreq: &'static str, priority: &'static str) -> Self {
        Self {
            loc,
            lastmod: None,
            changefreq,
            priority,
        }
    }
}

/// Every public URL with its crawl hints.
pub fn sitemap_entries(
    base: &str,
    articles: &[Article],
    categories: &[String],
    tags: &[String],
) -> Vec<SitemapEntry> {
    let mut entries = vec![
        SitemapEntry {
            lastmod: Some(Utc::now().format("%Y-%m-%d").to_string()),
            ..SitemapEntry::new(format!("{base}/"), "weekly", "1.0")
        },
        SitemapEntry::new(format!("{base}/privacy"), "monthly", "0.8"),
        SitemapEntry::new(format!("{base}/contribute"), "monthly", "0.8"),
        SitemapEntry::new(format!("{base}/tips"), "daily", "0.9"),
    ];
    entries.extend(articles.iter().map(|a| SitemapEntry {
        lastmod: Some(a.last_modified.format("%Y-%m-%d").to_string()),
        ..SitemapEntry::new(
            format!("{base}{}", article_url(&a.url_slug)),
            "monthly",
            "0.7",
        )
    }));
    entries.extend(categories.iter().map(|c| {
        SitemapEntry::new(format!("{base}{}", category_url(c)), "weekly", "0.6")
    }));
    entries.extend(
        tags.iter()
            .map(|t| SitemapEntry::new(format!("{base}{}", tag_url(t)), "weekly", "0.6")),
    );
    entries
}

pub async fn sitemap(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let articles = state.content.list().await?;
    let categories = state.content.categories().await?;
    let tags = state.content.tags().await?;
    let base = base_url(state.config.server.public_url.as_deref(), &headers);

    let entries = sitemap_entries(&base, &articles, &categories, &tags);
    let xml = state.templates.render("sitemap.xml", context! { entries })?;
    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml).into_response())
}

#[derive(Debug, Serialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: String,
    pub categories: Vec<String>,
}

/// The most recently modified articles, newest first.
pub fn feed_items(base: &str, articles: &[Article]) -> Vec<FeedItem> {
    let mut recent: Vec<&Article> = articles.iter().collect();
    recent.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
    recent
        .into_iter()
        .take(FEED_ITEMS)
        .map(|a| FeedItem {
            title: a.title.clone(),
            link: format!("{base}{}", article_url(&a.url_slug)),
            description: a.description.clone(),
            pub_date: a.last_modified.to_rfc2822(),
            categories: a.tags.clone(),
        })
        .collect()
}

/// Browsers asking for HTML get `text/xml` so the stylesheet renders the
/// feed. Feed readers get `application/rss+xml`.
pub fn feed_content_type(headers: &HeaderMap) -> &'static str {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if accept.contains("text/html") || accept.contains("*/*") {
        "text/xml; charset=utf-8"
    } else {
        "application/rss+xml; charset=utf-8"
    }
}

pub async fn rss(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let articles = state.content.list().await?;
    let base = base_url(state.config.server.public_url.as_deref(), &headers);
    let now = Utc::now();

    let channel = context! {
        title => FEED_TITLE,
        link => &base,
        description => FEED_DESCRIPTION,
        copyright => format!("Copyright {} {SITE_NAME}", now.year()),
        last_build_date => now.to_rfc2822(),
        generator => SITE_NAME,
    };
    let items = feed_items(&base, &articles);
    let xml = state
        .templates
        .render("feed.rss.xml", context! { channel, items })?;
    Ok(([(header::CONTENT_TYPE, feed_content_type(&headers))], xml).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use chrono::{Duration, TimeZone};

    use super::*;

    fn article(slug: &str, days: i64) -> Article {
        let date = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::days(days);
        Article {
            title: slug.into(),
            category: "Tips".into(),
            tags: vec!["a".into(), "b".into()],
            difficulty: String::new(),
            author: String::new(),
            published_date: date,
            last_modified: date,
            description: format!("about {slug}"),
            content: String::new(),
            html: String::new(),
            file_name: format!("{slug}.md"),
            url_slug: slug.into(),
            images: Vec::new(),
            content_hash: String::new(),
        }
    }

    #[test]
    fn sitemap_lists_pages_articles_categories_and_tags() {
        let entries = sitemap_entries(
            "https://example.com",
            &[article("first", 0)],
            &["GitHub Copilot".into()],
            &["vs code".into()],
        );
        let locs: Vec<_> = entries.iter().map(|e| e.loc.as_str()).collect();
        assert_eq!(
            locs,
            [
                "https://example.com/",
                "https://example.com/privacy",
                "https://example.com/contribute",
                "https://example.com/tips",
                "https://example.com/tips/first",
                "https://example.com/tips/category/github%20copilot",
                "https://example.com/tips/tag/vs%20code",
            ]
        );
        assert_eq!(entries[0].priority, "1.0");
        assert!(entries[0].lastmod.is_some());
        assert_eq!(entries[3].changefreq, "daily");
        assert_eq!(entries[4].lastmod.as_deref(), Some("2025-01-01"));
        assert_eq!(entries[4].priority, "0.7");
        assert_eq!(entries[6].priority, "0.6");
    }

    #[test]
    fn feed_keeps_fifteen_most_recent() {
        let articles: Vec<_> = (0..20).map(|i| article(&format!("tip-{i}"), i)).collect();
        let items = feed_items("https://example.com", &articles);
        assert_eq!(items.len(), 15);
        assert_eq!(items[0].title, "tip-19");
        assert_eq!(items[14].title, "tip-5");
        assert_eq!(items[0].link, "https://example.com/tips/tip-19");
        assert_eq!(items[0].categories, ["a", "b"]);
        assert!(items[0].pub_date.ends_with("+0000"));
    }

    #[test]
    fn feed_dates_items_by_last_modification() {
        let mut edited = article("edited", 0);
        edited.last_modified = Utc.with_ymd_and_hms(2025, 3, 14, 5, 6, 7).unwrap();
        let items = feed_items("https://example.com", &[edited]);
        assert_eq!(items[0].pub_date, "Fri, 14 Mar 2025 05:06:07 +0000");
    }

    #[test]
    fn content_type_depends_on_accept() {
        let mut headers = HeaderMap::new();
        assert_eq!(feed_content_type(&headers), "application/rss+xml; charset=utf-8");

        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml"));
        assert_eq!(feed_content_type(&headers), "text/xml; charset=utf-8");

        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        assert_eq!(feed_content_type(&headers), "text/xml; charset=utf-8");

        headers.insert(header::ACCEPT, HeaderValue::from_static("application/rss+xml"));
        assert_eq!(feed_content_type(&headers), "application/rss+xml; charset=utf-8");
    }
}
