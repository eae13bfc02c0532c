//! Serializable page models handed to the templates.

use jawn_core::{Article, SearchResult};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

/// Characters left alone when encoding a path segment or query value.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode `value` for use as a single path segment or query value.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

pub fn category_url(category: &str) -> String {
    format!("/tips/category/{}", encode_component(&category.to_lowercase()))
}

pub fn tag_url(tag: &str) -> String {
    format!("/tips/tag/{}", encode_component(&tag.to_lowercase()))
}

pub fn article_url(slug: &str) -> String {
    format!("/tips/{}", encode_component(slug))
}

#[derive(Debug, Clone, Serialize)]
pub struct Link {
    pub name: String,
    pub url: String,
}

impl Link {
    pub fn category(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            url: category_url(name),
        }
    }

    pub fn tag(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            url: tag_url(name),
        }
    }
}

/// An article as shown in listings.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleCard {
    pub title: String,
    pub url: String,
    pub category: Link,
    pub tags: Vec<Link>,
    pub difficulty: String,
    pub author: String,
    pub description: String,
    /// Display date, e.g. `March 4, 2025`.
    pub published: String,
    pub published_iso: String,
    pub reading_time_minutes: usize,
}

impl From<&Article> for ArticleCard {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            url: article_url(&article.url_slug),
            category: Link::category(&article.category),
            tags: article.tags.iter().map(|t| Link::tag(t)).collect(),
            difficulty: article.difficulty.clone(),
            author: article.author.clone(),
            description: article.description.clone(),
            published: article.published_date.format("%B %-d, %Y").to_string(),
            published_iso: article.published_date.to_rfc3339(),
            reading_time_minutes: article.reading_time_minutes(),
        }
    }
}

pub fn cards(articles: &[Article]) -> Vec<ArticleCard> {
    articles.iter().map(ArticleCard::from).collect()
}

/// A full article page.
#[derive(Debug, Serialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub card: ArticleCard,
    /// Rendered body. Trusted: it comes from our own Markdown renderer.
    pub html: String,
    pub last_modified: String,
}

impl From<&Article> for ArticleDetail {
    fn from(article: &Article) -> Self {
        Self {
            card: ArticleCard::from(article),
            html: article.html.clone(),
            last_modified: article.last_modified.format("%B %-d, %Y").to_string(),
        }
    }
}

/// Previous/next links for a paged listing.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub total_pages: usize,
    pub total_count: usize,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
}

impl Pagination {
    /// Links under `base`, carrying the non-empty `filters` as query
    /// parameters alongside `page`.
    pub fn new(result: &SearchResult, base: &str, filters: &[(&str, Option<&str>)]) -> Self {
        let link = |page: usize| {
            let mut query: Vec<String> = filters
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .filter(|v| !v.is_empty())
                        .map(|v| format!("{name}={}", encode_component(v)))
                })
                .collect();
            query.push(format!("page={page}"));
            format!("{base}?{}", query.join("&"))
        };
        Self {
            page: result.page,
            total_pages: result.total_pages,
            total_count: result.total_count,
            previous_url: result.has_previous().then(|| link(result.page - 1)),
            next_url: result.has_next().then(|| link(result.page + 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn article() -> Article {
        let date = Utc.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap();
        Article {
            title: "Use Copilot Chat".into(),
            category: "GitHub Copilot".into(),
            tags: vec!["chat".into(), "VS Code".into()],
            difficulty: "Beginner".into(),
            author: "Jawn".into(),
            published_date: date,
            last_modified: date,
            description: "Ask questions in the editor.".into(),
            content: "Hello".into(),
            html: "<p>Hello</p>".into(),
            file_name: "chat.md".into(),
            url_slug: "use-copilot-chat".into(),
            images: Vec::new(),
            content_hash: String::new(),
        }
    }

    #[test]
    fn urls_are_lowercase_and_encoded() {
        assert_eq!(category_url("GitHub Copilot"), "/tips/category/github%20copilot");
        assert_eq!(tag_url("C#"), "/tips/tag/c%23");
        assert_eq!(article_url("use-copilot-chat"), "/tips/use-copilot-chat");
    }

    #[test]
    fn card_formats_dates_and_links() {
        let card = ArticleCard::from(&article());
        assert_eq!(card.published, "March 4, 2025");
        assert_eq!(card.url, "/tips/use-copilot-chat");
        assert_eq!(card.category.url, "/tips/category/github%20copilot");
        assert_eq!(card.tags[1].url, "/tips/tag/vs%20code");
        assert_eq!(card.tags[1].name, "VS Code");
        assert_eq!(card.reading_time_minutes, 1);
    }

    #[test]
    fn pagination_keeps_filters() {
        let result = SearchResult {
            articles: Vec::new(),
            total_count: 30,
            page: 2,
            page_size: 12,
            total_pages: 3,
        };
        let pagination = Pagination::new(
            &result,
            "/tips",
            &[("category", Some("Tips & Tricks")), ("tag", None), ("search", Some(""))],
        );
        assert_eq!(
            pagination.previous_url.as_deref(),
            Some("/tips?category=Tips%20%26%20Tricks&page=1")
        );
        assert_eq!(
            pagination.next_url.as_deref(),
            Some("/tips?category=Tips%20%26%20Tricks&page=3")
        );
    }

    #[test]
    fn single_page_has_no_links() {
        let result = SearchResult {
            articles: Vec::new(),
            total_count: 3,
            page: 1,
            page_size: 12,
            total_pages: 1,
        };
        let pagination = Pagination::new(&result, "/tips", &[]);
        assert!(pagination.previous_url.is_none());
        assert!(pagination.next_url.is_none());
    }
}
