use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::article::Article;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// In-memory query over the article list.
///
/// Empty filter strings are treated as absent. All comparisons ignore case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub difficulty: Option<String>,
    /// Free text matched against title, description, content and tags.
    pub search: Option<String>,
    /// 1-indexed. Anything below 1 is treated as 1.
    pub page: i64,
    pub page_size: i64,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            category: None,
            tag: None,
            difficulty: None,
            search: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchRequest {
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = Some(difficulty.into());
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: i64, page_size: i64) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    fn matches(&self, article: &Article) -> bool {
        if let Some(category) = non_empty(self.category.as_deref())
            && !article.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if let Some(tag) = non_empty(self.tag.as_deref())
            && !article.has_tag(tag)
        {
            return false;
        }
        if let Some(difficulty) = non_empty(self.difficulty.as_deref())
            && !article.difficulty.eq_ignore_ascii_case(difficulty)
        {
            return false;
        }
        if let Some(text) = non_empty(self.search.as_deref()) {
            let needle = text.to_lowercase();
            let hit = article.title.to_lowercase().contains(&needle)
                || article.description.to_lowercase().contains(&needle)
                || article.content.to_lowercase().contains(&needle)
                || article
                    .tags
                    .iter()
                    .any(|t| t.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// One page of search hits plus totals for pagination.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub articles: Vec<Article>,
    pub total_count: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

impl SearchResult {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Newest first by published date. Ties keep their relative order.
pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.published_date.cmp(&a.published_date));
}

/// Filter, sort and page `articles`.
pub fn search(articles: &[Article], request: &SearchRequest) -> SearchResult {
    let mut hits: Vec<Article> = articles
        .iter()
        .filter(|a| request.matches(a))
        .cloned()
        .collect();
    sort_newest_first(&mut hits);

    let total_count = hits.len();
    let page = usize::try_from(request.page.max(1)).unwrap_or(1);
    let page_size = usize::try_from(request.page_size.clamp(1, MAX_PAGE_SIZE)).unwrap_or(1);
    let total_pages = total_count.div_ceil(page_size);

    let articles = hits
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect();

    SearchResult {
        articles,
        total_count,
        page,
        page_size,
        total_pages,
    }
}

/// Distinct, non-empty categories in sorted order.
pub fn categories(articles: &[Article]) -> Vec<String> {
    articles
        .iter()
        .map(|a| a.category.as_str())
        .filter(|c| !c.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

/// Distinct, non-empty tags in sorted order.
pub fn tags(articles: &[Article]) -> Vec<String> {
    articles
        .iter()
        .flat_map(|a| a.tags.iter().map(String::as_str))
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

/// Additive relatedness score of `candidate` with respect to `current`.
///
/// +10 same category, +5 per distinct shared tag, +3 same difficulty,
/// +2 same author. Every comparison ignores case.
pub fn relatedness(current: &Article, candidate: &Article) -> u32 {
    let mut score = 0;
    if same_text(&candidate.category, &current.category) {
        score += 10;
    }
    let mine = folded_tags(current);
    let shared = folded_tags(candidate).intersection(&mine).count();
    score += 5 * u32::try_from(shared).unwrap_or(u32::MAX / 5);
    if same_text(&candidate.difficulty, &current.difficulty) {
        score += 3;
    }
    if same_text(&candidate.author, &current.author) {
        score += 2;
    }
    score
}

fn same_text(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn folded_tags(article: &Article) -> BTreeSet<String> {
    article.tags.iter().map(|t| t.to_lowercase()).collect()
}

/// Up to `count` articles related to `article`, best match first.
///
/// The article itself and anything scoring zero are excluded.
pub fn related(article: &Article, articles: &[Article], count: usize) -> Vec<Article> {
    let mut scored: Vec<(u32, &Article)> = articles
        .iter()
        .filter(|a| !a.url_slug.eq_ignore_ascii_case(&article.url_slug))
        .map(|a| (relatedness(article, a), a))
        .filter(|(score, _)| *score > 0)
        .collect();
    scored.sort_by(|x, y| y.0.cmp(&x.0));
    scored
        .into_iter()
        .take(count)
        .map(|(_, a)| a.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::article::tests::article;

    fn dated(slug: &str, days_ago: i64) -> Article {
        let mut a = article(slug, "Tips", &[]);
        a.published_date = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() - Duration::days(days_ago);
        a
    }

    #[test]
    fn tag_filter_is_conjunctive_with_category() {
        let both = article("both", "Tips", &["a", "b"]);
        let only_a = article("only-a", "Tools", &["a"]);
        let all = vec![both, only_a];

        let by_tag = search(&all, &SearchRequest::default().with_tag("a"));
        assert_eq!(by_tag.total_count, 2);

        let by_both = search(
            &all,
            &SearchRequest::default().with_tag("a").with_category("tips"),
        );
        assert_eq!(by_both.total_count, 1);
        assert_eq!(by_both.articles[0].url_slug, "both");
    }

    #[test]
    fn text_search_covers_tags_and_body() {
        let mut a = article("a", "Tips", &["Agents"]);
        a.content = "Use the inline chat".into();
        let b = article("b", "Tips", &[]);
        let all = vec![a, b];

        assert_eq!(
            search(&all, &SearchRequest::default().with_search("AGENT")).total_count,
            1
        );
        assert_eq!(
            search(&all, &SearchRequest::default().with_search("inline")).total_count,
            1
        );
    }

    #[test]
    fn empty_filters_are_ignored() {
        let all = vec![article("a", "Tips", &[])];
        let req = SearchRequest::default().with_category("").with_tag("  ");
        assert_eq!(search(&all, &req).total_count, 1);
    }

    #[test]
    fn pages_are_stable_and_disjoint() {
        let all: Vec<Article> = (0..30).map(|i| dated(&format!("t{i}"), i)).collect();

        let first = search(&all, &SearchRequest::default().with_page(1, 12));
        let second = search(&all, &SearchRequest::default().with_page(2, 12));
        let third = search(&all, &SearchRequest::default().with_page(3, 12));

        let slugs = |r: &SearchResult| -> Vec<String> {
            r.articles.iter().map(|a| a.url_slug.clone()).collect()
        };
        let expected_first: Vec<String> = (0..12).map(|i| format!("t{i}")).collect();
        let expected_second: Vec<String> = (12..24).map(|i| format!("t{i}")).collect();

        assert_eq!(slugs(&first), expected_first);
        assert_eq!(slugs(&second), expected_second);
        assert_eq!(third.articles.len(), 6);
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next());
        assert!(!first.has_previous());
        assert!(!third.has_next());
    }

    #[test]
    fn non_positive_page_is_clamped() {
        let all: Vec<Article> = (0..3).map(|i| dated(&format!("t{i}"), i)).collect();
        let result = search(&all, &SearchRequest::default().with_page(-4, 2));
        assert_eq!(result.page, 1);
        assert_eq!(result.articles[0].url_slug, "t0");
    }

    #[test]
    fn distinct_sorted_categories_and_tags() {
        let all = vec![
            article("a", "Tools", &["z", "a"]),
            article("b", "", &["a", ""]),
            article("c", "Tips", &[]),
        ];
        assert_eq!(categories(&all), vec!["Tips", "Tools"]);
        assert_eq!(tags(&all), vec!["a", "z"]);
    }

    #[test]
    fn relatedness_weights() {
        let mut a = article("a", "Tips", &["x", "y", "z"]);
        let mut b = article("b", "Tips", &["X", "y"]);
        a.author = "Jawn".into();
        b.author = "Jawn".into();
        a.difficulty = "Beginner".into();
        b.difficulty = "Advanced".into();
        assert_eq!(relatedness(&a, &b), 22);
    }

    #[test]
    fn relatedness_ignores_case_and_duplicate_tags() {
        let mut a = article("a", "GitHub Copilot", &["Chat", "chat", "Agents"]);
        a.difficulty = "Beginner".into();
        a.author = "Jeff Fritz".into();
        let mut b = article("b", "github copilot", &["CHAT", "chat"]);
        b.difficulty = "beginner".into();
        b.author = "jeff fritz".into();

        // 10 category + 5 for the one distinct shared tag + 3 + 2
        assert_eq!(relatedness(&a, &b), 20);
        assert_eq!(relatedness(&b, &a), 20);

        let all = vec![a.clone(), b];
        let result = related(&a, &all, 3);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].url_slug, "b");
    }

    #[test]
    fn related_excludes_self_and_zero_scores() {
        let mut me = article("me", "Tips", &["x"]);
        me.difficulty = "Beginner".into();
        me.author = "A".into();
        let mut same_cat = article("cat", "Tips", &[]);
        same_cat.difficulty = "Advanced".into();
        same_cat.author = "B".into();
        let mut tag_and_cat = article("both", "Tips", &["x"]);
        tag_and_cat.difficulty = "Advanced".into();
        tag_and_cat.author = "B".into();
        let mut unrelated = article("none", "Tools", &[]);
        unrelated.difficulty = "Advanced".into();
        unrelated.author = "B".into();

        let all = vec![me.clone(), same_cat, tag_and_cat, unrelated];
        let result = related(&me, &all, 3);
        let slugs: Vec<&str> = result.iter().map(|a| a.url_slug.as_str()).collect();
        assert_eq!(slugs, vec!["both", "cat"]);
    }
}
