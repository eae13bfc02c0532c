//! Server-rendered HTML pages.

use axum::extract::{Path, Query, RawQuery, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use jawn_core::{Article, SearchRequest};
use minijinja::context;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AppState;
use crate::error::ServerError;
use crate::views::{ArticleCard, ArticleDetail, Link, Pagination, cards, category_url, tag_url};

const PAGE_SIZE: i64 = 12;
const RECENT_COUNT: usize = 6;
const RELATED_COUNT: usize = 3;

/// Filters accepted by the tips index.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TipsQuery {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub difficulty: Option<String>,
    pub search: Option<String>,
    /// Kept as text so a malformed value falls back to the first page.
    pub page: Option<String>,
}

impl TipsQuery {
    fn page(&self) -> i64 {
        parse_page(self.page.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|p| p.trim().parse::<i64>().ok())
        .unwrap_or(1)
        .max(1)
}

fn render(state: &AppState, name: &str, ctx: minijinja::Value) -> Result<Html<String>, ServerError> {
    Ok(Html(state.templates.render(name, ctx)?))
}

async fn link_lists(state: &AppState) -> Result<(Vec<Link>, Vec<Link>), ServerError> {
    let categories = state.content.categories().await?;
    let tags = state.content.tags().await?;
    Ok((
        categories.iter().map(|c| Link::category(c)).collect(),
        tags.iter().map(|t| Link::tag(t)).collect(),
    ))
}

/// The article highlighted on the home page: the first tagged `featured`,
/// else the first GitHub Copilot article.
pub fn featured(articles: &[Article]) -> Option<&Article> {
    articles.iter().find(|a| a.has_tag("featured")).or_else(|| {
        articles.iter().find(|a| {
            a.category.eq_ignore_ascii_case("GitHub Copilot") || a.has_tag("github-copilot")
        })
    })
}

pub async fn home(State(state): State<AppState>) -> Result<Html<String>, ServerError> {
    let articles = state.content.list().await?;
    let (categories, tags) = link_lists(&state).await?;

    let featured = featured(&articles).map(ArticleCard::from);
    let random = articles
        .choose(&mut rand::thread_rng())
        .map(ArticleCard::from);
    let recent = cards(&articles[..articles.len().min(RECENT_COUNT)]);

    render(
        &state,
        "home.html",
        context! { featured, recent, random, categories, tags },
    )
}

/// Filterable, paged list of every tip. Never cached.
pub async fn tips(
    State(state): State<AppState>,
    Query(query): Query<TipsQuery>,
) -> Result<Response, ServerError> {
    let request = SearchRequest {
        category: query.category.clone(),
        tag: query.tag.clone(),
        difficulty: query.difficulty.clone(),
        search: query.search.clone(),
        page: query.page(),
        page_size: PAGE_SIZE,
    };
    let result = state.content.search(&request).await?;
    let (categories, tags) = link_lists(&state).await?;
    let pagination = Pagination::new(
        &result,
        "/tips",
        &[
            ("category", query.category.as_deref()),
            ("tag", query.tag.as_deref()),
            ("difficulty", query.difficulty.as_deref()),
            ("search", query.search.as_deref()),
        ],
    );

    let html = render(
        &state,
        "tips.html",
        context! {
            title => "Tips & Tricks",
            articles => cards(&result.articles),
            pagination,
            categories,
            tags,
            filters => query,
        },
    )?;
    Ok((
        [(header::CACHE_CONTROL, "no-cache, must-revalidate")],
        html,
    )
        .into_response())
}

pub async fn tag_index() -> Redirect {
    Redirect::permanent("/tips")
}

pub async fn details(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ServerError> {
    let Some(article) = state.content.get_by_slug(&slug).await? else {
        debug!(slug = %slug, "unknown article");
        return not_found_page(&state);
    };
    let related = state.content.related(&article, RELATED_COUNT).await?;

    Ok(render(
        &state,
        "details.html",
        context! {
            article => ArticleDetail::from(&article),
            related => cards(&related),
        },
    )?
    .into_response())
}

/// Listing for one category. Unknown categories go back to the index and
/// mixed-case URLs are normalized to lowercase.
pub async fn category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(paging): Query<PageQuery>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, ServerError> {
    let requested = category.trim();
    if requested.is_empty() {
        return Ok(Redirect::to("/tips").into_response());
    }
    if requested != requested.to_lowercase() {
        return Ok(lowercase_redirect(category_url(requested), raw_query.as_deref()));
    }

    let known = state.content.categories().await?;
    let Some(name) = known.into_iter().find(|c| c.to_lowercase() == requested) else {
        debug!(category = %requested, "unknown category");
        return Ok(Redirect::to("/tips").into_response());
    };

    let request = SearchRequest {
        category: Some(name.clone()),
        page: parse_page(paging.page.as_deref()),
        page_size: PAGE_SIZE,
        ..SearchRequest::default()
    };
    listing(&state, &request, format!("{name} Tips & Tricks"), &category_url(&name)).await
}

/// Listing for one tag. Mixed-case URLs are normalized to lowercase.
pub async fn tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    Query(paging): Query<PageQuery>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, ServerError> {
    let requested = tag.trim();
    if requested.is_empty() {
        return Ok(Redirect::to("/tips").into_response());
    }
    if requested != requested.to_lowercase() {
        return Ok(lowercase_redirect(tag_url(requested), raw_query.as_deref()));
    }

    let request = SearchRequest {
        tag: Some(requested.to_owned()),
        page: parse_page(paging.page.as_deref()),
        page_size: PAGE_SIZE,
        ..SearchRequest::default()
    };
    listing(&state, &request, format!("#{requested} Tips & Tricks"), &tag_url(requested)).await
}

fn lowercase_redirect(url: String, query: Option<&str>) -> Response {
    let location = match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("{url}?{q}"),
        None => url,
    };
    Redirect::permanent(&location).into_response()
}

async fn listing(
    state: &AppState,
    request: &SearchRequest,
    title: String,
    base: &str,
) -> Result<Response, ServerError> {
    let result = state.content.search(request).await?;
    let (categories, tags) = link_lists(state).await?;
    let pagination = Pagination::new(&result, base, &[]);
    Ok(render(
        state,
        "tips.html",
        context! {
            title,
            articles => cards(&result.articles),
            pagination,
            categories,
            tags,
        },
    )?
    .into_response())
}

pub async fn about(State(state): State<AppState>) -> Result<Html<String>, ServerError> {
    render(&state, "about.html", context! {})
}

pub async fn privacy(State(state): State<AppState>) -> Result<Html<String>, ServerError> {
    render(&state, "privacy.html", context! {})
}

pub async fn contribute(State(state): State<AppState>) -> Result<Html<String>, ServerError> {
    render(&state, "contribute.html", context! {})
}

fn not_found_page(state: &AppState) -> Result<Response, ServerError> {
    let html = render(state, "not_found.html", context! {})?;
    Ok((StatusCode::NOT_FOUND, html).into_response())
}

/// Fallback for paths no route or static file matched.
pub async fn not_found(State(state): State<AppState>) -> Result<Response, ServerError> {
    not_found_page(&state)
}
