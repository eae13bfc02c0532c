//! JSON endpoints over the article set.

use axum::Json;
use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use jawn_core::{Article, SearchRequest, SearchResult};
use serde::Serialize;
use tracing::warn;

use super::AppState;
use crate::error::ServerError;

/// Public projection of an article. Bodies stay out of the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TipDto {
    pub title: String,
    pub slug: String,
    pub category: String,
    pub tags: Vec<String>,
    pub difficulty: String,
    pub author: String,
    pub published_date: DateTime<Utc>,
    pub description: String,
    pub reading_time_minutes: usize,
}

impl From<&Article> for TipDto {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            slug: article.url_slug.clone(),
            category: article.category.clone(),
            tags: article.tags.clone(),
            difficulty: article.difficulty.clone(),
            author: article.author.clone(),
            published_date: article.published_date,
            description: article.description.clone(),
            reading_time_minutes: article.reading_time_minutes(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub tips: Vec<TipDto>,
    pub total_count: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

impl From<&SearchResult> for SearchResponse {
    fn from(result: &SearchResult) -> Self {
        Self {
            tips: result.articles.iter().map(TipDto::from).collect(),
            total_count: result.total_count,
            page: result.page,
            page_size: result.page_size,
            total_pages: result.total_pages,
        }
    }
}

fn bad_request(operation: &str, err: impl std::fmt::Display) -> ServerError {
    warn!(operation, error = %err, "tips API request failed");
    ServerError::BadRequest(format!("failed to {operation}: {err}"))
}

/// `GET /api/tips/search?category=&tag=&difficulty=&search=&page=&pageSize=`
pub async fn search(
    State(state): State<AppState>,
    Query(request): Query<SearchRequest>,
) -> Result<Json<SearchResponse>, ServerError> {
    let result = state
        .content
        .search(&request)
        .await
        .map_err(|e| bad_request("search tips", e))?;
    Ok(Json(SearchResponse::from(&result)))
}

pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>, ServerError> {
    let categories = state
        .content
        .categories()
        .await
        .map_err(|e| bad_request("list categories", e))?;
    Ok(Json(categories))
}

pub async fn tags(State(state): State<AppState>) -> Result<Json<Vec<String>>, ServerError> {
    let tags = state
        .content
        .tags()
        .await
        .map_err(|e| bad_request("list tags", e))?;
    Ok(Json(tags))
}
