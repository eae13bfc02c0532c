//! Cache refresh commands, guarded by a shared API key.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use super::AppState;
use crate::error::ServerError;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Serialize)]
pub struct CacheRefreshResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TipsRefreshResponse {
    pub success: bool,
    pub message: String,
}

/// Check the `X-API-Key` header against the configured key.
///
/// Without a configured key, development lets every request through and
/// production refuses all of them.
pub fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ServerError> {
    let Some(expected) = state.config.refresh.key() else {
        if state.config.server.environment.is_development() {
            return Ok(());
        }
        warn!("refresh requested but no API key is configured");
        return Err(ServerError::Config("API key not configured".into()));
    };

    let provided = headers
        .get(API_KEY_HEADER)
        .map(|v| v.as_bytes())
        .unwrap_or_default();
    if bool::from(provided.ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        warn!("refresh rejected: invalid API key");
        Err(ServerError::Unauthorized("invalid API key".into()))
    }
}

async fn refresh_content(state: &AppState) -> Result<(), ServerError> {
    state.content.refresh().await?;
    info!("content cache refreshed");
    Ok(())
}

/// `POST /api/cache/refresh`
pub async fn cache_refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CacheRefreshResponse>, ServerError> {
    authorize(&state, &headers)?;
    refresh_content(&state).await?;
    Ok(Json(CacheRefreshResponse {
        message: "Cache refreshed successfully".into(),
        timestamp: Utc::now(),
    }))
}

/// `POST /api/tips/refresh`
pub async fn tips_refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TipsRefreshResponse>, ServerError> {
    authorize(&state, &headers)?;
    refresh_content(&state).await?;
    Ok(Json(TipsRefreshResponse {
        success: true,
        message: "Tips cache refreshed successfully".into(),
    }))
}
