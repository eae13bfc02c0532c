use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use jawn_images::{content_type_for, sniff_content_type};
use tracing::debug;

use super::AppState;
use crate::error::ServerError;

/// Blob name for a proxied image path: `..` segments dropped, surrounding
/// slashes trimmed.
pub fn sanitize_image_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// `GET /article-images/{*path}`: stream an image from blob storage.
pub async fn article_image(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ServerError> {
    let name = sanitize_image_path(&path);
    if name.is_empty() {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }

    let Some(blob) = state.images.get(&state.config.images.container, &name).await? else {
        debug!(path = %name, "article image not found");
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let content_type = blob
        .content_type
        .filter(|t| !t.is_empty())
        .or_else(|| sniff_content_type(&blob.data).map(str::to_owned))
        .unwrap_or_else(|| content_type_for(&name).to_owned());

    Ok(([(header::CONTENT_TYPE, content_type)], blob.data).into_response())
}
