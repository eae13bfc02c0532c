use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jawn_blob::BlobError;
use jawn_content::ContentError;
use thiserror::Error;

/// Errors that can occur when running the site.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error, at startup or discovered per request.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The content service failed.
    #[error("content error: {0}")]
    Content(#[from] ContentError),

    /// Image storage failed.
    #[error("blob error: {0}")]
    Blob(#[from] BlobError),

    /// A page template failed to render.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// The request was rejected before reaching the content service.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The refresh API key was missing or wrong.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Config(_)
            | Self::Io(_)
            | Self::Content(_)
            | Self::Blob(_)
            | Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match self {
            Self::Config(msg) | Self::BadRequest(msg) | Self::Unauthorized(msg) => msg,
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_is_401_with_message() {
        let response = ServerError::Unauthorized("invalid API key".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "invalid API key");
    }

    #[tokio::test]
    async fn content_failure_is_500() {
        let err = ContentError::Serialization("boom".into());
        let response = ServerError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn bad_request_is_400() {
        let response = ServerError::BadRequest("search failed".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
