pub mod feeds;
pub mod health;
pub mod images;
pub mod output_cache;
pub mod pages;
pub mod redirect;
pub mod refresh;
pub mod tips;

use std::sync::Arc;

use axum::Router;
use axum::handler::Handler;
use axum::middleware;
use axum::routing::{get, post};
use jawn_blob::BlobStore;
use jawn_content::{ContentService, OutputCache};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::JawnConfig;
use crate::templates::Templates;

use self::output_cache::{CachePolicy, OutputCacheLayerState};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Article reads and cache refresh.
    pub content: Arc<dyn ContentService>,
    /// Rendered responses, evicted by tag on refresh.
    pub output_cache: Arc<OutputCache>,
    /// Article images and their resized variants.
    pub images: Arc<dyn BlobStore>,
    pub templates: Arc<Templates>,
    pub config: Arc<JawnConfig>,
}

/// Build the router with every page, API route and middleware.
pub fn router(state: AppState) -> Router {
    let cached = |policy: CachePolicy| {
        middleware::from_fn_with_state(
            OutputCacheLayerState {
                cache: Arc::clone(&state.output_cache),
                policy,
            },
            output_cache::cache_responses,
        )
    };

    let site = Router::new()
        .route("/", get(pages::home).layer(cached(output_cache::HOME)))
        .route("/tips", get(pages::tips))
        .route("/tips/tag", get(pages::tag_index))
        .route(
            "/tips/{slug}",
            get(pages::details).layer(cached(output_cache::DETAILS)),
        )
        .route(
            "/tips/category/{category}",
            get(pages::category).layer(cached(output_cache::CATEGORY)),
        )
        .route(
            "/tips/tag/{tag}",
            get(pages::tag).layer(cached(output_cache::TAG)),
        )
        .route(
            "/about",
            get(pages::about).layer(cached(output_cache::STATIC_PAGE)),
        )
        .route(
            "/privacy",
            get(pages::privacy).layer(cached(output_cache::STATIC_PAGE)),
        )
        .route(
            "/contribute",
            get(pages::contribute).layer(cached(output_cache::STATIC_PAGE)),
        )
        .route(
            "/sitemap.xml",
            get(feeds::sitemap).layer(cached(output_cache::SITEMAP)),
        )
        .route("/feed.rss", get(feeds::rss).layer(cached(output_cache::RSS)))
        .route(
            "/article-images/{*path}",
            get(images::article_image).layer(cached(output_cache::ARTICLE_IMAGES)),
        )
        .route("/health", get(health::health));

    let api = Router::new()
        .route("/api/tips/search", get(tips::search))
        .route("/api/tips/categories", get(tips::categories))
        .route("/api/tips/tags", get(tips::tags))
        .route("/api/tips/refresh", post(refresh::tips_refresh))
        .route("/api/cache/refresh", post(refresh::cache_refresh))
        .layer(CorsLayer::permissive());

    // Static assets first, then the 404 page for anything left over.
    let assets = ServeDir::new(&state.config.server.static_dir)
        .not_found_service(pages::not_found.with_state(state.clone()));

    Router::new()
        .merge(site)
        .merge(api)
        .fallback_service(assets)
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(redirect::redirect_www))
        .layer(TraceLayer::new_for_http())
}
