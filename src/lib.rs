use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod models;
pub mod service;
pub mod store;

use geo::GeoCache;
use store::UrlStore;

// ── Shared application state ───────────────────────────────────────────────

pub struct AppState {
    pub config: config::AppConfig,
    pub store: UrlStore,
    /// In-memory cache for IP → country lookups so the same IP is never
    /// looked up more than once per server lifetime.
    pub geo_cache: GeoCache,
}

impl AppState {
    pub fn new(config: config::AppConfig) -> Self {
        Self {
            config,
            store: UrlStore::new(),
            geo_cache: GeoCache::new(),
        }
    }
}

// ── Router ─────────────────────────────────────────────────────────────────

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/shorten", post(handlers::api::shorten))
        .route("/stats", get(handlers::api::stats));

    Router::new()
        // Shortener form + statistics pages
        .route(
            "/",
            get(handlers::pages::home).post(handlers::pages::create),
        )
        .route("/stats", get(handlers::pages::stats))
        // Health check — returns 200 OK with no body
        .route("/health", get(|| async { StatusCode::OK }))
        // JSON API (all under /api/*)
        .nest("/api", api_router)
        // Short-link redirect — must come LAST so the fixed routes take priority
        .route("/:code", get(handlers::redirect::redirect))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
