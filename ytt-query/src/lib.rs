//! ytt-query library - read contracts and HTTP adapter over the trending store
//!
//! The pipeline is the only writer; everything here opens the store
//! read-only and answers ranking, drill-down and search lookups.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod limits;
pub mod queries;

pub use error::{QueryError, QueryResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Store connection pool (read-only)
    pub db: SqlitePool,
    /// Region the store's regional tables were built for
    pub region: String,
}

impl AppState {
    pub fn new(db: SqlitePool, region: impl Into<String>) -> Self {
        Self {
            db,
            region: region.into(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let api = Router::new()
        .route("/api/countries", get(api::countries))
        .route("/api/dates", get(api::dates))
        .route("/api/trending", get(api::trending))
        .route("/api/top", get(api::top))
        .route("/api/top_advanced", get(api::top_advanced))
        .route("/api/video/:video_id", get(api::video_detail))
        .route("/api/channels/daily", get(api::channels_daily))
        .route("/api/channels/alltime", get(api::channels_alltime))
        .route("/api/channel/:channel_id", get(api::channel_detail))
        .route("/api/tags/months", get(api::tag_months))
        .route("/api/tags/top", get(api::top_tags))
        .route("/api/tags/movers", get(api::movers))
        .route("/api/tags/series/:tag", get(api::series))
        .route("/api/tags/videos", get(api::tag_videos))
        .route("/api/search/videos", get(api::search_videos))
        .route("/api/search/channels", get(api::search_channels));

    Router::new()
        .merge(api)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
