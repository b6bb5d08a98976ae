//! Video ranking and detail endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{country_or_region, date_or_latest, parse_or};
use crate::error::QueryResult;
use crate::limits::{TOP, TRENDING};
use crate::queries::{self, videos::RankedVideo, videos::VideoDetail, AdvancedMetric, VideoMetric};
use crate::AppState;

/// Query parameters shared by the ranking endpoints
#[derive(Debug, Default, Deserialize)]
pub struct RankingQuery {
    /// Trending date (YYYY-MM-DD); latest regional date when omitted
    pub date: Option<String>,
    /// Trending country; the service region when omitted
    pub country: Option<String>,
    pub metric: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub country: String,
    pub date: NaiveDate,
    pub metric: &'static str,
    pub limit: i64,
    pub videos: Vec<RankedVideo>,
}

/// GET /api/trending
///
/// Every video trending on the date, most viewed first.
pub async fn trending(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> QueryResult<Json<RankingResponse>> {
    let limit = TRENDING.resolve(query.limit.as_deref())?;
    let country = country_or_region(&state, query.country.as_deref());
    let date = date_or_latest(&state, country, query.date.as_deref()).await?;
    let videos = queries::top_videos(&state.db, country, date, VideoMetric::Views, limit).await?;

    Ok(Json(RankingResponse {
        country: country.to_string(),
        date,
        metric: VideoMetric::Views.as_str(),
        limit,
        videos,
    }))
}

/// GET /api/top?metric=views|likes|comments
pub async fn top(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> QueryResult<Json<RankingResponse>> {
    let limit = TOP.resolve(query.limit.as_deref())?;
    let metric = parse_or(query.metric.as_deref(), VideoMetric::Views)?;
    let country = country_or_region(&state, query.country.as_deref());
    let date = date_or_latest(&state, country, query.date.as_deref()).await?;
    let videos = queries::top_videos(&state.db, country, date, metric, limit).await?;

    Ok(Json(RankingResponse {
        country: country.to_string(),
        date,
        metric: metric.as_str(),
        limit,
        videos,
    }))
}

/// GET /api/top_advanced?metric=stickiness|reach
pub async fn top_advanced(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> QueryResult<Json<RankingResponse>> {
    let limit = TOP.resolve(query.limit.as_deref())?;
    let metric = parse_or(query.metric.as_deref(), AdvancedMetric::Stickiness)?;
    let country = country_or_region(&state, query.country.as_deref());
    let date = date_or_latest(&state, country, query.date.as_deref()).await?;
    let videos = queries::top_videos_advanced(&state.db, country, date, metric, limit).await?;

    Ok(Json(RankingResponse {
        country: country.to_string(),
        date,
        metric: metric.as_str(),
        limit,
        videos,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoQuery {
    /// Country for the daily history; the service region when omitted
    pub country: Option<String>,
}

/// GET /api/video/:video_id
pub async fn video_detail(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<VideoQuery>,
) -> QueryResult<Json<VideoDetail>> {
    let country = country_or_region(&state, query.country.as_deref());
    let detail = queries::video_detail(&state.db, video_id.trim(), country).await?;
    Ok(Json(detail))
}
