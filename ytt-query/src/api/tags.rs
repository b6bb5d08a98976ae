//! Tag endpoints: top tags, movers, series and tagged videos

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ytt_common::db::{MoverDirection, TagMonthlyAggregate, TagMover};

use super::{month_or_latest, parse_or, present};
use crate::error::{QueryError, QueryResult};
use crate::limits::{TAGS, TAG_VIDEOS};
use crate::queries::{self, tags::TagVideo, VideoMetric};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TagsQuery {
    /// Month (YYYY-MM); latest tag month when omitted
    pub month: Option<String>,
    pub direction: Option<String>,
    pub tag: Option<String>,
    pub metric: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TopTagsResponse {
    pub month: NaiveDate,
    pub limit: i64,
    pub tags: Vec<TagMonthlyAggregate>,
}

#[derive(Debug, Serialize)]
pub struct MoversResponse {
    pub month: NaiveDate,
    pub direction: MoverDirection,
    pub limit: i64,
    pub movers: Vec<TagMover>,
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub tag: String,
    pub months: Vec<TagMonthlyAggregate>,
}

#[derive(Debug, Serialize)]
pub struct TagVideosResponse {
    pub region: String,
    pub tag: String,
    pub month: NaiveDate,
    pub metric: &'static str,
    pub limit: i64,
    pub videos: Vec<TagVideo>,
}

/// GET /api/tags/top
pub async fn top_tags(
    State(state): State<AppState>,
    Query(query): Query<TagsQuery>,
) -> QueryResult<Json<TopTagsResponse>> {
    let limit = TAGS.resolve(query.limit.as_deref())?;
    let month = month_or_latest(&state, query.month.as_deref()).await?;
    let tags = queries::top_tags(&state.db, month, limit).await?;
    Ok(Json(TopTagsResponse { month, limit, tags }))
}

/// GET /api/tags/movers?direction=rising|falling
pub async fn movers(
    State(state): State<AppState>,
    Query(query): Query<TagsQuery>,
) -> QueryResult<Json<MoversResponse>> {
    let limit = TAGS.resolve(query.limit.as_deref())?;
    let direction = match present(query.direction.as_deref()) {
        None => MoverDirection::Rising,
        Some(raw) => MoverDirection::from_name(raw).ok_or_else(|| {
            QueryError::InvalidParameter("direction must be rising or falling".to_string())
        })?,
    };
    let month = month_or_latest(&state, query.month.as_deref()).await?;
    let movers = queries::tag_movers(&state.db, month, direction, limit).await?;

    Ok(Json(MoversResponse {
        month,
        direction,
        limit,
        movers,
    }))
}

/// GET /api/tags/series/:tag
pub async fn series(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> QueryResult<Json<SeriesResponse>> {
    let months = queries::tag_series(&state.db, &tag).await?;
    Ok(Json(SeriesResponse { tag, months }))
}

/// GET /api/tags/videos?tag=...
pub async fn tag_videos(
    State(state): State<AppState>,
    Query(query): Query<TagsQuery>,
) -> QueryResult<Json<TagVideosResponse>> {
    let tag = present(query.tag.as_deref())
        .ok_or_else(|| QueryError::InvalidParameter("tag is required".to_string()))?
        .to_string();
    let limit = TAG_VIDEOS.resolve(query.limit.as_deref())?;
    let metric = parse_or(query.metric.as_deref(), VideoMetric::Views)?;
    let month = month_or_latest(&state, query.month.as_deref()).await?;
    let videos = queries::tag_videos(&state.db, &state.region, &tag, month, metric, limit).await?;

    Ok(Json(TagVideosResponse {
        region: state.region.clone(),
        tag,
        month,
        metric: metric.as_str(),
        limit,
        videos,
    }))
}
