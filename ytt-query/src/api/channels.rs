//! Channel ranking and detail endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::date_or_latest;
use crate::error::QueryResult;
use crate::limits::{CHANNELS, CHANNEL_VIDEOS};
use crate::queries::{
    self,
    channels::{ChannelAllTimeRank, ChannelDayRank, ChannelDetail},
};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ChannelsQuery {
    pub date: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DailyChannelsResponse {
    pub region: String,
    pub date: NaiveDate,
    pub limit: i64,
    pub channels: Vec<ChannelDayRank>,
}

#[derive(Debug, Serialize)]
pub struct AllTimeChannelsResponse {
    pub region: String,
    pub limit: i64,
    pub channels: Vec<ChannelAllTimeRank>,
}

/// GET /api/channels/daily
pub async fn channels_daily(
    State(state): State<AppState>,
    Query(query): Query<ChannelsQuery>,
) -> QueryResult<Json<DailyChannelsResponse>> {
    let limit = CHANNELS.resolve(query.limit.as_deref())?;
    let date = date_or_latest(&state, &state.region, query.date.as_deref()).await?;
    let channels = queries::top_channels_daily(&state.db, date, limit).await?;

    Ok(Json(DailyChannelsResponse {
        region: state.region.clone(),
        date,
        limit,
        channels,
    }))
}

/// GET /api/channels/alltime
pub async fn channels_alltime(
    State(state): State<AppState>,
    Query(query): Query<ChannelsQuery>,
) -> QueryResult<Json<AllTimeChannelsResponse>> {
    let limit = CHANNELS.resolve(query.limit.as_deref())?;
    let channels = queries::top_channels_alltime(&state.db, limit).await?;

    Ok(Json(AllTimeChannelsResponse {
        region: state.region.clone(),
        limit,
        channels,
    }))
}

/// GET /api/channel/:channel_id
pub async fn channel_detail(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(query): Query<ChannelsQuery>,
) -> QueryResult<Json<ChannelDetail>> {
    let limit = CHANNEL_VIDEOS.resolve(query.limit.as_deref())?;
    let detail = queries::channel_detail(&state.db, channel_id.trim(), limit).await?;
    Ok(Json(detail))
}
