//! Search endpoints
//!
//! `scope=day` (default) searches one regional date, the latest unless
//! `date` is given; `scope=all` searches every date.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{date_or_latest, parse_or};
use crate::error::{QueryError, QueryResult};
use crate::limits::SEARCH;
use crate::queries::{
    self,
    search::{ChannelHit, VideoHit},
    SearchScope,
};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub scope: Option<String>,
    pub date: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse<T> {
    pub query: String,
    pub scope: SearchScope,
    /// Searched date; absent for all-time searches
    pub date: Option<NaiveDate>,
    pub limit: i64,
    pub results: Vec<T>,
}

async fn resolve_scope(
    state: &AppState,
    query: &SearchQuery,
) -> QueryResult<(SearchScope, Option<NaiveDate>, i64)> {
    if query.q.trim().is_empty() {
        return Err(QueryError::InvalidParameter("q must not be empty".to_string()));
    }
    let limit = SEARCH.resolve(query.limit.as_deref())?;
    let scope = parse_or(query.scope.as_deref(), SearchScope::Day)?;
    let date = match scope {
        SearchScope::Day => Some(date_or_latest(state, &state.region, query.date.as_deref()).await?),
        SearchScope::All => None,
    };
    Ok((scope, date, limit))
}

/// GET /api/search/videos?q=...
pub async fn search_videos(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> QueryResult<Json<SearchResponse<VideoHit>>> {
    let (scope, date, limit) = resolve_scope(&state, &query).await?;
    let results = queries::search_videos(&state.db, &state.region, &query.q, scope, date, limit).await?;

    Ok(Json(SearchResponse {
        query: query.q,
        scope,
        date,
        limit,
        results,
    }))
}

/// GET /api/search/channels?q=...
pub async fn search_channels(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> QueryResult<Json<SearchResponse<ChannelHit>>> {
    let (scope, date, limit) = resolve_scope(&state, &query).await?;
    let results = queries::search_channels(&state.db, &query.q, scope, date, limit).await?;

    Ok(Json(SearchResponse {
        query: query.q,
        scope,
        date,
        limit,
        results,
    }))
}
