//! Coverage endpoints: countries, regional dates and tag months

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::Serialize;

use crate::error::QueryResult;
use crate::queries::{self, dates::CountryCoverage};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DatesResponse {
    pub region: String,
    pub dates: Vec<NaiveDate>,
}

/// GET /api/countries
pub async fn countries(State(state): State<AppState>) -> QueryResult<Json<Vec<CountryCoverage>>> {
    Ok(Json(queries::list_countries(&state.db).await?))
}

/// GET /api/dates
pub async fn dates(State(state): State<AppState>) -> QueryResult<Json<DatesResponse>> {
    let dates = queries::list_dates(&state.db, &state.region).await?;
    Ok(Json(DatesResponse {
        region: state.region.clone(),
        dates,
    }))
}

/// GET /api/tags/months
pub async fn tag_months(State(state): State<AppState>) -> QueryResult<Json<Vec<NaiveDate>>> {
    Ok(Json(queries::list_tag_months(&state.db).await?))
}
