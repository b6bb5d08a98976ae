//! Query errors
//!
//! Point and "latest" lookups that find nothing return `NotFound`; ranked
//! lookups return empty lists instead. The HTTP adapter maps each variant to
//! a status code with a `{"error": message}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    /// Nothing matched a point or latest lookup (404)
    #[error("{0}")]
    NotFound(String),

    /// Malformed request parameter (400)
    #[error("{0}")]
    InvalidParameter(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// ytt-common error (store open, config)
    #[error("Store error: {0}")]
    Common(#[from] ytt_common::Error),
}

pub type QueryResult<T> = Result<T, QueryError>;

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = match &self {
            QueryError::NotFound(_) => StatusCode::NOT_FOUND,
            QueryError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            QueryError::Database(_) | QueryError::Common(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "Query failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
