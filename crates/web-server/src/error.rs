use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use core_types::CoreError;
use database::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// The request body was missing, not JSON, or had wrongly typed fields.
    #[error("bad request: {0}")]
    Decode(String),
    #[error(transparent)]
    InvalidId(#[from] CoreError),
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Store(DbError),
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => AppError::NotFound,
            other => AppError::Store(other),
        }
    }
}

/// Converts our custom `AppError` into a plain-text HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Decode(detail) => {
                tracing::debug!(error = %detail, "Rejected request body.");
                (StatusCode::BAD_REQUEST, "bad request".to_string())
            }
            AppError::InvalidId(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            AppError::Store(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                (StatusCode::INTERNAL_SERVER_ERROR, db_err.to_string())
            }
        };

        (status, message).into_response()
    }
}
