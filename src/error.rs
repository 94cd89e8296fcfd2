use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Rejections raised before anything is written by a create operation.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} may not be blank")]
    Blank { field: &'static str },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange { field: &'static str, min: f64, max: f64, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: i64 },

    #[error("tmdb_id must be a positive integer, got {0}")]
    InvalidTmdbId(i32),

    #[error("IMDB ID must start with 'tt' followed by digits, got {0:?}")]
    InvalidImdbId(String),

    #[error("Death year cannot be earlier than birth year ({death} < {birth})")]
    DeathBeforeBirth { birth: i32, death: i32 },

    #[error("movie with tmdb_id {0} already exists")]
    DuplicateTmdbId(i32),

    #[error("director with director_id {0:?} already exists")]
    DuplicateDirectorId(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("cannot open source {}: {source}", path.display())]
    Source { path: PathBuf, source: csv::Error },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Source { .. } | AppError::Csv(_) | AppError::Db(_) | AppError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
