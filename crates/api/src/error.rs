use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use repos::error::RepoError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid submission: {0}")]
    Validation(String),

    #[error("invalid report id: {0}")]
    InvalidReportId(String),

    #[error("report not found")]
    ReportNotFound(),

    #[error("database error: `{0}`")]
    RepoError(#[from] RepoError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::Validation(err) => {
                (StatusCode::BAD_REQUEST, format!("invalid submission: {}", err))
            }
            ApiError::InvalidReportId(id) => {
                (StatusCode::BAD_REQUEST, format!("invalid report id: {}", id))
            }
            ApiError::ReportNotFound() => {
                (StatusCode::NOT_FOUND, "report not found".to_string())
            }
            ApiError::RepoError(RepoError::NotFound()) => {
                (StatusCode::NOT_FOUND, "report not found".to_string())
            }
            // Backend failures stay generic towards clients.
            ApiError::RepoError(err) => {
                error!("storage failure: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal failure".to_string())
            }
        };

        let body = Json(serde_json::json!({
            "result": "failed",
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
