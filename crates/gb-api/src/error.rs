//! HTTP mapping for failures. Nothing here terminates the server: a failed
//! request is logged and answered with a 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gb_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        let body = match self {
            ApiError::App(_) => "Sorry, your entry could not be recorded. Please try again later.",
            ApiError::Template(_) => "Internal server error",
        };
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
