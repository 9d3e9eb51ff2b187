use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use homelink_shared::{ErrorResponse, RequestError};
use thiserror::Error;

use crate::command::QueueError;

/// Errors surfaced to HTTP clients as `{ "error": ... }`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Request(_) | ApiError::Queue(QueueError::InvalidRequest) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Queue(QueueError::QueueFull { .. }) => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
