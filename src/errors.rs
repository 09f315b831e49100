use crate::services::{content_service::ContentError, resize_service::ResizeError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::NotFound { .. } | ContentError::InvalidPath(_) => {
                AppError::not_found(err.to_string())
            }
            ContentError::Io(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<ResizeError> for AppError {
    fn from(err: ResizeError) -> Self {
        match err {
            ResizeError::SourceNotFound(_) => AppError::not_found(err.to_string()),
            ResizeError::InvalidDimension(_) => AppError::bad_request(err.to_string()),
            ResizeError::Decode { .. } => {
                AppError::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            ResizeError::Encode(_) | ResizeError::Io(_) | ResizeError::Task(_) => {
                AppError::internal(err.to_string())
            }
        }
    }
}
