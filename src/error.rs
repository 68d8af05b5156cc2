use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::outfits::assembler::AssemblyError;

/// Error type returned by every handler.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("no items match the requested filters")]
    NoMatchingItems { total_items_available: usize },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<AssemblyError> for AppError {
    fn from(e: AssemblyError) -> Self {
        match e {
            AssemblyError::NoMatchingItems {
                total_items_available,
            } => AppError::NoMatchingItems {
                total_items_available,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, json!({ "error": message })),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            AppError::Conflict(_) => (StatusCode::CONFLICT, json!({ "error": message })),
            AppError::PayloadTooLarge(_) => {
                (StatusCode::PAYLOAD_TOO_LARGE, json!({ "error": message }))
            }
            AppError::NoMatchingItems {
                total_items_available,
            } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": message,
                    "total_items_available": total_items_available,
                }),
            ),
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
