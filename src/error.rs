//! Error types for the PDF toolkit server

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::pdf::PdfError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Challenge sent with every 401
pub const AUTH_CHALLENGE: &str = "Basic realm=\"pdf-toolkit\"";

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Job timed out after {0} seconds")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg.clone())
            }
            AppError::Timeout(secs) => {
                tracing::warn!("Job exceeded {}s timeout", secs);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "timeout",
                    format!("Processing took longer than {} seconds", secs),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Pdf(e) => match e {
                PdfError::NotPdf => (
                    StatusCode::BAD_REQUEST,
                    "bad_request",
                    "File must be a PDF".to_string(),
                ),
                PdfError::InvalidRange(_) | PdfError::InvalidPattern(_) => {
                    (StatusCode::BAD_REQUEST, "bad_request", e.to_string())
                }
                PdfError::PageNotFound(..) => (StatusCode::BAD_REQUEST, "bad_request", e.to_string()),
                PdfError::LoadError(_) => {
                    tracing::warn!("Rejected document: {}", e);
                    (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable", e.to_string())
                }
                _ => {
                    tracing::error!("PDF processing error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "pdf_error",
                        "Failed to process PDF".to_string(),
                    )
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = self.parts();

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(AUTH_CHALLENGE));
        }
        response
    }
}
