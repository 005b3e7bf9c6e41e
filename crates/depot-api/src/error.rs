//! HTTP error response conversion
//!
//! This module provides HTTP-specific error response conversion for AppError.
//!
//! **Preferred handler pattern:** Return `Result<impl IntoResponse, HttpAppError>`. Use
//! `AppError` (or types that convert into `HttpAppError`) for errors and `?` so they
//! render consistently (status, body, logging).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use depot_core::{AppError, ErrorMetadata, GenerateError, LogLevel};
use serde::Serialize;
use utoipa::ToSchema;

use crate::upload::{DecodeError, StreamFault, UploadError};

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from depot-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        let is_production = is_production_env();

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Always hide details in production; elsewhere only for non-sensitive errors.
        let (details, error_type) = if is_production || app_error.is_sensitive() {
            (None, None)
        } else {
            (
                Some(app_error.detailed_message()),
                Some(app_error.error_type().to_string()),
            )
        };

        let body = Json(ErrorResponse {
            error: app_error.client_message(),
            details,
            error_type,
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        });

        (status, body).into_response()
    }
}

// Convert pipeline errors to HttpAppError (avoids orphan rule: we impl for local HttpAppError)

impl From<DecodeError> for HttpAppError {
    fn from(err: DecodeError) -> Self {
        let app = match err {
            DecodeError::ContentType(msg) => AppError::BadRequest(msg),
            DecodeError::Body(msg) => AppError::BadRequest(msg),
        };
        HttpAppError(app)
    }
}

impl From<UploadError> for HttpAppError {
    fn from(err: UploadError) -> Self {
        let app = match err {
            UploadError::MissingArtifact
            | UploadError::SizeRequiredBeforeFile
            | UploadError::FileSectionNotLast
            | UploadError::TrailingDataAfterFile => AppError::InvalidInput(err.to_string()),
            UploadError::ArtifactTooLarge => AppError::ArtifactFileTooLarge,
            UploadError::OutOfOrder(_) => AppError::Internal(err.to_string()),
        };
        HttpAppError(app)
    }
}

impl From<StreamFault> for HttpAppError {
    fn from(fault: StreamFault) -> Self {
        match fault {
            StreamFault::TooLarge { .. } => UploadError::ArtifactTooLarge.into(),
            StreamFault::TrailingSection => UploadError::TrailingDataAfterFile.into(),
            StreamFault::Transport(msg) => DecodeError::Body(msg).into(),
        }
    }
}

impl From<GenerateError> for HttpAppError {
    fn from(err: GenerateError) -> Self {
        let app = match err {
            GenerateError::ArtifactNotUnique => AppError::ArtifactNotUnique,
            GenerateError::ArtifactFileTooLarge => AppError::ArtifactFileTooLarge,
            GenerateError::ArtifactParsingFailed(detail) => AppError::ArtifactParsingFailed(detail),
            GenerateError::Other(source) => AppError::InternalWithSource {
                message: source.to_string(),
                source,
            },
            // Kinds added to the engine contract fail closed until mapped here.
            other => AppError::Internal(other.to_string()),
        };
        HttpAppError(app)
    }
}
