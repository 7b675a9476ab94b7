use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::letter::convert::ConversionReport;
use crate::letter::pipeline::LetterError;
use crate::settings::SettingsError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing template, conversion script, or unreadable settings.
    #[error("Setup error: {0}")]
    Setup(String),

    /// The intermediate document was never produced. Answered with a bare
    /// text diagnostic rather than the JSON envelope.
    #[error("Render failed: {0}")]
    RenderFailed(String),

    #[error("PDF conversion failed (exit code {:?})", .0.exit_code)]
    ConversionFailed(ConversionReport),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<LetterError> for AppError {
    fn from(e: LetterError) -> Self {
        match e {
            LetterError::Validation(msg) => AppError::Validation(msg),
            LetterError::TemplateMissing(path) => AppError::Setup(format!(
                "Template file does not exist: {}",
                path.display()
            )),
            LetterError::ConverterMissing(path) => AppError::Setup(format!(
                "Conversion script not found: {}",
                path.display()
            )),
            LetterError::RenderFailed(msg) => AppError::RenderFailed(msg),
            LetterError::ConversionFailed(report) => AppError::ConversionFailed(*report),
            LetterError::Storage(msg) => AppError::Storage(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::Setup(msg) => {
                tracing::error!("Setup error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SETUP_ERROR",
                    msg.clone(),
                    None,
                )
            }
            AppError::RenderFailed(msg) => {
                tracing::error!("Render failed: {msg}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    format!("Error: {msg}"),
                )
                    .into_response();
            }
            AppError::ConversionFailed(report) => {
                tracing::error!(
                    "PDF conversion failed: exit code {:?}, pdf exists {}",
                    report.exit_code,
                    report.pdf_exists
                );
                (
                    StatusCode::BAD_GATEWAY,
                    "CONVERSION_FAILED",
                    "PDF generation failed".to_string(),
                    serde_json::to_value(report).ok(),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    msg.clone(),
                    None,
                )
            }
            AppError::Settings(e) => {
                tracing::error!("Settings error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SETUP_ERROR",
                    e.to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
