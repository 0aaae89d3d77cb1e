// Error handling for the diarization API
//
// This module defines error types and handling for the request path.
// It centralizes error definitions and provides helpful conversion traits.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use actix_web::{HttpResponse, ResponseError};

use crate::converter::ConvertError;
use crate::models::ErrorResponse;
use crate::pipeline::PipelineError;

/// Errors that can occur in the diarization API handlers.
///
/// Client-side failures (malformed multipart, missing file, oversized upload)
/// map to 4xx responses; conversion and inference failures map to 500, each
/// with a `{"detail": ...}` body.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Error when processing multipart form data
    #[error("Form error: {0}")]
    FormError(String),

    /// Error when saving file data
    #[error("File error: {0}")]
    FileError(#[from] io::Error),

    /// Error when no audio file was provided
    #[error("No audio file provided in the request")]
    NoAudioFile,

    /// Error when a file is too large
    #[error("File too large: {0} bytes exceeds limit of {1} bytes")]
    FileTooLarge(usize, usize),

    /// Error when the audio conversion subprocess failed
    #[error("{0}")]
    ConversionFailed(String),

    /// Error raised by the diarization pipeline
    #[error("Diarization failed: {0}")]
    DiarizationFailed(String),
}

impl HandlerError {
    /// Create a new FormError
    pub fn form_error<S: Into<String>>(msg: S) -> Self {
        Self::FormError(msg.into())
    }

    /// Helper to clean up a request folder when an error occurs
    pub fn with_cleanup(self, folder: Option<&PathBuf>) -> Self {
        if let Some(folder) = folder {
            crate::file_utils::cleanup_folder(folder);
        }
        self
    }
}

impl ResponseError for HandlerError {
    fn error_response(&self) -> HttpResponse {
        let body = ErrorResponse {
            detail: self.to_string(),
        };

        match self {
            HandlerError::NoAudioFile | HandlerError::FormError(_) => {
                HttpResponse::BadRequest().json(body)
            }
            HandlerError::FileTooLarge(_, _) => HttpResponse::PayloadTooLarge().json(body),
            _ => HttpResponse::InternalServerError().json(body),
        }
    }
}

/// Convert conversion failures into handler errors
impl From<ConvertError> for HandlerError {
    fn from(err: ConvertError) -> Self {
        HandlerError::ConversionFailed(err.to_string())
    }
}

/// Convert pipeline failures into handler errors
impl From<PipelineError> for HandlerError {
    fn from(err: PipelineError) -> Self {
        HandlerError::DiarizationFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn client_errors_map_to_400() {
        assert_eq!(
            HandlerError::NoAudioFile.error_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            HandlerError::form_error("bad field").error_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn oversized_uploads_map_to_413() {
        let err = HandlerError::FileTooLarge(1024, 512);
        assert_eq!(
            err.error_response().status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn processing_failures_map_to_500_with_a_detail() {
        let conversion = HandlerError::ConversionFailed("ffmpeg exploded".to_string());
        assert_eq!(
            conversion.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(!conversion.to_string().is_empty());

        let inference = HandlerError::DiarizationFailed("model choked".to_string());
        assert_eq!(
            inference.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(inference.to_string().contains("model choked"));
    }

    #[test]
    fn converter_errors_keep_their_diagnostics() {
        let err = ConvertError::Tool {
            status: "exit status: 1".to_string(),
            stderr: "unknown codec".to_string(),
        };
        let handler_err = HandlerError::from(err);
        assert!(handler_err.to_string().contains("unknown codec"));
    }
}
