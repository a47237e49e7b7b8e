use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

/// Message returned to clients for every failure past input validation.
pub const GENERIC_FAILURE: &str = "Internal server error";

#[derive(Debug)]
pub enum AppError {
    InvalidRequest(String),
    UnsupportedFile(String),
    ParseError(String),
    DatabaseError(String),
    ExportError(String),
}

impl AppError {
    /// Client-side rejections are reported as-is; everything else is collapsed
    /// into one generic failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::InvalidRequest(_) | AppError::UnsupportedFile(_))
    }

    pub fn public_message(&self) -> String {
        match self {
            AppError::InvalidRequest(msg) => msg.clone(),
            AppError::UnsupportedFile(name) => format!("Unsupported file type: {}", name),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            AppError::UnsupportedFile(name) => write!(f, "Unsupported file type: {}", name),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::ExportError(msg) => write!(f, "Export error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        AppError::DatabaseError(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        AppError::ExportError(e.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(e: csv::Error) -> Self {
        AppError::ParseError(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(serde_json::json!({
            "status": status.as_u16(),
            "success": false,
            "msg": self.public_message(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = AppError::InvalidRequest("No files uploaded".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "No files uploaded");

        let err = AppError::UnsupportedFile("notes.txt".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.public_message().contains("notes.txt"));
    }

    #[test]
    fn test_pipeline_errors_are_generic() {
        for err in [
            AppError::ParseError("bad zip".into()),
            AppError::DatabaseError("connection reset".into()),
            AppError::ExportError("io".into()),
        ] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.public_message(), GENERIC_FAILURE);
        }
    }
}
